//! Board, marks, and moves.
//!
//! X always moves first, so whose turn it is follows from the piece counts
//! and the board is keyed by its cells alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Winning line indices on the 3x3 board.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Errors from applying moves or parsing boards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Cell index outside 0..9.
    #[error("cell {0} is off the board")]
    OutOfRange(u8),
    /// The cell already holds a mark.
    #[error("cell {0} is already occupied")]
    Occupied(u8),
    /// No moves are allowed after a win or a full board.
    #[error("game already over")]
    GameOver,
    /// The text is not a legal X-first position.
    #[error("cannot parse board '{input}': {reason}")]
    Parse {
        /// The offending text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Moves first.
    X,
    /// Moves second.
    O,
}

impl Mark {
    /// The other player.
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    fn cell(self) -> Cell {
        match self {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// Contents of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Holds an X.
    X,
    /// Holds an O.
    O,
}

impl Cell {
    fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }
}

/// Placement of the mover's mark on a cell, numbered 0..9 row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move(u8);

impl Move {
    /// A move on cell `index`.
    pub fn new(index: u8) -> Result<Self, GameError> {
        if index < 9 {
            Ok(Move(index))
        } else {
            Err(GameError::OutOfRange(index))
        }
    }

    /// Cell index of this move.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// `(row, column)` of this move.
    pub fn coords(self) -> (usize, usize) {
        (self.index() / 3, self.index() % 3)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row, col) = self.coords();
        write!(f, "({}, {})", row, col)
    }
}

/// An immutable tic-tac-toe position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// The empty board, X to move.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Contents of cell `index`.
    pub fn cell(&self, index: usize) -> Cell {
        self.cells[index]
    }

    fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Number of marks on the board.
    pub fn occupied(&self) -> usize {
        9 - self.count(Cell::Empty)
    }

    /// Whose turn it is.
    pub fn to_move(&self) -> Mark {
        if self.count(Cell::X) > self.count(Cell::O) {
            Mark::O
        } else {
            Mark::X
        }
    }

    /// The player with three in a row, if any.
    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|line| {
            let first = self.cells[line[0]];
            if first != Cell::Empty && line.iter().all(|&i| self.cells[i] == first) {
                Some(if first == Cell::X { Mark::X } else { Mark::O })
            } else {
                None
            }
        })
    }

    /// Whether every cell is taken.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != Cell::Empty)
    }

    /// Whether the game is over.
    pub fn is_terminal(&self) -> bool {
        self.is_full() || self.winner().is_some()
    }

    /// Empty cells in index order, or nothing once the game is over.
    pub fn possible_moves(&self) -> Vec<Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..9u8)
            .filter(|&i| self.cells[i as usize] == Cell::Empty)
            .map(Move)
            .collect()
    }

    /// Apply `mv` for the player to move, checking legality.
    pub fn play(&self, mv: Move) -> Result<Board, GameError> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        if self.cells[mv.index()] != Cell::Empty {
            return Err(GameError::Occupied(mv.0));
        }
        Ok(self.place(mv))
    }

    /// Apply a move already known to be legal.
    pub(crate) fn place(&self, mv: Move) -> Board {
        let mut next = *self;
        next.cells[mv.index()] = self.to_move().cell();
        next
    }

    /// Nine-character encoding, e.g. `"X.O..X..."`.
    pub fn encode(&self) -> String {
        self.cells.iter().map(|c| c.to_char()).collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            let line: Vec<String> = (0..3)
                .map(|col| self.cells[row * 3 + col].to_char().to_string())
                .collect();
            writeln!(f, " {}", line.join(" | "))?;
            if row < 2 {
                writeln!(f, "---+---+---")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = GameError;

    /// Parse nine cells of `X`, `O`, `.` or `-`; whitespace and `|` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = |reason: String| GameError::Parse {
            input: s.to_string(),
            reason,
        };

        let mut cells = Vec::with_capacity(9);
        for c in s.chars().filter(|c| !c.is_whitespace() && *c != '|') {
            cells.push(match c {
                '.' | '-' | '_' => Cell::Empty,
                'X' | 'x' => Cell::X,
                'O' | 'o' | '0' => Cell::O,
                other => return Err(parse_error(format!("unexpected character '{}'", other))),
            });
        }

        let cells: [Cell; 9] = cells
            .try_into()
            .map_err(|v: Vec<Cell>| parse_error(format!("expected 9 cells, got {}", v.len())))?;

        let board = Board { cells };
        let (x, o) = (board.count(Cell::X), board.count(Cell::O));
        if x != o && x != o + 1 {
            return Err(parse_error(format!("X={} and O={} is not an X-first position", x, o)));
        }
        Ok(board)
    }
}
