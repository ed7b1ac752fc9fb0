//! Core domain types for wagered tic-tac-toe.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of cells on the board.
pub const CELLS: usize = 9;

/// Cell occupancy, and the symbol a player places.
///
/// Encoded on the wire as `0 = Empty`, `1 = X`, `2 = O`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Move {
    /// Unoccupied cell.
    #[default]
    Empty,
    /// Player one's mark.
    X,
    /// Player two's mark.
    O,
}

impl Move {
    /// Decodes a raw wire value, returning `None` for anything outside 0..=2.
    pub fn from_wire(value: u64) -> Option<Self> {
        match value {
            0 => Some(Move::Empty),
            1 => Some(Move::X),
            2 => Some(Move::O),
            _ => None,
        }
    }

    /// Returns the wire value of this move.
    pub fn to_wire(self) -> u8 {
        match self {
            Move::Empty => 0,
            Move::X => 1,
            Move::O => 2,
        }
    }

    /// Returns the other player's mark. `Empty` has no opponent.
    pub fn opponent(self) -> Self {
        match self {
            Move::X => Move::O,
            Move::O => Move::X,
            Move::Empty => Move::Empty,
        }
    }

    /// True for `X` and `O`.
    pub fn is_mark(self) -> bool {
        self != Move::Empty
    }

    /// Single-character symbol, blank for an empty cell.
    pub fn symbol(self) -> &'static str {
        match self {
            Move::Empty => " ",
            Move::X => "X",
            Move::O => "O",
        }
    }
}

impl From<Move> for u8 {
    fn from(value: Move) -> Self {
        value.to_wire()
    }
}

impl TryFrom<u8> for Move {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Move::from_wire(u64::from(value)).ok_or_else(|| format!("invalid move value {}", value))
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Empty => write!(f, "EMPTY"),
            other => write!(f, "{}", other.symbol()),
        }
    }
}

/// 3x3 board in row-major order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Move; CELLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [Move::Empty; CELLS],
        }
    }

    /// Builds a board from its cells.
    pub fn from_cells(cells: [Move; CELLS]) -> Self {
        Self { cells }
    }

    /// Decodes a board from wire values.
    ///
    /// Returns `None` unless there are exactly nine values, each in 0..=2.
    pub fn from_wire(values: &[u64]) -> Option<Self> {
        if values.len() != CELLS {
            return None;
        }
        let mut cells = [Move::Empty; CELLS];
        for (cell, value) in cells.iter_mut().zip(values) {
            *cell = Move::from_wire(*value)?;
        }
        Some(Self { cells })
    }

    /// Encodes the board as wire values.
    pub fn to_wire(&self) -> [u8; CELLS] {
        self.cells.map(Move::to_wire)
    }

    /// Returns the cell at `index`, or `None` past the end of the board.
    pub fn get(&self, index: usize) -> Option<Move> {
        self.cells.get(index).copied()
    }

    /// True if `index` is on the board and unoccupied.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Move::Empty))
    }

    /// Returns all cells.
    pub fn cells(&self) -> &[Move; CELLS] {
        &self.cells
    }

    /// Indices of unoccupied cells, ascending.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELLS).filter(|&index| self.is_empty(index)).collect()
    }

    /// Returns a copy with `index` overwritten, without legality checks.
    ///
    /// Used for tentative client-side boards; the contract goes through
    /// [`crate::place`].
    pub fn with_cell(&self, index: usize, mark: Move) -> Self {
        let mut next = *self;
        if let Some(cell) = next.cells.get_mut(index) {
            *cell = mark;
        }
        next
    }

    /// Formats the board as a 3x3 grid. Empty cells show their 1-based number.
    #[instrument(skip(self))]
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let index = row * 3 + col;
                match self.cells[index] {
                    Move::Empty => result.push_str(&(index + 1).to_string()),
                    mark => result.push_str(mark.symbol()),
                }
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// Caller identity (a wallet principal).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Creates an address from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the address text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for display: the first five characters, an ellipsis, and
    /// everything from the 37th character on. Addresses of 36 characters or
    /// fewer are returned whole.
    pub fn abbreviated(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 36 {
            return self.0.clone();
        }
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[36..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Sequential game identifier, starting at 0.
pub type GameId = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_wire_values() {
        assert_eq!(Move::Empty.to_wire(), 0);
        assert_eq!(Move::X.to_wire(), 1);
        assert_eq!(Move::O.to_wire(), 2);
        assert_eq!(Move::from_wire(3), None);
    }

    #[test]
    fn test_board_serializes_as_integers() {
        let board = Board::new().with_cell(0, Move::X).with_cell(4, Move::O);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, "[1,0,0,0,2,0,0,0,0]");

        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_board_rejects_bad_cell_value() {
        let result: Result<Board, _> = serde_json::from_str("[3,0,0,0,0,0,0,0,0]");
        assert!(result.is_err());
        assert_eq!(Board::from_wire(&[0, 0, 0]), None);
    }

    #[test]
    fn test_display_numbers_empty_cells() {
        let board = Board::new().with_cell(0, Move::X).with_cell(8, Move::O);
        assert_eq!(board.display(), "X|2|3\n-+-+-\n4|5|6\n-+-+-\n7|8|O");
    }

    #[test]
    fn test_abbreviated_address() {
        let address = Address::new("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM");
        assert_eq!(address.abbreviated(), "ST1PQ...PGZGM");
        assert_eq!(Address::new("alice").abbreviated(), "alice");
    }
}
