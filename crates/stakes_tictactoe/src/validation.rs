//! Move validation shared by create, join and play.
//!
//! Every failing clause collapses to [`GameError::InvalidMove`]; callers
//! never learn which clause failed.

use crate::error::GameError;
use crate::rules::check_winner;
use crate::types::{Board, CELLS, Move};
use tracing::{debug, instrument};

/// A move that passed validation: a board index and the mark to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidMove {
    /// Cell index, 0-8.
    pub index: usize,
    /// X or O.
    pub mark: Move,
}

/// Outcome of the shared move predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Index on the board, move is X or O, cell empty.
    Valid(ValidMove),
    /// Some clause failed.
    Invalid,
}

impl Validation {
    /// Converts to a result carrying the invalid-move code.
    pub fn into_result(self) -> Result<ValidMove, GameError> {
        match self {
            Validation::Valid(valid) => Ok(valid),
            Validation::Invalid => Err(GameError::InvalidMove),
        }
    }
}

/// Checks raw wire values against a board.
#[instrument(skip(board))]
pub fn validate_move(board: &Board, index: u64, mv: u64) -> Validation {
    let Ok(index) = usize::try_from(index) else {
        return Validation::Invalid;
    };
    let mark = match Move::from_wire(mv) {
        Some(mark) if mark.is_mark() => mark,
        _ => return Validation::Invalid,
    };
    if index >= CELLS || !board.is_empty(index) {
        debug!(index, "Cell unavailable");
        return Validation::Invalid;
    }
    Validation::Valid(ValidMove { index, mark })
}

/// Validates a move for a player who must place `expected`.
///
/// A well-formed move with the other player's mark fails with the same code.
#[instrument(skip(board))]
pub fn validate_move_for(
    board: &Board,
    index: u64,
    mv: u64,
    expected: Move,
) -> Result<ValidMove, GameError> {
    let valid = validate_move(board, index, mv).into_result()?;
    if valid.mark != expected {
        debug!(mark = %valid.mark, expected = %expected, "Wrong mark for mover");
        return Err(GameError::InvalidMove);
    }
    Ok(valid)
}

/// Places a mark, returning the new board.
///
/// Fails with [`GameError::InvalidMove`] under the same conditions as
/// [`validate_move`].
#[instrument(skip(board))]
pub fn place(board: &Board, index: u64, mv: u64) -> Result<Board, GameError> {
    let valid = validate_move(board, index, mv).into_result()?;
    Ok(board.with_cell(valid.index, valid.mark))
}

/// Applies a validated move and reports any line it completes.
pub(crate) fn apply(board: &Board, valid: ValidMove) -> (Board, Option<Move>) {
    let next = board.with_cell(valid.index, valid.mark);
    let winner = check_winner(&next);
    (next, winner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_move() {
        let result = validate_move(&Board::new(), 4, 1);
        assert_eq!(
            result,
            Validation::Valid(ValidMove {
                index: 4,
                mark: Move::X
            })
        );
    }

    #[test]
    fn test_out_of_bounds_index() {
        assert_eq!(validate_move(&Board::new(), 9, 1), Validation::Invalid);
        assert_eq!(validate_move(&Board::new(), 10, 2), Validation::Invalid);
        assert_eq!(validate_move(&Board::new(), u64::MAX, 1), Validation::Invalid);
    }

    #[test]
    fn test_non_mark_move_values() {
        assert_eq!(validate_move(&Board::new(), 0, 0), Validation::Invalid);
        assert_eq!(validate_move(&Board::new(), 0, 3), Validation::Invalid);
    }

    #[test]
    fn test_occupied_cell() {
        let board = Board::new().with_cell(1, Move::O);
        assert_eq!(validate_move(&board, 1, 1), Validation::Invalid);
    }

    #[test]
    fn test_all_failures_share_one_code() {
        let board = Board::new().with_cell(1, Move::O);
        for (index, mv) in [(10, 1), (2, 3), (1, 1)] {
            assert_eq!(place(&board, index, mv), Err(GameError::InvalidMove));
        }
    }

    #[test]
    fn test_wrong_mark_uses_same_code() {
        let result = validate_move_for(&Board::new(), 0, 2, Move::X);
        assert_eq!(result, Err(GameError::InvalidMove));
    }

    #[test]
    fn test_place_returns_new_board() {
        let board = Board::new();
        let next = place(&board, 8, 2).unwrap();
        assert_eq!(next.get(8), Some(Move::O));
        assert_eq!(board, Board::new());
    }
}
