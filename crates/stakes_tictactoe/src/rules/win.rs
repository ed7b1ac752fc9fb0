//! Win detection.

use crate::types::{Board, Move};
use tracing::instrument;

/// The eight winning lines: rows, columns, diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the mark filling any complete line, or `None`.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Move> {
    let cells = board.cells();
    LINES.iter().find_map(|&[a, b, c]| {
        let mark = cells[a];
        (mark.is_mark() && mark == cells[b] && mark == cells[c]).then_some(mark)
    })
}
