//! What a viewer sees of one game, and the move they are about to submit.

use derive_getters::Getters;
use derive_more::{Display, Error};
use stakes_tictactoe::{Address, Board, CELLS, Game, Move};
use tracing::{debug, instrument};

/// Status line shown while the other player is to move.
pub const WAITING_FOR_OPPONENT: &str = "Waiting for opponent to play...";

/// Viewer-relative flags for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct PlayView {
    /// Viewer created the game.
    is_player_one: bool,
    /// Viewer joined the game.
    is_player_two: bool,
    /// Seat two is open to the viewer.
    is_joinable: bool,
    /// Seat two is taken.
    is_joined: bool,
    /// Mark placed by the next move.
    next_move: Move,
    /// Viewer moves next.
    is_my_turn: bool,
    /// Winner set or board full.
    is_game_over: bool,
}

/// The button a viewer is offered for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Prompt {
    /// Take seat two.
    #[strum(serialize = "Join Game")]
    Join,
    /// Submit the next move.
    #[strum(serialize = "Play")]
    Play,
}

impl PlayView {
    /// Derives the flags for `viewer`; without a viewer every seat flag is false.
    #[instrument(skip(game, viewer), fields(game_id = game.id()))]
    pub fn new(game: &Game, viewer: Option<&Address>) -> Self {
        let is_player_one = viewer == Some(game.player_one());
        let is_player_two = viewer.is_some() && viewer == game.player_two().as_ref();
        let is_joined = game.player_two().is_some();
        let is_game_over = game.is_resolved();
        let turn_one = *game.is_player_one_turn();
        let view = Self {
            is_player_one,
            is_player_two,
            is_joinable: viewer.is_some() && !is_joined && !is_player_one && !is_game_over,
            is_joined,
            next_move: game.next_mark(),
            is_my_turn: !is_game_over
                && ((turn_one && is_player_one) || (!turn_one && is_player_two)),
            is_game_over,
        };
        debug!(?view, "Play view derived");
        view
    }

    /// Status text, if any.
    pub fn status_line(&self) -> Option<&'static str> {
        if self.is_joined && !self.is_my_turn && !self.is_game_over {
            Some(WAITING_FOR_OPPONENT)
        } else {
            None
        }
    }

    /// Action offered to the viewer.
    pub fn prompt(&self) -> Option<Prompt> {
        if self.is_joinable {
            Some(Prompt::Join)
        } else if self.is_my_turn {
            Some(Prompt::Play)
        } else {
            None
        }
    }
}

/// Submission refused before any call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum SubmitError {
    /// No cell selected, or the index is off the board.
    #[display("Invalid move. Please make a valid move.")]
    InvalidMove,
    /// Create without a bet.
    #[display("Please make a bet")]
    MissingBet,
}

/// A selected but unsubmitted move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingMove {
    selection: Option<(usize, Move)>,
}

impl PendingMove {
    /// Nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a cell, replacing any earlier selection.
    pub fn select(&mut self, index: usize, mark: Move) {
        debug!(index, mark = %mark, "Cell selected");
        self.selection = Some((index, mark));
    }

    /// Drops the selection.
    pub fn clear(&mut self) {
        self.selection = None;
    }

    /// Current selection.
    pub fn selection(&self) -> Option<(usize, Move)> {
        self.selection
    }

    /// The authoritative board with the selected cell overwritten.
    pub fn tentative_board(&self, board: &Board) -> Board {
        match self.selection {
            Some((index, mark)) if index < CELLS => board.with_cell(index, mark),
            _ => *board,
        }
    }

    /// The selection as wire values, if it is on the board.
    ///
    /// # Errors
    ///
    /// [`SubmitError::InvalidMove`] when nothing is selected or the index is off the board.
    pub fn checked(&self) -> Result<(u64, u64), SubmitError> {
        match self.selection {
            Some((index, mark)) if index < CELLS => {
                let index = u64::try_from(index).map_err(|_| SubmitError::InvalidMove)?;
                Ok((index, u64::from(mark.to_wire())))
            }
            _ => Err(SubmitError::InvalidMove),
        }
    }
}
