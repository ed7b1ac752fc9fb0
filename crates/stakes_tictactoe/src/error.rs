//! Error types for the game contract.

use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A rejected call. Each variant carries a stable numeric code.
///
/// Code 102 is unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Error, Serialize, Deserialize)]
pub enum GameError {
    /// A transfer exceeds the sender's balance.
    #[display("Insufficient balance")]
    InsufficientBalance,

    /// A credited amount is zero or would overflow a balance.
    #[display("Invalid amount")]
    InvalidAmount,

    /// Bet is zero, or the doubled pot is not representable.
    #[display("Invalid bet amount")]
    InvalidBet,

    /// Index out of range, move not X/O, occupied cell, or the wrong mark.
    #[display("Invalid move")]
    InvalidMove,

    /// The game already has a second player, or the creator tried to join.
    #[display("Game cannot be joined")]
    AlreadyJoined,

    /// The caller is not the player whose turn it is.
    #[display("Not your turn")]
    NotYourTurn,

    /// No game with the requested id.
    #[display("Game not found")]
    GameNotFound,

    /// The game is resolved.
    #[display("Game is already over")]
    GameOver,
}

impl GameError {
    /// All error kinds, ordered by code.
    pub const ALL: [GameError; 8] = [
        GameError::InsufficientBalance,
        GameError::InvalidAmount,
        GameError::InvalidBet,
        GameError::InvalidMove,
        GameError::AlreadyJoined,
        GameError::NotYourTurn,
        GameError::GameNotFound,
        GameError::GameOver,
    ];

    /// Returns the stable code surfaced to callers.
    pub fn code(self) -> u32 {
        match self {
            GameError::InsufficientBalance => 1,
            GameError::InvalidAmount => 3,
            GameError::InvalidBet => 100,
            GameError::InvalidMove => 101,
            GameError::AlreadyJoined => 103,
            GameError::NotYourTurn => 104,
            GameError::GameNotFound => 105,
            GameError::GameOver => 106,
        }
    }

    /// Looks up the error for a code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|error| error.code() == code)
    }
}

/// Failure in the storage behind a contract, with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error: {} at {}:{}", message, file, line)]
pub struct StorageError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StorageError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Error returned by a [`Contract`](crate::Contract) call.
#[derive(Debug, Clone, Display, Error, From)]
pub enum ContractError {
    /// The state machine rejected the call; nothing changed.
    #[display("Call rejected with code {}: {}", _0.code(), _0)]
    Rejected(GameError),

    /// The backing store failed.
    #[display("{}", _0)]
    Storage(StorageError),
}

impl ContractError {
    /// Returns the game error if the call was rejected by the rules.
    pub fn rejection(&self) -> Option<GameError> {
        match self {
            ContractError::Rejected(error) => Some(*error),
            ContractError::Storage(_) => None,
        }
    }
}
