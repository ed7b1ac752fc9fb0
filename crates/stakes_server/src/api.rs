//! JSON bodies exchanged between the service and its clients.

use serde::{Deserialize, Serialize};
use stakes_tictactoe::{Address, ContractError, Event, GameError, GameId, Receipt, StorageError};

/// Request header naming the calling address.
pub const CALLER_HEADER: &str = "x-caller";

/// Body of `POST /games`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGameRequest {
    /// Stake in base units.
    pub bet_amount: u64,
    /// Cell index of the opening move.
    pub move_index: u64,
    /// Move value; 1 for X.
    #[serde(rename = "move")]
    pub mv: u64,
}

/// Body of `POST /games/{id}/join` and `POST /games/{id}/play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Cell index.
    pub move_index: u64,
    /// Move value.
    #[serde(rename = "move")]
    pub mv: u64,
}

/// Body of `POST /accounts/{address}/fund`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundRequest {
    /// Amount in base units.
    pub amount: u64,
}

/// Body of `GET /accounts/{address}/balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Account address.
    pub address: Address,
    /// Balance in base units.
    pub balance: u64,
}

/// `{"ok": value}` or `{"err": code}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallResult<T = GameId> {
    /// The call committed.
    Ok(T),
    /// The call was rejected with this code.
    Err(u32),
}

impl<T> CallResult<T> {
    /// True when the call committed.
    pub fn is_ok(&self) -> bool {
        matches!(self, CallResult::Ok(_))
    }

    /// The rejection, if the code is known.
    pub fn error(&self) -> Option<GameError> {
        match self {
            CallResult::Ok(_) => None,
            CallResult::Err(code) => GameError::from_code(*code),
        }
    }

    /// Converts a contract outcome, keeping storage failures apart.
    ///
    /// # Errors
    ///
    /// Returns the [`StorageError`] when the store failed.
    pub fn from_outcome(outcome: Result<T, ContractError>) -> Result<Self, StorageError> {
        match outcome {
            Ok(value) => Ok(CallResult::Ok(value)),
            Err(ContractError::Rejected(error)) => Ok(CallResult::Err(error.code())),
            Err(ContractError::Storage(error)) => Err(error),
        }
    }
}

/// Response of a mutating game call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResponse {
    /// Game id or error code.
    pub result: CallResult,
    /// Events of a committed call; empty on rejection.
    pub events: Vec<Event>,
}

impl CallResponse {
    /// Converts a contract outcome, keeping storage failures apart.
    ///
    /// # Errors
    ///
    /// Returns the [`StorageError`] when the store failed.
    pub fn from_outcome(outcome: Result<Receipt, ContractError>) -> Result<Self, StorageError> {
        match outcome {
            Ok(receipt) => Ok(Self {
                result: CallResult::Ok(receipt.game_id),
                events: receipt.events,
            }),
            Err(error) => Ok(Self {
                result: CallResult::from_outcome(Err(error))?,
                events: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_result_wire_shape() {
        let ok: CallResult = CallResult::Ok(4);
        assert_eq!(serde_json::to_value(ok).unwrap(), json!({"ok": 4}));
        let err: CallResult = CallResult::Err(101);
        assert_eq!(serde_json::to_value(err).unwrap(), json!({"err": 101}));
        assert_eq!(err.error(), Some(GameError::InvalidMove));
    }

    #[test]
    fn test_move_field_name() {
        let request: MoveRequest = serde_json::from_value(json!({"move_index": 3, "move": 2})).unwrap();
        assert_eq!(request, MoveRequest { move_index: 3, mv: 2 });
    }

    #[test]
    fn test_rejection_has_no_events() {
        let response =
            CallResponse::from_outcome(Err(ContractError::Rejected(GameError::NotYourTurn))).unwrap();
        assert_eq!(response.result, CallResult::Err(104));
        assert!(response.events.is_empty());
    }
}
