//! Submits pending moves for one caller and refetches the result.

use derive_more::{Display, Error, From};
use stakes_tictactoe::{Address, Game, GameId, Move};
use tracing::{info, instrument, warn};

use super::{ClientError, GameApi, PendingMove, SubmitError};
use crate::api::{CallResponse, CallResult};

/// Why a submission produced no response.
#[derive(Debug, Clone, Display, Error, From)]
pub enum SessionError {
    /// Refused before calling the service.
    #[display("{}", _0)]
    Submit(SubmitError),
    /// The service could not be reached or failed.
    #[display("{}", _0)]
    Client(ClientError),
}

/// Outcome of a submitted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// What the service returned.
    pub response: CallResponse,
    /// The record refetched after the call.
    pub game: Option<Game>,
}

/// Drives create, join and play for one caller.
#[derive(Debug, Clone)]
pub struct Session<A> {
    api: A,
    caller: Address,
}

impl<A: GameApi> Session<A> {
    /// Creates a session acting as `caller`.
    pub fn new(api: A, caller: Address) -> Self {
        Self { api, caller }
    }

    /// The acting address.
    pub fn caller(&self) -> &Address {
        &self.caller
    }

    /// The underlying API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Opens a game with the pending move, which must be an X.
    ///
    /// # Errors
    ///
    /// [`SessionError::Submit`] when the bet is zero or no cell is selected;
    /// the pending move is kept. [`SessionError::Client`] if the call fails.
    #[instrument(skip(self, pending), fields(caller = %self.caller))]
    pub async fn create(
        &self,
        bet_amount: u64,
        pending: &mut PendingMove,
    ) -> Result<Submission, SessionError> {
        if bet_amount == 0 {
            return Err(SubmitError::MissingBet.into());
        }
        let (index, mv) = pending.checked()?;
        pending.clear();

        let response = self
            .api
            .create_game(&self.caller, bet_amount, index, mv)
            .await?;
        let game = match response.result {
            CallResult::Ok(id) => self.api.get_game(id).await?,
            CallResult::Err(_) => None,
        };
        Ok(self.finish("create-game", response, game))
    }

    /// Takes seat two with the pending move.
    ///
    /// # Errors
    ///
    /// [`SessionError::Submit`] when no cell is selected; [`SessionError::Client`]
    /// if the call fails.
    #[instrument(skip(self, pending), fields(caller = %self.caller))]
    pub async fn join(
        &self,
        game_id: GameId,
        pending: &mut PendingMove,
    ) -> Result<Submission, SessionError> {
        let (index, mv) = pending.checked()?;
        pending.clear();

        let response = self.api.join_game(&self.caller, game_id, index, mv).await?;
        let game = self.api.get_game(game_id).await?;
        Ok(self.finish("join-game", response, game))
    }

    /// Plays the pending move.
    ///
    /// # Errors
    ///
    /// [`SessionError::Submit`] when no cell is selected; [`SessionError::Client`]
    /// if the call fails.
    #[instrument(skip(self, pending), fields(caller = %self.caller))]
    pub async fn play(
        &self,
        game_id: GameId,
        pending: &mut PendingMove,
    ) -> Result<Submission, SessionError> {
        let (index, mv) = pending.checked()?;
        pending.clear();

        let response = self.api.play(&self.caller, game_id, index, mv).await?;
        let game = self.api.get_game(game_id).await?;
        Ok(self.finish("play", response, game))
    }

    /// Selects `index` with the mark the caller places next in `game`.
    ///
    /// The joiner places O; otherwise the mark follows the turn flag.
    pub fn select_for(&self, game: &Game, index: usize, pending: &mut PendingMove) {
        let mark = if game.player_two().is_none() {
            Move::O
        } else {
            game.next_mark()
        };
        pending.select(index, mark);
    }

    fn finish(&self, call: &str, response: CallResponse, game: Option<Game>) -> Submission {
        match response.result.error() {
            None if response.result.is_ok() => {
                info!(call, events = response.events.len(), "Submission committed")
            }
            error => warn!(call, result = ?response.result, error = ?error, "Submission rejected"),
        }
        Submission { response, game }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::GameService;
    use stakes_tictactoe::{Contract, MemoryContract};

    fn alice() -> Address {
        Address::new("alice")
    }

    fn service() -> GameService {
        let mut contract = MemoryContract::new();
        contract.fund(&alice(), 1_000).unwrap();
        GameService::new(contract, false)
    }

    #[tokio::test]
    async fn test_missing_bet_keeps_selection() {
        let session = Session::new(service(), alice());
        let mut pending = PendingMove::new();
        pending.select(0, Move::X);
        let error = session.create(0, &mut pending).await.unwrap_err();
        assert!(matches!(error, SessionError::Submit(SubmitError::MissingBet)));
        assert_eq!(pending.selection(), Some((0, Move::X)));
    }

    #[tokio::test]
    async fn test_create_clears_selection_and_refetches() {
        let session = Session::new(service(), alice());
        let mut pending = PendingMove::new();
        pending.select(4, Move::X);
        let submission = session.create(100, &mut pending).await.unwrap();
        assert_eq!(submission.response.result, CallResult::Ok(0));
        assert_eq!(pending.selection(), None);
        let game = submission.game.expect("refetched");
        assert_eq!(game.board().get(4), Some(Move::X));
    }

    #[tokio::test]
    async fn test_rejected_call_still_clears_selection() {
        let session = Session::new(service(), alice());
        let mut pending = PendingMove::new();
        pending.select(4, Move::O);
        let submission = session.create(100, &mut pending).await.unwrap();
        assert_eq!(submission.response.result, CallResult::Err(101));
        assert_eq!(pending.selection(), None);
        assert!(submission.game.is_none());
    }
}
