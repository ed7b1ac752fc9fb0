//! Client side: API access, listing, play view and the move-submission session.

mod http;
mod listing;
mod local;
mod session;
mod view;

pub use http::HttpClient;
pub use listing::{GameListing, card_summary};
pub use session::{Session, SessionError, Submission};
pub use view::{PendingMove, PlayView, Prompt, SubmitError, WAITING_FOR_OPPONENT};

use derive_more::{Display, Error};
use stakes_tictactoe::{Address, Game, GameId};
use tracing::instrument;

use crate::api::{CallResponse, CallResult};

/// Operations a front end needs from the game service.
#[async_trait::async_trait]
pub trait GameApi: Send + Sync {
    /// `create-game` as `caller`.
    async fn create_game(
        &self,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError>;

    /// `join-game` as `caller`.
    async fn join_game(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError>;

    /// `play` as `caller`.
    async fn play(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError>;

    /// One record, `None` when absent.
    async fn get_game(&self, game_id: GameId) -> Result<Option<Game>, ClientError>;

    /// Every record, ascending by id.
    async fn list_games(&self) -> Result<Vec<Game>, ClientError>;

    /// Balance of `address` in base units.
    async fn balance(&self, address: &Address) -> Result<u64, ClientError>;

    /// Mints funds through the faucet, returning the new balance or an error code.
    async fn fund(&self, address: &Address, amount: u64) -> Result<CallResult<u64>, ClientError>;
}

/// Client failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Client error: {} at {}:{}", message, file, line)]
pub struct ClientError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ClientError {
    /// Creates a new client error with caller location tracking.
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

impl From<reqwest::Error> for ClientError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("Request failed: {}", err))
    }
}
