//! Game API served by an in-process contract.

use stakes_tictactoe::{Address, Game, GameId, StorageError};

use super::{ClientError, GameApi};
use crate::api::{CallResponse, CallResult};
use crate::service::{GameService, ServiceError};

impl From<StorageError> for ClientError {
    #[track_caller]
    fn from(err: StorageError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<ServiceError> for ClientError {
    #[track_caller]
    fn from(err: ServiceError) -> Self {
        Self::new(err.to_string())
    }
}

#[async_trait::async_trait]
impl GameApi for GameService {
    async fn create_game(
        &self,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError> {
        Ok(GameService::create_game(self, caller, bet_amount, move_index, mv).await?)
    }

    async fn join_game(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError> {
        Ok(GameService::join_game(self, caller, game_id, move_index, mv).await?)
    }

    async fn play(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError> {
        Ok(GameService::play(self, caller, game_id, move_index, mv).await?)
    }

    async fn get_game(&self, game_id: GameId) -> Result<Option<Game>, ClientError> {
        Ok(GameService::get_game(self, game_id).await?)
    }

    async fn list_games(&self) -> Result<Vec<Game>, ClientError> {
        Ok(GameService::list_games(self).await?)
    }

    async fn balance(&self, address: &Address) -> Result<u64, ClientError> {
        Ok(GameService::balance(self, address).await?)
    }

    async fn fund(&self, address: &Address, amount: u64) -> Result<CallResult<u64>, ClientError> {
        Ok(GameService::fund(self, address, amount).await?)
    }
}
