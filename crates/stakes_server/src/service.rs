//! Shared, thread-safe access to one contract.

use derive_more::{Display, Error, From};
use stakes_tictactoe::{Address, Contract, ContractError, Game, GameId, MemoryContract, StorageError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::api::{CallResponse, CallResult};
use crate::config::ServerConfig;
use crate::db::SqliteContract;

/// Failure of a service operation that is not a game rejection.
#[derive(Debug, Clone, Display, Error, From)]
pub enum ServiceError {
    /// The contract's store failed.
    #[display("{}", _0)]
    #[from]
    Storage(StorageError),
    /// Funding requested while the faucet is off.
    #[display("Faucet is disabled")]
    FaucetDisabled,
}

type SharedContract = Arc<Mutex<Box<dyn Contract + Send>>>;

/// Serializes calls onto one contract; calls run on the blocking pool.
#[derive(Clone)]
pub struct GameService {
    contract: SharedContract,
    faucet: bool,
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("faucet", &self.faucet)
            .finish_non_exhaustive()
    }
}

impl GameService {
    /// Wraps a contract.
    pub fn new(contract: impl Contract + Send + 'static, faucet: bool) -> Self {
        Self {
            contract: Arc::new(Mutex::new(Box::new(contract))),
            faucet,
        }
    }

    /// Builds the contract the configuration names and credits seed balances.
    ///
    /// Each address is seeded once per store; restarts do not mint again.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database cannot be opened or seeded.
    #[instrument(skip(config), fields(database = %config.database()))]
    pub async fn from_config(config: &ServerConfig) -> Result<Self, StorageError> {
        let service = if config.is_in_memory() {
            Self::new(MemoryContract::new(), *config.faucet())
        } else {
            let contract = SqliteContract::open(config.database().clone())
                .map_err(|e| StorageError::new(e.to_string()))?;
            Self::new(contract, *config.faucet())
        };

        for seed in config.accounts() {
            let address = Address::new(seed.address().clone());
            let amount = *seed.balance();
            let seeded = service
                .with_contract(move |contract| {
                    if amount == 0 {
                        return Ok(None);
                    }
                    contract.seed(&address, amount)
                })
                .await?;
            match seeded {
                Ok(Some(balance)) => info!(address = %seed.address(), balance, "Seed balance credited"),
                Ok(None) => debug!(address = %seed.address(), "Seed skipped"),
                Err(ContractError::Storage(error)) => return Err(error),
                Err(ContractError::Rejected(error)) => {
                    return Err(StorageError::new(format!("Seed for {} rejected: {}", seed.address(), error)));
                }
            }
        }
        Ok(service)
    }

    /// Whether funding is enabled.
    pub fn faucet(&self) -> bool {
        self.faucet
    }

    /// Runs `call` with exclusive access to the contract on the blocking pool.
    async fn with_contract<T, F>(&self, call: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut dyn Contract) -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = self.contract.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || call(&mut **guard))
            .await
            .map_err(|e| StorageError::new(format!("Contract task failed: {}", e)))
    }

    /// `create-game` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store failed; rejections are in the response.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub async fn create_game(
        &self,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, StorageError> {
        let caller = caller.clone();
        let outcome = self
            .with_contract(move |contract| contract.create_game(&caller, bet_amount, move_index, mv))
            .await?;
        CallResponse::from_outcome(outcome)
    }

    /// `join-game` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store failed; rejections are in the response.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub async fn join_game(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, StorageError> {
        let caller = caller.clone();
        let outcome = self
            .with_contract(move |contract| contract.join_game(&caller, game_id, move_index, mv))
            .await?;
        CallResponse::from_outcome(outcome)
    }

    /// `play` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store failed; rejections are in the response.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub async fn play(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, StorageError> {
        let caller = caller.clone();
        let outcome = self
            .with_contract(move |contract| contract.play(&caller, game_id, move_index, mv))
            .await?;
        CallResponse::from_outcome(outcome)
    }

    /// One record, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store failed.
    #[instrument(skip(self))]
    pub async fn get_game(&self, game_id: GameId) -> Result<Option<Game>, StorageError> {
        self.with_contract(move |contract| contract.get_game(game_id))
            .await?
            .map_err(storage_only)
    }

    /// Every record, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store failed.
    #[instrument(skip(self))]
    pub async fn list_games(&self) -> Result<Vec<Game>, StorageError> {
        self.with_contract(|contract| contract.list_games())
            .await?
            .map_err(storage_only)
    }

    /// Balance of `address`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store failed.
    #[instrument(skip(self, address), fields(address = %address))]
    pub async fn balance(&self, address: &Address) -> Result<u64, StorageError> {
        let address = address.clone();
        self.with_contract(move |contract| contract.balance(&address))
            .await?
            .map_err(storage_only)
    }

    /// Mints `amount` into `address` when the faucet is on.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::FaucetDisabled`] when the faucet is off and
    /// [`ServiceError::Storage`] if the store failed.
    #[instrument(skip(self, address), fields(address = %address))]
    pub async fn fund(&self, address: &Address, amount: u64) -> Result<CallResult<u64>, ServiceError> {
        if !self.faucet {
            debug!("Fund refused, faucet disabled");
            return Err(ServiceError::FaucetDisabled);
        }
        let address = address.clone();
        let outcome = self
            .with_contract(move |contract| contract.fund(&address, amount))
            .await?;
        Ok(CallResult::from_outcome(outcome)?)
    }
}

/// Queries never reject; any error they return comes from the store.
fn storage_only(error: ContractError) -> StorageError {
    match error {
        ContractError::Storage(error) => error,
        ContractError::Rejected(error) => StorageError::new(format!("Query rejected: {}", error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new("alice")
    }

    #[tokio::test]
    async fn test_rejection_is_a_response() {
        let service = GameService::new(MemoryContract::new(), true);
        let response = service.create_game(&alice(), 0, 0, 1).await.unwrap();
        assert_eq!(response.result, CallResult::Err(100));
    }

    #[tokio::test]
    async fn test_faucet_disabled() {
        let service = GameService::new(MemoryContract::new(), false);
        let error = service.fund(&alice(), 10).await.unwrap_err();
        assert!(matches!(error, ServiceError::FaucetDisabled));
    }

    #[tokio::test]
    async fn test_seeds_credit_once() {
        let config = ServerConfig::from_toml(
            r#"
            database = ":memory:"
            [[accounts]]
            address = "alice"
            balance = 700
            "#,
        )
        .unwrap();
        let service = GameService::from_config(&config).await.unwrap();
        assert_eq!(service.balance(&alice()).await.unwrap(), 700);
    }

    #[tokio::test]
    async fn test_restart_does_not_reseed_staked_funds() {
        let db = tempfile::NamedTempFile::new().unwrap();
        let config = ServerConfig::from_toml(&format!(
            r#"
            database = {:?}
            [[accounts]]
            address = "alice"
            balance = 100
            "#,
            db.path().to_str().unwrap()
        ))
        .unwrap();

        let service = GameService::from_config(&config).await.unwrap();
        let response = service.create_game(&alice(), 100, 0, 1).await.unwrap();
        assert_eq!(response.result, CallResult::Ok(0));
        assert_eq!(service.balance(&alice()).await.unwrap(), 0);
        drop(service);

        let restarted = GameService::from_config(&config).await.unwrap();
        assert_eq!(restarted.balance(&alice()).await.unwrap(), 0);
    }
}
