//! The call interface of the game contract and an in-memory implementation.

use crate::error::{ContractError, GameError};
use crate::events::Receipt;
use crate::game::{Game, Transition};
use crate::ledger::{Account, Ledger};
use crate::types::{Address, GameId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

/// Transactional store behind the three mutating calls and the queries.
///
/// Every mutating call is atomic: on `Err` no record or balance changed.
pub trait Contract {
    /// `create-game`: opens a game and returns its id in the receipt.
    fn create_game(
        &mut self,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError>;

    /// `join-game`: seats the caller as player two.
    fn join_game(
        &mut self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError>;

    /// `play`: applies the caller's move.
    fn play(
        &mut self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError>;

    /// Looks up one record.
    fn get_game(&self, game_id: GameId) -> Result<Option<Game>, ContractError>;

    /// All records, ascending by id.
    fn list_games(&self) -> Result<Vec<Game>, ContractError>;

    /// Spendable balance of a player.
    fn balance(&self, address: &Address) -> Result<u64, ContractError>;

    /// Mints funds into a player's balance, returning the new balance.
    fn fund(&mut self, address: &Address, amount: u64) -> Result<u64, ContractError>;

    /// Mints a starting balance once per address.
    ///
    /// Returns the new balance, or `None` if the address was seeded before,
    /// whatever its balance is now.
    fn seed(&mut self, address: &Address, amount: u64) -> Result<Option<u64>, ContractError>;
}

/// Logs a finished call the same way for every implementation.
pub fn log_outcome(call: &str, result: &Result<Receipt, ContractError>) {
    match result {
        Ok(receipt) => info!(
            call,
            game_id = receipt.game_id,
            events = receipt.events.len(),
            "Call committed"
        ),
        Err(ContractError::Rejected(error)) => {
            warn!(call, code = error.code(), error = %error, "Call rejected")
        }
        Err(error) => warn!(call, error = %error, "Call failed"),
    }
}

/// Contract state held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryContract {
    games: BTreeMap<GameId, Game>,
    ledger: Ledger,
    next_id: GameId,
    seeded: BTreeSet<Address>,
}

impl MemoryContract {
    /// Creates an empty contract.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory contract");
        Self::default()
    }

    /// Returns the ledger, escrow accounts included.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Applies a transition's transfers, then stores its record.
    fn commit(&mut self, transition: Transition) -> Result<Receipt, ContractError> {
        self.ledger.apply(&transition.transfers)?;
        debug!(game_id = transition.game.id(), "Record stored");
        self.games.insert(*transition.game.id(), transition.game.clone());
        Ok(transition.into_receipt())
    }

    fn existing(&self, game_id: GameId) -> Result<&Game, GameError> {
        self.games.get(&game_id).ok_or(GameError::GameNotFound)
    }
}

impl Contract for MemoryContract {
    #[instrument(skip(self, caller), fields(caller = %caller))]
    fn create_game(
        &mut self,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError> {
        let id = self.next_id;
        let result = Game::create(id, caller, bet_amount, move_index, mv)
            .map_err(ContractError::from)
            .and_then(|transition| self.commit(transition));
        if result.is_ok() {
            self.next_id += 1;
        }
        log_outcome("create-game", &result);
        result
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    fn join_game(
        &mut self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError> {
        let result = self
            .existing(game_id)
            .and_then(|game| game.join(caller, move_index, mv))
            .map_err(ContractError::from)
            .and_then(|transition| self.commit(transition));
        log_outcome("join-game", &result);
        result
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    fn play(
        &mut self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError> {
        let result = self
            .existing(game_id)
            .and_then(|game| game.play(caller, move_index, mv))
            .map_err(ContractError::from)
            .and_then(|transition| self.commit(transition));
        log_outcome("play", &result);
        result
    }

    #[instrument(skip(self))]
    fn get_game(&self, game_id: GameId) -> Result<Option<Game>, ContractError> {
        Ok(self.games.get(&game_id).cloned())
    }

    #[instrument(skip(self))]
    fn list_games(&self) -> Result<Vec<Game>, ContractError> {
        Ok(self.games.values().cloned().collect())
    }

    #[instrument(skip(self, address), fields(address = %address))]
    fn balance(&self, address: &Address) -> Result<u64, ContractError> {
        Ok(self.ledger.balance(&Account::Player(address.clone())))
    }

    #[instrument(skip(self, address), fields(address = %address))]
    fn fund(&mut self, address: &Address, amount: u64) -> Result<u64, ContractError> {
        let balance = self
            .ledger
            .credit(Account::Player(address.clone()), amount)?;
        info!(balance, "Account funded");
        Ok(balance)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    fn seed(&mut self, address: &Address, amount: u64) -> Result<Option<u64>, ContractError> {
        if self.seeded.contains(address) {
            debug!("Already seeded");
            return Ok(None);
        }
        let balance = self.fund(address, amount)?;
        self.seeded.insert(address.clone());
        Ok(Some(balance))
    }
}
