//! Contract backed by a SQLite database.
//!
//! Each call opens its own connection and runs inside one immediate
//! transaction: the record write and every balance write commit together
//! or not at all.

use derive_more::{Display, From};
use diesel::dsl::{max, now};
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use stakes_tictactoe::{
    Account, Action, Address, Contract, ContractError, Game, GameError, GameId, Ledger, Receipt,
    Transfer, Transition, log_outcome,
};
use tracing::{debug, info, instrument};

use crate::db::models::{balance_key, encode_board, from_column, to_column};
use crate::db::{BalanceRow, DbError, GameRow, NewGameRow, NewSeededAccount, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failure inside a call's transaction.
#[derive(Debug, Display, From)]
enum TxError {
    /// The rules rejected the call.
    Rejected(GameError),
    /// The database failed.
    Db(DbError),
}

impl From<diesel::result::Error> for TxError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        TxError::Db(DbError::from(err))
    }
}

impl From<TxError> for ContractError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Rejected(error) => ContractError::Rejected(error),
            TxError::Db(error) => ContractError::from(error),
        }
    }
}

/// Game contract persisted in SQLite.
#[derive(Debug, Clone)]
pub struct SqliteContract {
    db_path: String,
}

impl SqliteContract {
    /// Opens the database at `db_path` and applies pending migrations.
    ///
    /// Every call connects anew, so an in-memory path would lose state
    /// between calls; use [`stakes_tictactoe::MemoryContract`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, DbError> {
        info!(path = %db_path, "Opening SqliteContract");
        let contract = Self { db_path };
        let mut conn = contract.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Failed to run migrations: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(contract)
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Runs a transition and commits its effects in one transaction.
    fn execute<F>(&self, call: &str, transition: F) -> Result<Receipt, ContractError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<Transition, TxError>,
    {
        let result = self
            .connection()
            .map_err(ContractError::from)
            .and_then(|mut conn| {
                conn.immediate_transaction(|conn| {
                    let transition = transition(conn)?;
                    settle(conn, &transition.transfers)?;
                    store_game(conn, transition.action, &transition.game)?;
                    Ok::<_, TxError>(transition.into_receipt())
                })
                .map_err(ContractError::from)
            });
        log_outcome(call, &result);
        result
    }
}

/// Next sequential id: one past the highest stored, or zero.
fn next_game_id(conn: &mut SqliteConnection) -> Result<GameId, DbError> {
    let highest = schema::games::table
        .select(max(schema::games::id))
        .first::<Option<i64>>(conn)?;
    match highest {
        None => Ok(0),
        Some(id) => from_column(id)?
            .checked_add(1)
            .ok_or_else(|| DbError::new("Game ids exhausted")),
    }
}

fn load_game(conn: &mut SqliteConnection, game_id: GameId) -> Result<Option<Game>, DbError> {
    let Ok(id) = i64::try_from(game_id) else {
        return Ok(None);
    };
    schema::games::table
        .find(id)
        .select(GameRow::as_select())
        .first(conn)
        .optional()?
        .map(GameRow::into_game)
        .transpose()
}

fn store_game(conn: &mut SqliteConnection, action: Action, game: &Game) -> Result<(), DbError> {
    if action == Action::CreateGame {
        diesel::insert_into(schema::games::table)
            .values(&NewGameRow::try_from(game)?)
            .execute(conn)?;
        debug!(game_id = game.id(), "Record inserted");
        return Ok(());
    }

    use schema::games::dsl;
    let updated = diesel::update(dsl::games.find(to_column(*game.id())?))
        .set((
            dsl::player_two.eq(game.player_two().as_ref().map(Address::to_string)),
            dsl::is_player_one_turn.eq(*game.is_player_one_turn()),
            dsl::board.eq(encode_board(game.board())),
            dsl::winner.eq(game.winner().as_ref().map(Address::to_string)),
            dsl::updated_at.eq(now),
        ))
        .execute(conn)?;
    if updated != 1 {
        return Err(DbError::new(format!("Game {} vanished during update", game.id())));
    }
    debug!(game_id = game.id(), "Record updated");
    Ok(())
}

fn load_balance(conn: &mut SqliteConnection, account: &Account) -> Result<u64, DbError> {
    let (kind, holder) = balance_key(account);
    schema::balances::table
        .find((kind, holder))
        .select(BalanceRow::as_select())
        .first(conn)
        .optional()?
        .map_or(Ok(0), |row| row.balance())
}

/// Stores a balance; one past the column range is rejected as an invalid amount.
fn write_balance(conn: &mut SqliteConnection, account: &Account, amount: u64) -> Result<(), TxError> {
    if i64::try_from(amount).is_err() {
        debug!(account = %account, amount, "Balance exceeds column range");
        return Err(TxError::Rejected(GameError::InvalidAmount));
    }
    diesel::replace_into(schema::balances::table)
        .values(&BalanceRow::from_balance(account, amount)?)
        .execute(conn)?;
    Ok(())
}

/// Credits `amount` to a player inside the caller's transaction.
fn credit(conn: &mut SqliteConnection, address: &Address, amount: u64) -> Result<u64, TxError> {
    let account = Account::Player(address.clone());
    let current = load_balance(conn, &account)?;
    let mut ledger = Ledger::with_balances([(account.clone(), current)]);
    let balance = ledger.credit(account.clone(), amount)?;
    write_balance(conn, &account, balance)?;
    Ok(balance)
}

/// Applies transfers against the stored balances of the accounts they touch.
fn settle(conn: &mut SqliteConnection, transfers: &[Transfer]) -> Result<(), TxError> {
    let accounts = Ledger::touched(transfers);
    let mut current = Vec::with_capacity(accounts.len());
    for account in &accounts {
        current.push((account.clone(), load_balance(conn, account)?));
    }

    let mut ledger = Ledger::with_balances(current);
    ledger.apply(transfers)?;

    for account in &accounts {
        write_balance(conn, account, ledger.balance(account))?;
    }
    Ok(())
}

impl Contract for SqliteContract {
    #[instrument(skip(self, caller), fields(caller = %caller))]
    fn create_game(
        &mut self,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError> {
        self.execute("create-game", |conn| {
            let id = next_game_id(conn)?;
            Ok(Game::create(id, caller, bet_amount, move_index, mv)?)
        })
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    fn join_game(
        &mut self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError> {
        self.execute("join-game", |conn| {
            let game = load_game(conn, game_id)?.ok_or(GameError::GameNotFound)?;
            Ok(game.join(caller, move_index, mv)?)
        })
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    fn play(
        &mut self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<Receipt, ContractError> {
        self.execute("play", |conn| {
            let game = load_game(conn, game_id)?.ok_or(GameError::GameNotFound)?;
            Ok(game.play(caller, move_index, mv)?)
        })
    }

    #[instrument(skip(self))]
    fn get_game(&self, game_id: GameId) -> Result<Option<Game>, ContractError> {
        let mut conn = self.connection()?;
        Ok(load_game(&mut conn, game_id)?)
    }

    #[instrument(skip(self))]
    fn list_games(&self) -> Result<Vec<Game>, ContractError> {
        let mut conn = self.connection()?;
        let rows = schema::games::table
            .order(schema::games::id.asc())
            .select(GameRow::as_select())
            .load::<GameRow>(&mut conn)
            .map_err(DbError::from)?;
        let games = rows
            .into_iter()
            .map(GameRow::into_game)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = games.len(), "Games loaded");
        Ok(games)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    fn balance(&self, address: &Address) -> Result<u64, ContractError> {
        let mut conn = self.connection()?;
        Ok(load_balance(&mut conn, &Account::Player(address.clone()))?)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    fn fund(&mut self, address: &Address, amount: u64) -> Result<u64, ContractError> {
        let mut conn = self.connection()?;
        let balance = conn
            .immediate_transaction(|conn| credit(conn, address, amount))
            .map_err(ContractError::from)?;
        info!(balance, "Account funded");
        Ok(balance)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    fn seed(&mut self, address: &Address, amount: u64) -> Result<Option<u64>, ContractError> {
        use schema::seeded_accounts::dsl;
        let mut conn = self.connection()?;
        let seeded = conn
            .immediate_transaction(|conn| -> Result<Option<u64>, TxError> {
                let marked = diesel::select(diesel::dsl::exists(
                    dsl::seeded_accounts.find(address.as_str()),
                ))
                .get_result::<bool>(conn)?;
                if marked {
                    return Ok(None);
                }
                let balance = credit(conn, address, amount)?;
                diesel::insert_into(dsl::seeded_accounts)
                    .values(&NewSeededAccount::new(address.to_string()))
                    .execute(conn)?;
                Ok(Some(balance))
            })
            .map_err(ContractError::from)?;
        match seeded {
            Some(balance) => info!(balance, "Account seeded"),
            None => debug!("Already seeded"),
        }
        Ok(seeded)
    }
}
