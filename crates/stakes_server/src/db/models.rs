//! Database models and their mapping to game records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use stakes_tictactoe::{Account, Address, Board, Game, GameId};
use tracing::instrument;

use crate::db::{DbError, schema};

/// Stored game record.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRow {
    id: i64,
    player_one: String,
    player_two: Option<String>,
    is_player_one_turn: bool,
    bet_amount: i64,
    board: String,
    winner: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl GameRow {
    /// Rebuilds the game record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a column holds a value no record can have.
    #[instrument(skip(self), fields(id = self.id))]
    pub fn into_game(self) -> Result<Game, DbError> {
        let id = GameId::try_from(self.id)
            .map_err(|_| DbError::new(format!("Negative game id: {}", self.id)))?;
        let bet_amount = u64::try_from(self.bet_amount)
            .map_err(|_| DbError::new(format!("Negative bet in game {}: {}", id, self.bet_amount)))?;
        Ok(Game::restore(
            id,
            Address::new(self.player_one),
            self.player_two.map(Address::new),
            self.is_player_one_turn,
            bet_amount,
            decode_board(&self.board)?,
            self.winner.map(Address::new),
        ))
    }
}

/// Insertable game record for a newly created game.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::games)]
pub struct NewGameRow {
    id: i64,
    player_one: String,
    player_two: Option<String>,
    is_player_one_turn: bool,
    bet_amount: i64,
    board: String,
    winner: Option<String>,
}

impl TryFrom<&Game> for NewGameRow {
    type Error = DbError;

    fn try_from(game: &Game) -> Result<Self, Self::Error> {
        Ok(Self::new(
            to_column(*game.id())?,
            game.player_one().to_string(),
            game.player_two().as_ref().map(Address::to_string),
            *game.is_player_one_turn(),
            to_column(*game.bet_amount())?,
            encode_board(game.board()),
            game.winner().as_ref().map(Address::to_string),
        ))
    }
}

/// `kind` column value of player balances.
const PLAYER_KIND: &str = "player";
/// `kind` column value of escrow balances.
const ESCROW_KIND: &str = "escrow";

/// Primary key of an account's balance row.
///
/// Players and escrows live under different kinds, so no address can name
/// an escrow row.
pub(crate) fn balance_key(account: &Account) -> (&'static str, String) {
    match account {
        Account::Player(address) => (PLAYER_KIND, address.to_string()),
        Account::Escrow(game_id) => (ESCROW_KIND, game_id.to_string()),
    }
}

/// Stored balance of one ledger account.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, new, Getters)]
#[diesel(table_name = schema::balances)]
pub struct BalanceRow {
    kind: String,
    holder: String,
    amount: i64,
}

impl BalanceRow {
    /// Builds a row for an account balance.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the amount does not fit the column.
    pub fn from_balance(account: &Account, amount: u64) -> Result<Self, DbError> {
        let (kind, holder) = balance_key(account);
        Ok(Self::new(kind.to_string(), holder, to_column(amount)?))
    }

    /// Balance in base units.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored amount is negative.
    pub fn balance(&self) -> Result<u64, DbError> {
        from_column(self.amount)
    }
}

/// Marks an address as having received its starting balance.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::seeded_accounts)]
pub struct NewSeededAccount {
    address: String,
}

/// Converts an unsigned amount or id to its column value.
pub(crate) fn to_column(value: u64) -> Result<i64, DbError> {
    i64::try_from(value).map_err(|_| DbError::new(format!("Value exceeds column range: {}", value)))
}

/// Converts a column value back to an unsigned amount.
pub(crate) fn from_column(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_| DbError::new(format!("Negative stored amount: {}", value)))
}

/// Stores a board as its nine wire values, comma separated.
pub(crate) fn encode_board(board: &Board) -> String {
    board
        .to_wire()
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a board stored by [`encode_board`].
pub(crate) fn decode_board(text: &str) -> Result<Board, DbError> {
    let values = text
        .split(',')
        .map(|cell| cell.trim().parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::new(format!("Malformed board '{}': {}", text, e)))?;
    Board::from_wire(&values).ok_or_else(|| DbError::new(format!("Invalid board '{}'", text)))
}
