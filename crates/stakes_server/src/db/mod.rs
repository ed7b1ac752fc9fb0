//! SQLite persistence for game records and balances.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::{BalanceRow, GameRow, NewGameRow, NewSeededAccount};
pub use repository::SqliteContract;
