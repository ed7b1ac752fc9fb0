//! Wagered tic-tac-toe: board rules, game lifecycle and escrow ledger.
//!
//! # Architecture
//!
//! - **Board model**: [`Board`] of nine [`Move`] cells
//! - **Rules**: win and draw detection over the eight lines
//! - **Validation**: one predicate shared by every move-submitting call
//! - **Lifecycle**: [`Game::create`], [`Game::join`], [`Game::play`] as pure transitions
//! - **Ledger**: balances and per-game escrow, applied all-or-nothing
//! - **Contract**: the transactional call surface, with [`MemoryContract`]
//!
//! # Example
//!
//! ```
//! use stakes_tictactoe::{Address, Contract, MemoryContract, Move};
//!
//! # fn example() -> Result<(), stakes_tictactoe::ContractError> {
//! let alice = Address::new("alice");
//! let mut contract = MemoryContract::new();
//! contract.fund(&alice, 1_000)?;
//!
//! let receipt = contract.create_game(&alice, 100, 4, Move::X.to_wire().into())?;
//! assert_eq!(receipt.game_id, 0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod contract;
mod error;
mod events;
mod game;
mod ledger;
pub mod rules;
pub mod stake;
mod types;
mod validation;

pub use contract::{Contract, MemoryContract, log_outcome};
pub use error::{ContractError, GameError, StorageError};
pub use events::{Action, Event, Receipt};
pub use game::{Game, GameStatus, Transition};
pub use ledger::{Account, Ledger, Transfer};
pub use types::{Address, Board, CELLS, GameId, Move};
pub use validation::{ValidMove, Validation, place, validate_move, validate_move_for};
