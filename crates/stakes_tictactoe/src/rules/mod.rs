//! Board rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board), kept apart from the game
//! record so the lifecycle can run them after every placement.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_winner};
