//! Game service for wagered tic-tac-toe.
//!
//! # Architecture
//!
//! - **Persistence**: [`db::SqliteContract`] stores records and balances with Diesel
//! - **Service**: [`GameService`] serializes calls onto one contract
//! - **HTTP**: [`server::router`] exposes the service as JSON over axum
//! - **Client**: [`client::HttpClient`] and the in-process service share [`client::GameApi`];
//!   [`client::Session`] submits pending moves through either

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod server;
mod service;

pub use config::{ConfigError, SeedAccount, ServerConfig};
pub use service::{GameService, ServiceError};
