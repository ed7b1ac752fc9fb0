//! Command-line interface for the stakes binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wagered tic-tac-toe: game service and terminal client
#[derive(Parser, Debug)]
#[command(name = "stakes")]
#[command(about = "Wagered tic-tac-toe service and client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Service configuration file
    #[arg(long, global = true, default_value = "stakes.toml")]
    pub config: PathBuf,

    /// Game service URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000")]
    pub server_url: String,

    /// Address to act as (falls back to STAKES_CALLER)
    #[arg(long, global = true)]
    pub caller: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game service
    Serve {
        /// Override the configured database path
        #[arg(long)]
        database: Option<String>,

        /// Enable the development faucet
        #[arg(long)]
        faucet: bool,
    },

    /// Open a game, playing X
    Create {
        /// Stake in STX, e.g. 1.5
        #[arg(long)]
        bet: String,

        /// Cell 1-9 as shown on the board
        #[arg(long)]
        cell: usize,
    },

    /// Join an open game, playing O
    Join {
        /// Game id
        game_id: u64,

        /// Cell 1-9 as shown on the board
        #[arg(long)]
        cell: usize,
    },

    /// Play the next move in a game
    Play {
        /// Game id
        game_id: u64,

        /// Cell 1-9 as shown on the board
        #[arg(long)]
        cell: usize,
    },

    /// Show one game
    Show {
        /// Game id
        game_id: u64,
    },

    /// List games grouped for the caller
    List,

    /// Show a balance
    Balance {
        /// Address (defaults to the caller)
        address: Option<String>,
    },

    /// Mint funds through the faucet
    Fund {
        /// Address to credit
        address: String,

        /// Amount in STX
        amount: String,
    },
}
