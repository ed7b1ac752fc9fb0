//! Events emitted by successful calls.

use crate::game::Game;
use crate::ledger::Transfer;
use crate::types::GameId;
use serde::{Deserialize, Serialize};

/// The call that produced a print event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    /// `create-game`
    CreateGame,
    /// `join-game`
    JoinGame,
    /// `play`
    Play,
}

/// One entry in a call's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// Funds moved between accounts.
    Transfer(Transfer),
    /// The record written by the call.
    Print {
        /// Call name.
        action: Action,
        /// Record after the call.
        game: Game,
    },
}

/// Successful result of a mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Id of the game the call touched.
    pub game_id: GameId,
    /// Transfers in order, then one print event.
    pub events: Vec<Event>,
}

impl Receipt {
    /// Number of transfer events.
    pub fn transfer_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Transfer(_)))
            .count()
    }

    /// The record carried by the print event.
    pub fn game(&self) -> Option<&Game> {
        self.events.iter().find_map(|event| match event {
            Event::Print { game, .. } => Some(game),
            Event::Transfer(_) => None,
        })
    }
}
