//! Partition of the game list for one viewer.

use stakes_tictactoe::{Address, Game, stake};

/// Games grouped the way the lobby shows them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameListing {
    /// Unresolved games the viewer sits in.
    pub active: Vec<Game>,
    /// Unresolved games with an open seat the viewer may take.
    pub joinable: Vec<Game>,
    /// Resolved games.
    pub ended: Vec<Game>,
}

impl GameListing {
    /// Partitions `games` for `viewer`.
    ///
    /// Without a viewer no game is active and every open game is joinable.
    pub fn build(games: &[Game], viewer: Option<&Address>) -> Self {
        let mut listing = Self::default();
        for game in games {
            if game.is_resolved() {
                listing.ended.push(game.clone());
            } else if viewer.is_some_and(|viewer| game.is_player(viewer)) {
                listing.active.push(game.clone());
            } else if game.player_two().is_none() {
                listing.joinable.push(game.clone());
            }
        }
        listing
    }
}

/// One-line summary of a game card.
pub fn card_summary(game: &Game) -> String {
    let state = match (game.winner(), game.is_resolved()) {
        (Some(winner), _) => format!("Winner: {}", winner.abbreviated()),
        (None, true) => "Draw".to_string(),
        (None, false) => format!("Next Turn: {}", game.next_mark()),
    };
    format!(
        "#{}  {} STX  {}  {}",
        game.id(),
        stake::format_display(*game.bet_amount()),
        game.player_one().abbreviated(),
        state
    )
}
