//! The game record and its lifecycle transitions.
//!
//! Transitions are pure: they read a record and return the next record
//! together with the ledger transfers the call requires. Nothing is
//! committed here; a [`Contract`](crate::Contract) applies both atomically.

use crate::error::GameError;
use crate::events::{Action, Event, Receipt};
use crate::ledger::{Account, Transfer};
use crate::rules::{is_draw, is_full};
use crate::types::{Address, Board, GameId, Move};
use crate::validation::{ValidMove, apply, validate_move_for};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Durable record of one match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
#[serde(rename_all = "kebab-case")]
pub struct Game {
    /// Sequential id.
    id: GameId,
    /// Creator; plays X.
    player_one: Address,
    /// Joiner; plays O.
    player_two: Option<Address>,
    /// True when player one moves next.
    is_player_one_turn: bool,
    /// Stake each player contributes, in base units.
    bet_amount: u64,
    /// Current board.
    board: Board,
    /// Set once a move completes a line.
    winner: Option<Address>,
}

/// Where a game is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    /// Created, no second player yet.
    AwaitingOpponent,
    /// Both players joined, no result yet.
    InProgress,
    /// A player completed a line.
    Won(Address),
    /// Board filled without a line; stakes refunded.
    Drawn,
}

/// Next record plus the transfers that must accompany it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Which call produced this transition.
    pub action: Action,
    /// Record after the call.
    pub game: Game,
    /// Ledger movements, in order.
    pub transfers: Vec<Transfer>,
}

impl Transition {
    /// Builds the receipt: one event per transfer, then the print event.
    pub fn into_receipt(self) -> Receipt {
        let game_id = self.game.id;
        let mut events: Vec<Event> = self.transfers.into_iter().map(Event::Transfer).collect();
        events.push(Event::Print {
            action: self.action,
            game: self.game,
        });
        Receipt { game_id, events }
    }
}

impl Game {
    /// Rebuilds a record from stored fields without re-running the rules.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: GameId,
        player_one: Address,
        player_two: Option<Address>,
        is_player_one_turn: bool,
        bet_amount: u64,
        board: Board,
        winner: Option<Address>,
    ) -> Self {
        Self {
            id,
            player_one,
            player_two,
            is_player_one_turn,
            bet_amount,
            board,
            winner,
        }
    }

    /// Opens a game with the creator's stake and first move.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidBet`] if `bet_amount` is zero or the pot overflows.
    /// - [`GameError::InvalidMove`] if the move fails validation or is not X.
    #[instrument(skip(caller), fields(caller = %caller))]
    pub fn create(
        id: GameId,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<Transition, GameError> {
        if bet_amount == 0 || bet_amount.checked_mul(2).is_none() {
            return Err(GameError::InvalidBet);
        }
        let board = Board::new();
        let valid = validate_move_for(&board, move_index, mv, Move::X)?;

        let opened = Self {
            id,
            player_one: caller.clone(),
            player_two: None,
            // Flipped by `advance` to false: player two moves next.
            is_player_one_turn: true,
            bet_amount,
            board,
            winner: None,
        };
        let mut transfers = vec![Transfer::new(
            Account::Player(caller.clone()),
            Account::Escrow(id),
            bet_amount,
        )];
        let (game, payouts) = opened.advance(caller, valid)?;
        transfers.extend(payouts);

        debug!(game_id = id, "Game opened");
        Ok(Transition {
            action: Action::CreateGame,
            game,
            transfers,
        })
    }

    /// Seats the caller as player two with a matching stake and their first move.
    ///
    /// # Errors
    ///
    /// - [`GameError::AlreadyJoined`] if player two is set or the caller created the game.
    /// - [`GameError::InvalidMove`] if the move fails validation or is not O.
    #[instrument(skip(self, caller), fields(game_id = self.id, caller = %caller))]
    pub fn join(&self, caller: &Address, move_index: u64, mv: u64) -> Result<Transition, GameError> {
        if self.player_two.is_some() {
            debug!("Second seat already taken");
            return Err(GameError::AlreadyJoined);
        }
        if *caller == self.player_one {
            debug!("Creator cannot join own game");
            return Err(GameError::AlreadyJoined);
        }
        let valid = validate_move_for(&self.board, move_index, mv, Move::O)?;

        let seated = Self {
            player_two: Some(caller.clone()),
            ..self.clone()
        };
        let mut transfers = vec![Transfer::new(
            Account::Player(caller.clone()),
            Account::Escrow(self.id),
            self.bet_amount,
        )];
        let (game, payouts) = seated.advance(caller, valid)?;
        transfers.extend(payouts);

        Ok(Transition {
            action: Action::JoinGame,
            game,
            transfers,
        })
    }

    /// Plays the caller's move.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameOver`] if the game is resolved.
    /// - [`GameError::NotYourTurn`] if the caller is not the player to move.
    /// - [`GameError::InvalidMove`] if the move fails validation or uses the wrong mark.
    #[instrument(skip(self, caller), fields(game_id = self.id, caller = %caller))]
    pub fn play(&self, caller: &Address, move_index: u64, mv: u64) -> Result<Transition, GameError> {
        if self.is_resolved() {
            return Err(GameError::GameOver);
        }
        if self.player_to_move() != Some(caller) {
            debug!(turn_flag = self.is_player_one_turn, "Caller is not the player to move");
            return Err(GameError::NotYourTurn);
        }
        let valid = validate_move_for(&self.board, move_index, mv, self.next_mark())?;
        let (game, transfers) = self.advance(caller, valid)?;

        Ok(Transition {
            action: Action::Play,
            game,
            transfers,
        })
    }

    /// Places a validated move, flips the turn flag and settles a finished game.
    fn advance(&self, mover: &Address, valid: ValidMove) -> Result<(Self, Vec<Transfer>), GameError> {
        let (board, line) = apply(&self.board, valid);
        let mut next = Self {
            board,
            is_player_one_turn: !self.is_player_one_turn,
            ..self.clone()
        };
        let escrow = Account::Escrow(self.id);
        let mut transfers = Vec::new();

        if line.is_some() {
            let pot = self.pot()?;
            debug!(winner = %mover, pot, "Line completed");
            next.winner = Some(mover.clone());
            transfers.push(Transfer::new(escrow, Account::Player(mover.clone()), pot));
        } else if is_draw(&next.board) {
            debug!("Board full without a line, refunding stakes");
            let seats = [Some(&next.player_one), next.player_two.as_ref()];
            for player in seats.into_iter().flatten() {
                transfers.push(Transfer::new(
                    escrow.clone(),
                    Account::Player(player.clone()),
                    self.bet_amount,
                ));
            }
        }
        Ok((next, transfers))
    }

    /// Combined stake of both players.
    pub fn pot(&self) -> Result<u64, GameError> {
        self.bet_amount.checked_mul(2).ok_or(GameError::InvalidBet)
    }

    /// Mark the next mover places.
    pub fn next_mark(&self) -> Move {
        if self.is_player_one_turn { Move::X } else { Move::O }
    }

    /// Address named by the turn flag; `None` while player two's seat is empty.
    pub fn player_to_move(&self) -> Option<&Address> {
        if self.is_player_one_turn {
            Some(&self.player_one)
        } else {
            self.player_two.as_ref()
        }
    }

    /// True once a winner is set or the board is full.
    pub fn is_resolved(&self) -> bool {
        self.winner.is_some() || is_full(&self.board)
    }

    /// True when `address` holds either seat.
    pub fn is_player(&self, address: &Address) -> bool {
        self.player_one == *address || self.player_two.as_ref() == Some(address)
    }

    /// Derived lifecycle status.
    pub fn status(&self) -> GameStatus {
        if let Some(winner) = &self.winner {
            GameStatus::Won(winner.clone())
        } else if is_full(&self.board) {
            GameStatus::Drawn
        } else if self.player_two.is_none() {
            GameStatus::AwaitingOpponent
        } else {
            GameStatus::InProgress
        }
    }
}
