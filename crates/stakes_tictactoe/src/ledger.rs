//! Balances and per-game escrow.

use crate::error::GameError;
use crate::types::{Address, GameId};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// A ledger account: a player's wallet or a game's escrow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Account {
    /// Funds held by a player.
    #[display("{}", _0)]
    Player(Address),
    /// Stakes held for a game until it resolves.
    #[display("escrow:{}", _0)]
    Escrow(GameId),
}

impl From<Address> for Account {
    fn from(address: Address) -> Self {
        Account::Player(address)
    }
}

/// A movement of funds between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Transfer {
    /// Debited account.
    pub from: Account,
    /// Credited account.
    pub to: Account,
    /// Amount in base units.
    pub amount: u64,
}

/// Account balances in base units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: BTreeMap<Account, u64>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger holding the given balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (Account, u64)>) -> Self {
        Self {
            balances: balances.into_iter().collect(),
        }
    }

    /// Balance of an account; unknown accounts hold zero.
    pub fn balance(&self, account: &Account) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Sum of every balance. Transfers never change it.
    pub fn total(&self) -> u128 {
        self.balances.values().map(|amount| u128::from(*amount)).sum()
    }

    /// Mints funds into an account.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidAmount`] for a zero amount or if the balance
    /// would overflow.
    #[instrument(skip(self))]
    pub fn credit(&mut self, account: Account, amount: u64) -> Result<u64, GameError> {
        if amount == 0 {
            return Err(GameError::InvalidAmount);
        }
        let balance = self
            .balance(&account)
            .checked_add(amount)
            .ok_or(GameError::InvalidAmount)?;
        self.balances.insert(account, balance);
        Ok(balance)
    }

    /// Applies every transfer or none of them.
    ///
    /// # Errors
    ///
    /// [`GameError::InsufficientBalance`] if any debit exceeds the balance at
    /// that point, [`GameError::InvalidAmount`] if a credit overflows.
    #[instrument(skip(self, transfers), fields(count = transfers.len()))]
    pub fn apply(&mut self, transfers: &[Transfer]) -> Result<(), GameError> {
        let mut staged = self.balances.clone();
        for transfer in transfers {
            let from = staged.get(&transfer.from).copied().unwrap_or(0);
            let Some(from) = from.checked_sub(transfer.amount) else {
                warn!(
                    account = %transfer.from,
                    balance = from,
                    amount = transfer.amount,
                    "Transfer exceeds balance"
                );
                return Err(GameError::InsufficientBalance);
            };
            staged.insert(transfer.from.clone(), from);

            let to = staged.get(&transfer.to).copied().unwrap_or(0);
            let to = to
                .checked_add(transfer.amount)
                .ok_or(GameError::InvalidAmount)?;
            staged.insert(transfer.to.clone(), to);
            debug!(from = %transfer.from, to = %transfer.to, amount = transfer.amount, "Transfer staged");
        }
        self.balances = staged;
        Ok(())
    }

    /// Accounts a set of transfers reads or writes.
    pub fn touched(transfers: &[Transfer]) -> BTreeSet<Account> {
        transfers
            .iter()
            .flat_map(|transfer| [transfer.from.clone(), transfer.to.clone()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Account {
        Account::Player(Address::new("alice"))
    }

    #[test]
    fn test_player_named_like_escrow_is_separate() {
        let impostor = Account::Player(Address::new("escrow:0"));
        let mut ledger = Ledger::with_balances([(Account::Escrow(0), 200)]);
        let result = ledger.apply(&[Transfer::new(impostor.clone(), alice(), 100)]);
        assert_eq!(result, Err(GameError::InsufficientBalance));
        assert_eq!(ledger.balance(&Account::Escrow(0)), 200);
        assert_eq!(ledger.balance(&impostor), 0);
    }

    #[test]
    fn test_transfer_moves_funds() {
        let mut ledger = Ledger::with_balances([(alice(), 500)]);
        ledger
            .apply(&[Transfer::new(alice(), Account::Escrow(0), 200)])
            .unwrap();
        assert_eq!(ledger.balance(&alice()), 300);
        assert_eq!(ledger.balance(&Account::Escrow(0)), 200);
        assert_eq!(ledger.total(), 500);
    }

    #[test]
    fn test_failed_batch_changes_nothing() {
        let mut ledger = Ledger::with_balances([(alice(), 100)]);
        let before = ledger.clone();
        let result = ledger.apply(&[
            Transfer::new(alice(), Account::Escrow(0), 60),
            Transfer::new(alice(), Account::Escrow(1), 60),
        ]);
        assert_eq!(result, Err(GameError::InsufficientBalance));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_credit_rejects_zero() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.credit(alice(), 0), Err(GameError::InvalidAmount));
        assert_eq!(ledger.credit(alice(), 5), Ok(5));
    }
}
