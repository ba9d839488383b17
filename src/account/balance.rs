//! Balance tracking for the in-memory ledger

use super::types::AccountId;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::collections::HashMap;

/// Arbitrary-precision balances keyed by account
#[derive(Clone, Debug, Default)]
pub struct BalanceSheet {
    balances: HashMap<AccountId, BigInt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    InsufficientFunds,
    InvalidAmount,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get balance for an account; unknown accounts hold zero
    pub fn get_balance(&self, account: &str) -> BigInt {
        self.balances.get(account).cloned().unwrap_or_default()
    }

    /// Credit (add) balance to an account
    pub fn credit(&mut self, account: &str, amount: &BigInt) -> Result<(), BalanceError> {
        if amount.is_negative() {
            return Err(BalanceError::InvalidAmount);
        }
        if amount.is_zero() {
            return Ok(());
        }

        *self.balances.entry(account.to_string()).or_default() += amount;
        Ok(())
    }

    /// Debit (subtract) balance from an account
    pub fn debit(&mut self, account: &str, amount: &BigInt) -> Result<(), BalanceError> {
        if amount.is_negative() {
            return Err(BalanceError::InvalidAmount);
        }
        if amount.is_zero() {
            return Ok(());
        }

        let current = self.get_balance(account);
        if &current < amount {
            return Err(BalanceError::InsufficientFunds);
        }

        let remaining = current - amount;
        if remaining.is_zero() {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.to_string(), remaining);
        }
        Ok(())
    }

    /// Move balance from one account to another. Nothing changes on failure.
    pub fn transfer(&mut self, from: &str, to: &str, amount: &BigInt) -> Result<(), BalanceError> {
        self.debit(from, amount)?;
        // credit only fails on negative amounts, which debit already rejected
        self.credit(to, amount)
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> BigInt {
        self.balances.values().sum()
    }
}
