//! Accounting capability consumed by the command layer
//!
//! Balance storage, transfer rules, money creation and recurring transfer
//! scheduling all live behind this trait. Implementations own their
//! concurrency control: every call is applied atomically or not at all.

use crate::account::{Account, Authorization, RecurringTransfer};
use crate::crypto::PublicKey;
use crate::error::LedgerError;
use num_bigint::BigInt;

pub trait AccountingService: Send + Sync {
    fn has_account(&self, name: &str) -> bool;

    fn get_account(&self, name: &str) -> Option<Account>;

    /// Fails with `AccountAlreadyExists` if the name is taken.
    fn open_account(&self, name: &str) -> Result<Account, LedgerError>;

    fn get_account_authorization(&self, account: &Account) -> Authorization;

    fn set_authorization(
        &self,
        actor: &Account,
        target: &Account,
        level: Authorization,
    ) -> Result<(), LedgerError>;

    fn can_transfer(&self, sender: &Account, recipient: &Account, amount: &BigInt) -> bool;

    /// Moves `amount` from `sender` to `recipient` on behalf of `actor`.
    /// Returns a proof token when the ledger produces one.
    fn transfer(
        &self,
        actor: &Account,
        sender: &Account,
        recipient: &Account,
        amount: &BigInt,
    ) -> Result<Option<String>, LedgerError>;

    fn print_money(&self, actor: &Account, recipient: &Account, amount: &BigInt) -> Result<(), LedgerError>;

    fn create_recurring_transfer(
        &self,
        actor: &Account,
        sender: &Account,
        recipient: &Account,
        total_amount: &BigInt,
        tick_count: u64,
    ) -> Result<RecurringTransfer, LedgerError>;

    fn add_public_key(&self, account: &Account, key: PublicKey) -> Result<(), LedgerError>;

    fn set_frozen(&self, actor: &Account, target: &Account, frozen: bool) -> Result<(), LedgerError>;

    /// All accounts, ordered by name
    fn list_accounts(&self) -> Vec<Account>;

    fn get_account_id(&self, account: &Account) -> String;
}
