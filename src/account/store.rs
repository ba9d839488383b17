//! In-memory accounting service
//!
//! Nothing is persisted. All state sits behind one mutex so every
//! `AccountingService` call is atomic.

use super::auth::Authorization;
use super::balance::{BalanceError, BalanceSheet};
use super::types::{Account, AccountId, RecurringTransfer};
use crate::accounting::AccountingService;
use crate::crypto::PublicKey;
use crate::error::LedgerError;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Clone, Debug, Default)]
struct AccountRecord {
    authorization: Authorization,
    public_keys: Vec<PublicKey>,
    frozen: bool,
}

#[derive(Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, AccountRecord>,
    balances: BalanceSheet,
    recurring: Vec<RecurringTransfer>,
    transfer_count: u64,
}

impl LedgerState {
    fn snapshot(&self, name: &str) -> Option<Account> {
        self.accounts.get(name).map(|record| Account {
            name: name.to_string(),
            balance: self.balances.get_balance(name),
            authorization: record.authorization,
            public_keys: record.public_keys.clone(),
            frozen: record.frozen,
        })
    }

    fn record(&self, name: &str) -> Result<&AccountRecord, LedgerError> {
        self.accounts
            .get(name)
            .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))
    }

    fn record_mut(&mut self, name: &str) -> Result<&mut AccountRecord, LedgerError> {
        self.accounts
            .get_mut(name)
            .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))
    }

    fn require_admin(&self, actor: &str) -> Result<(), LedgerError> {
        if self.record(actor)?.authorization.satisfies(Authorization::Admin) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(actor.to_string()))
        }
    }

    fn can_transfer(&self, sender: &str, recipient: &str, amount: &BigInt) -> bool {
        let (Some(from), Some(to)) = (self.accounts.get(sender), self.accounts.get(recipient)) else {
            return false;
        };
        amount.is_positive()
            && self.balances.get_balance(sender) >= *amount
            && !from.frozen
            && !to.frozen
    }

    fn move_funds(&mut self, sender: &str, recipient: &str, amount: &BigInt) -> Result<String, LedgerError> {
        if !self.can_transfer(sender, recipient, amount) {
            return Err(LedgerError::TransferRejected(format!(
                "{} -> {} ({})",
                sender, recipient, amount
            )));
        }
        self.balances
            .transfer(sender, recipient, amount)
            .map_err(|e| match e {
                BalanceError::InsufficientFunds => LedgerError::TransferRejected("insufficient funds".to_string()),
                BalanceError::InvalidAmount => LedgerError::TransferRejected("invalid amount".to_string()),
            })?;

        self.transfer_count += 1;
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}:{}:{}", self.transfer_count, sender, recipient, amount));
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Reference ledger used by the binary and the test-suite
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // mutations validate before writing, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open an account with a given level and starting balance, bypassing the
    /// usual authorization checks. Used when bootstrapping from config.
    pub fn seed_account(
        &self,
        name: &str,
        authorization: Authorization,
        balance: &BigInt,
    ) -> Result<Account, LedgerError> {
        let mut state = self.lock();
        if state.accounts.contains_key(name) {
            return Err(LedgerError::AccountAlreadyExists(name.to_string()));
        }
        state
            .balances
            .credit(name, balance)
            .map_err(|_| LedgerError::TransferRejected(format!("negative opening balance for {}", name)))?;
        state.accounts.insert(
            name.to_string(),
            AccountRecord {
                authorization,
                ..AccountRecord::default()
            },
        );
        info!(account = name, level = %authorization, "Seeded account");
        state
            .snapshot(name)
            .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))
    }

    /// Pending recurring transfers, oldest first
    pub fn recurring_transfers(&self) -> Vec<RecurringTransfer> {
        self.lock().recurring.clone()
    }

    /// Advance every recurring transfer by one tick.
    ///
    /// Installments that cannot be paid are skipped; the transfer still counts
    /// down. Returns the number of installments actually paid.
    pub fn tick(&self) -> usize {
        let mut state = self.lock();
        let mut pending = std::mem::take(&mut state.recurring);
        let mut paid = 0;

        for transfer in pending.iter_mut() {
            let installment = transfer.next_installment();
            match state.move_funds(&transfer.sender, &transfer.recipient, &installment) {
                Ok(_) => paid += 1,
                Err(e) => debug!(id = %transfer.id, error = %e, "Skipped recurring installment"),
            }
            transfer.remaining_ticks -= 1;
        }

        pending.retain(|transfer| !transfer.is_finished());
        state.recurring = pending;
        paid
    }

    pub fn total_supply(&self) -> BigInt {
        self.lock().balances.total_supply()
    }
}

impl AccountingService for InMemoryLedger {
    fn has_account(&self, name: &str) -> bool {
        self.lock().accounts.contains_key(name)
    }

    fn get_account(&self, name: &str) -> Option<Account> {
        self.lock().snapshot(name)
    }

    fn open_account(&self, name: &str) -> Result<Account, LedgerError> {
        self.seed_account(name, Authorization::default(), &BigInt::zero())
    }

    fn get_account_authorization(&self, account: &Account) -> Authorization {
        self.lock()
            .accounts
            .get(&account.name)
            .map(|record| record.authorization)
            .unwrap_or_default()
    }

    fn set_authorization(
        &self,
        actor: &Account,
        target: &Account,
        level: Authorization,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock();
        state.require_admin(&actor.name)?;
        state.record_mut(&target.name)?.authorization = level;
        Ok(())
    }

    fn can_transfer(&self, sender: &Account, recipient: &Account, amount: &BigInt) -> bool {
        self.lock().can_transfer(&sender.name, &recipient.name, amount)
    }

    fn transfer(
        &self,
        actor: &Account,
        sender: &Account,
        recipient: &Account,
        amount: &BigInt,
    ) -> Result<Option<String>, LedgerError> {
        let mut state = self.lock();
        if actor.name != sender.name {
            state.require_admin(&actor.name)?;
        } else {
            state.record(&actor.name)?;
        }
        state.move_funds(&sender.name, &recipient.name, amount).map(Some)
    }

    fn print_money(&self, actor: &Account, recipient: &Account, amount: &BigInt) -> Result<(), LedgerError> {
        let mut state = self.lock();
        state.require_admin(&actor.name)?;
        state.record(&recipient.name)?;
        state
            .balances
            .credit(&recipient.name, amount)
            .map_err(|_| LedgerError::TransferRejected(format!("cannot print {}", amount)))
    }

    fn create_recurring_transfer(
        &self,
        actor: &Account,
        sender: &Account,
        recipient: &Account,
        total_amount: &BigInt,
        tick_count: u64,
    ) -> Result<RecurringTransfer, LedgerError> {
        if tick_count == 0 {
            return Err(LedgerError::InvalidTickCount(tick_count));
        }
        let mut state = self.lock();
        state.require_admin(&actor.name)?;
        state.record(&sender.name)?;
        state.record(&recipient.name)?;

        let transfer = RecurringTransfer {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.name.clone(),
            recipient: recipient.name.clone(),
            total_amount: total_amount.clone(),
            tick_count,
            remaining_ticks: tick_count,
        };
        state.recurring.push(transfer.clone());
        Ok(transfer)
    }

    fn add_public_key(&self, account: &Account, key: PublicKey) -> Result<(), LedgerError> {
        self.lock().record_mut(&account.name)?.public_keys.push(key);
        Ok(())
    }

    fn set_frozen(&self, actor: &Account, target: &Account, frozen: bool) -> Result<(), LedgerError> {
        let mut state = self.lock();
        state.require_admin(&actor.name)?;
        state.record_mut(&target.name)?.frozen = frozen;
        Ok(())
    }

    fn list_accounts(&self) -> Vec<Account> {
        let state = self.lock();
        state
            .accounts
            .keys()
            .filter_map(|name| state.snapshot(name))
            .collect()
    }

    fn get_account_id(&self, account: &Account) -> String {
        account.name.clone()
    }
}
