#![allow(dead_code)]

use num_bigint::BigInt;
use rust_ledgerbot::account::{Account, Authorization, InMemoryLedger, RecurringTransfer};
use rust_ledgerbot::accounting::AccountingService;
use rust_ledgerbot::commands::{CommandRegistry, Dispatcher};
use rust_ledgerbot::crypto::{Ed25519Signatures, PrivateKey, PublicKey};
use rust_ledgerbot::error::LedgerError;
use std::sync::{Arc, Mutex};

/// A ledger call as seen by the double
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CanTransfer { sender: String, recipient: String, amount: BigInt },
    Transfer { actor: String, sender: String, recipient: String, amount: BigInt },
    OpenAccount(String),
    AddPublicKey(String),
    PrintMoney { actor: String, recipient: String, amount: BigInt },
}

/// Wraps the in-memory ledger and records every mutating or feasibility call.
#[derive(Default)]
pub struct RecordingLedger {
    pub inner: InMemoryLedger,
    calls: Mutex<Vec<Call>>,
}

impl RecordingLedger {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AccountingService for RecordingLedger {
    fn has_account(&self, name: &str) -> bool {
        self.inner.has_account(name)
    }

    fn get_account(&self, name: &str) -> Option<Account> {
        self.inner.get_account(name)
    }

    fn open_account(&self, name: &str) -> Result<Account, LedgerError> {
        self.record(Call::OpenAccount(name.to_string()));
        self.inner.open_account(name)
    }

    fn get_account_authorization(&self, account: &Account) -> Authorization {
        self.inner.get_account_authorization(account)
    }

    fn set_authorization(&self, actor: &Account, target: &Account, level: Authorization) -> Result<(), LedgerError> {
        self.inner.set_authorization(actor, target, level)
    }

    fn can_transfer(&self, sender: &Account, recipient: &Account, amount: &BigInt) -> bool {
        self.record(Call::CanTransfer {
            sender: sender.name.clone(),
            recipient: recipient.name.clone(),
            amount: amount.clone(),
        });
        self.inner.can_transfer(sender, recipient, amount)
    }

    fn transfer(
        &self,
        actor: &Account,
        sender: &Account,
        recipient: &Account,
        amount: &BigInt,
    ) -> Result<Option<String>, LedgerError> {
        self.record(Call::Transfer {
            actor: actor.name.clone(),
            sender: sender.name.clone(),
            recipient: recipient.name.clone(),
            amount: amount.clone(),
        });
        self.inner.transfer(actor, sender, recipient, amount)
    }

    fn print_money(&self, actor: &Account, recipient: &Account, amount: &BigInt) -> Result<(), LedgerError> {
        self.record(Call::PrintMoney {
            actor: actor.name.clone(),
            recipient: recipient.name.clone(),
            amount: amount.clone(),
        });
        self.inner.print_money(actor, recipient, amount)
    }

    fn create_recurring_transfer(
        &self,
        actor: &Account,
        sender: &Account,
        recipient: &Account,
        total_amount: &BigInt,
        tick_count: u64,
    ) -> Result<RecurringTransfer, LedgerError> {
        self.inner
            .create_recurring_transfer(actor, sender, recipient, total_amount, tick_count)
    }

    fn add_public_key(&self, account: &Account, key: PublicKey) -> Result<(), LedgerError> {
        self.record(Call::AddPublicKey(account.name.clone()));
        self.inner.add_public_key(account, key)
    }

    fn set_frozen(&self, actor: &Account, target: &Account, frozen: bool) -> Result<(), LedgerError> {
        self.inner.set_frozen(actor, target, frozen)
    }

    fn list_accounts(&self) -> Vec<Account> {
        self.inner.list_accounts()
    }

    fn get_account_id(&self, account: &Account) -> String {
        self.inner.get_account_id(account)
    }
}

pub struct Fixture {
    pub ledger: Arc<RecordingLedger>,
    pub dispatcher: Dispatcher,
}

impl Fixture {
    pub fn new(accounts: &[(&str, Authorization, i64)]) -> Self {
        let ledger = Arc::new(RecordingLedger::default());
        for (name, level, balance) in accounts {
            ledger.inner.seed_account(name, *level, &BigInt::from(*balance)).unwrap();
        }
        let dispatcher = Dispatcher::new(CommandRegistry::standard().unwrap(), ledger.clone(), Arc::new(Ed25519Signatures));
        Self { ledger, dispatcher }
    }

    pub fn with_max_proxy_depth(mut self, depth: usize) -> Self {
        self.dispatcher = self.dispatcher.with_max_proxy_depth(depth);
        self
    }

    pub fn send(&self, author: &str, message: &str) -> String {
        self.dispatcher.process(author, message).unwrap()
    }

    /// Generate a key and register it on `account`.
    pub fn register_key(&self, account: &str) -> PrivateKey {
        let key = PrivateKey::generate();
        let snapshot = self.ledger.get_account(account).unwrap();
        self.ledger.inner.add_public_key(&snapshot, key.public_key()).unwrap();
        key
    }

    pub fn balance(&self, account: &str) -> BigInt {
        self.ledger.get_account(account).unwrap().balance
    }
}
