//! Account type definitions shared by the command layer and ledgers

use super::auth::Authorization;
use crate::crypto::PublicKey;
use num_bigint::BigInt;

/// Account identifier - human-readable name
pub type AccountId = String;

/// Point-in-time view of an account, as handed out by an accounting service.
///
/// The command layer never mutates accounts through this value; every change
/// goes back through the service.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub name: AccountId,
    pub balance: BigInt,
    pub authorization: Authorization,
    /// Registered keys in registration order
    pub public_keys: Vec<PublicKey>,
    pub frozen: bool,
}

impl Account {
    pub fn new(name: impl Into<AccountId>) -> Self {
        Self {
            name: name.into(),
            balance: BigInt::default(),
            authorization: Authorization::default(),
            public_keys: Vec::new(),
            frozen: false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.authorization.satisfies(Authorization::Admin)
    }
}

/// Handle to a scheduled recurring transfer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecurringTransfer {
    pub id: String,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub total_amount: BigInt,
    pub tick_count: u64,
    pub remaining_ticks: u64,
}

impl RecurringTransfer {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Amount moved on the next tick. The last tick carries the remainder.
    pub fn next_installment(&self) -> BigInt {
        if self.remaining_ticks == 0 {
            return BigInt::default();
        }
        let per_tick = &self.total_amount / BigInt::from(self.tick_count);
        if self.remaining_ticks == 1 {
            let already_paid = &per_tick * BigInt::from(self.tick_count - 1);
            &self.total_amount - already_paid
        } else {
            per_tick
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_ticks == 0
    }
}
