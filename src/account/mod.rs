//! Account model and the in-memory ledger
//!
//! - Ordered authorization levels
//! - Account snapshots handed to the command layer
//! - Arbitrary-precision balances
//! - `InMemoryLedger`, a complete `AccountingService`

pub mod auth;
pub mod balance;
pub mod store;
pub mod types;

pub use auth::Authorization;
pub use balance::BalanceSheet;
pub use store::InMemoryLedger;
pub use types::{Account, AccountId, RecurringTransfer};
