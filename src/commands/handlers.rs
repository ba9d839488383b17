//! Command handlers
//!
//! Each handler receives the full raw message, parses it with the matching
//! grammar from [`super::parse`] and talks to the ledger only through
//! [`AccountingService`]. Authorization gating happens in the dispatcher
//! before any of these run.

use super::dispatch::Invocation;
use super::parse::{
    parse_account_name, parse_admin_transfer, parse_authorization, parse_print_money,
    parse_recurring_transfer, parse_transfer,
};
use crate::account::Account;
use crate::accounting::AccountingService;
use crate::error::{CommandError, LedgerError};
use num_bigint::BigInt;
use num_traits::Signed;
use tracing::info;

/// Look up an account that a handler needs, failing with a "no account" reply.
fn require_account(ledger: &dyn AccountingService, name: &str) -> Result<Account, CommandError> {
    ledger
        .get_account(name)
        .ok_or_else(|| CommandError::NoAccount(name.to_string()))
}

/// Shared by `transfer` and `admin-transfer`.
///
/// Feasibility is always asked before the transfer is attempted.
fn perform_transfer(
    ledger: &dyn AccountingService,
    author: &str,
    sender: &str,
    recipient: &str,
    amount: &BigInt,
) -> Result<String, CommandError> {
    let actor = require_account(ledger, author)?;
    let sender = require_account(ledger, sender)?;
    let recipient = require_account(ledger, recipient)?;

    if !ledger.can_transfer(&sender, &recipient, amount) {
        return Err(CommandError::TransferInfeasible);
    }

    let proof = match ledger.transfer(&actor, &sender, &recipient, amount) {
        Ok(proof) => proof,
        // state moved between the check and the transfer
        Err(LedgerError::TransferRejected(_)) => return Err(CommandError::TransferInfeasible),
        Err(e) => return Err(e.into()),
    };
    info!(actor = %actor.name, sender = %sender.name, recipient = %recipient.name, %amount, "Transfer performed");

    Ok(match proof {
        Some(proof) => format!("Transfer performed successfully. Proof: {}.", proof),
        None => "Transfer performed successfully.".to_string(),
    })
}

pub fn help(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    Ok(format!(
        "Hi {}! Here's a list of the commands I understand:\n\n{}",
        invocation.author,
        invocation.help_listing()
    ))
}

pub fn transfer(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let args = parse_transfer(invocation.message).map_err(|_| {
        CommandError::malformed(
            "Transfer formatted incorrectly. Expected `transfer AMOUNT BENEFICIARY`, \
             where AMOUNT is a positive integer and BENEFICIARY is a username.",
        )
    })?;
    perform_transfer(
        invocation.ledger(),
        invocation.author,
        invocation.author,
        &args.beneficiary,
        &args.amount,
    )
}

pub fn admin_transfer(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let args = parse_admin_transfer(invocation.message).map_err(|_| {
        CommandError::malformed(
            "Admin transfer formatted incorrectly. Expected `admin-transfer AMOUNT SENDER BENEFICIARY`, \
             where AMOUNT is a positive integer and SENDER, BENEFICIARY are account holders.",
        )
    })?;
    perform_transfer(
        invocation.ledger(),
        invocation.author,
        &args.sender,
        &args.beneficiary,
        &args.amount,
    )
}

pub fn open_account(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let ledger = invocation.ledger();
    let author = invocation.author;
    let already_open = || {
        format!(
            "Hi there {}. Looks like you already have an account. No need to open another one.",
            author
        )
    };
    if ledger.has_account(author) {
        return Ok(already_open());
    }

    match ledger.open_account(author) {
        Ok(_) => {}
        // opened concurrently since the check
        Err(LedgerError::AccountAlreadyExists(_)) => return Ok(already_open()),
        Err(e) => return Err(e.into()),
    }
    info!(account = author, "Account opened");
    Ok(format!(
        "Hi there {}. Your account has been opened successfully. Thank you for your business.",
        author
    ))
}

pub fn admin_open_account(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let name = parse_account_name(invocation.message).map_err(|_| {
        CommandError::malformed(
            "Incorrectly formatted command; expected `admin-open ACCOUNT_NAME`, \
             where `ACCOUNT_NAME` is the name of the account to create.",
        )
    })?;

    let ledger = invocation.ledger();
    let already_exists = || CommandError::Rejected(format!("Account `{}` already exists.", name));
    if ledger.has_account(&name) {
        return Err(already_exists());
    }

    match ledger.open_account(&name) {
        Ok(_) => {}
        Err(LedgerError::AccountAlreadyExists(_)) => return Err(already_exists()),
        Err(e) => return Err(e.into()),
    }
    info!(account = %name, opened_by = invocation.author, "Account opened");
    Ok(format!("Account `{}` has been opened successfully.", name))
}

pub fn balance(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let ledger = invocation.ledger();
    let author = invocation.author;
    let Some(account) = ledger.get_account(author) else {
        return Ok(format!(
            "Hi there {}. I can't tell you what the balance on your account is because you don't have an account yet. \
             You can open one with the `open` command.",
            author
        ));
    };

    let level = ledger.get_account_authorization(&account);
    Ok(format!(
        "Hi there {} {}. The balance on your account is {}. Have a great day.",
        level.name().to_lowercase(),
        author,
        account.balance
    ))
}

/// `add-public-key` followed by PEM text on the next lines.
pub fn add_public_key(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let ledger = invocation.ledger();
    let account = require_account(ledger, invocation.author)?;

    let pem = invocation
        .message
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let key = invocation.signatures().parse_public_key(&pem).map_err(|e| {
        CommandError::malformed(format!("Incorrectly formatted key. Inner error message: {}.", e))
    })?;

    ledger.add_public_key(&account, key)?;
    info!(account = %account.name, "Public key registered");
    Ok("Public key added successfully.".to_string())
}

pub fn authorize(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let args = parse_authorization(invocation.message).map_err(|_| {
        CommandError::malformed(
            "Authorization formatted incorrectly. The right format is \
             `authorize BENEFICIARY citizen|admin|developer`.",
        )
    })?;

    let ledger = invocation.ledger();
    let actor = require_account(ledger, invocation.author)?;
    let target = require_account(ledger, &args.beneficiary)?;
    ledger.set_authorization(&actor, &target, args.level)?;
    info!(actor = %actor.name, target = %target.name, level = %args.level, "Authorization changed");

    Ok(format!("{} now has authorization level {}.", args.beneficiary, args.level.name()))
}

pub fn list_accounts(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let ledger = invocation.ledger();
    let mut lines = vec!["| Account | Balance |".to_string(), "| --- | --- |".to_string()];
    lines.extend(
        ledger
            .list_accounts()
            .iter()
            .map(|account| format!("| {} | {} |", ledger.get_account_id(account), account.balance)),
    );
    Ok(lines.join("\n"))
}

pub fn print_money(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let args = parse_print_money(invocation.message).map_err(|_| {
        CommandError::malformed("Command formatted incorrectly. Expected format `print-money AMOUNT BENEFICIARY`.")
    })?;

    let ledger = invocation.ledger();
    let actor = require_account(ledger, invocation.author)?;
    let recipient = require_account(ledger, &args.beneficiary)?;
    if !args.amount.is_positive() {
        return Err(CommandError::Rejected("Sorry, but I can only print a positive amount.".to_string()));
    }

    ledger.print_money(&actor, &recipient, &args.amount)?;
    info!(actor = %actor.name, recipient = %recipient.name, amount = %args.amount, "Money printed");
    Ok("Money printed successfully.".to_string())
}

/// The ledger receives the total (per-tick amount times tick count).
pub fn admin_create_recurring_transfer(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let args = parse_recurring_transfer(invocation.message).map_err(|_| {
        CommandError::malformed(
            "Request formatted incorrectly. Expected \
             `admin-create-recurring-transfer AMOUNT_PER_TICK SENDER BENEFICIARY TICK_COUNT`.",
        )
    })?;
    if args.tick_count == 0 {
        return Err(CommandError::Rejected(
            "Sorry, but a recurring transfer needs at least one tick.".to_string(),
        ));
    }

    let ledger = invocation.ledger();
    let actor = require_account(ledger, invocation.author)?;
    let sender = require_account(ledger, &args.sender)?;
    let recipient = require_account(ledger, &args.beneficiary)?;

    let total = &args.amount_per_tick * BigInt::from(args.tick_count);
    let transfer = ledger.create_recurring_transfer(&actor, &sender, &recipient, &total, args.tick_count)?;
    info!(id = transfer.id(), sender = %sender.name, recipient = %recipient.name, ticks = args.tick_count, "Recurring transfer created");

    Ok(format!("Recurring transfer set up with ID `{}`.", transfer.id()))
}

fn set_frozen(invocation: &Invocation<'_>, frozen: bool) -> Result<Account, CommandError> {
    let name = parse_account_name(invocation.message).map_err(|_| {
        CommandError::malformed(format!(
            "Incorrectly formatted command; expected `{} ACCOUNT_NAME`.",
            if frozen { "admin-freeze" } else { "admin-unfreeze" }
        ))
    })?;

    let ledger = invocation.ledger();
    let actor = require_account(ledger, invocation.author)?;
    let target = require_account(ledger, &name)?;
    ledger.set_frozen(&actor, &target, frozen)?;
    info!(actor = %actor.name, target = %target.name, frozen, "Freeze state changed");
    Ok(target)
}

pub fn admin_freeze(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let target = set_frozen(invocation, true)?;
    Ok(format!("Account `{}` has been frozen.", target.name))
}

pub fn admin_unfreeze(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let target = set_frozen(invocation, false)?;
    Ok(format!("Account `{}` has been unfrozen.", target.name))
}

#[cfg(test)]
mod tests {
    use crate::account::{Account, Authorization, InMemoryLedger, RecurringTransfer};
    use crate::accounting::AccountingService;
    use crate::commands::{CommandRegistry, Dispatcher};
    use crate::crypto::{Ed25519Signatures, PrivateKey, PublicKey};
    use crate::error::LedgerError;
    use num_bigint::BigInt;
    use std::sync::Arc;

    fn setup(accounts: &[(&str, Authorization, i64)]) -> (Arc<InMemoryLedger>, Dispatcher) {
        let ledger = Arc::new(InMemoryLedger::new());
        for (name, level, balance) in accounts {
            ledger.seed_account(name, *level, &BigInt::from(*balance)).unwrap();
        }
        let dispatcher = Dispatcher::new(CommandRegistry::standard().unwrap(), ledger.clone(), Arc::new(Ed25519Signatures));
        (ledger, dispatcher)
    }

    fn balance_of(ledger: &InMemoryLedger, name: &str) -> BigInt {
        ledger.get_account(name).unwrap().balance
    }

    #[test]
    fn test_transfer() {
        let (ledger, dispatcher) = setup(&[("alice", Authorization::Citizen, 50), ("bob", Authorization::Citizen, 0)]);
        let reply = dispatcher.process("alice", "transfer 10 bob").unwrap();
        assert!(reply.starts_with("Transfer performed successfully. Proof: "));
        assert_eq!(balance_of(&ledger, "alice"), BigInt::from(40));
        assert_eq!(balance_of(&ledger, "bob"), BigInt::from(10));
    }

    #[test]
    fn test_transfer_infeasible() {
        let (ledger, dispatcher) = setup(&[("alice", Authorization::Citizen, 5), ("bob", Authorization::Citizen, 0)]);
        assert_eq!(
            dispatcher.process("alice", "transfer 10 bob").unwrap(),
            "Sorry, but I can't perform that transfer."
        );
        assert_eq!(
            dispatcher.process("alice", "transfer -3 bob").unwrap(),
            "Sorry, but I can't perform that transfer."
        );
        assert_eq!(balance_of(&ledger, "alice"), BigInt::from(5));
    }

    #[test]
    fn test_transfer_to_missing_account() {
        let (_, dispatcher) = setup(&[("alice", Authorization::Citizen, 5)]);
        assert_eq!(
            dispatcher.process("alice", "transfer 1 nobody").unwrap(),
            "Sorry, I can't process your request because `nobody` does not have an account yet."
        );
    }

    #[test]
    fn test_transfer_malformed() {
        let (_, dispatcher) = setup(&[("alice", Authorization::Citizen, 5)]);
        let reply = dispatcher.process("alice", "transfer lots bob").unwrap();
        assert!(reply.starts_with("Transfer formatted incorrectly."));
    }

    #[test]
    fn test_open_account_twice() {
        let (ledger, dispatcher) = setup(&[]);
        assert_eq!(
            dispatcher.process("carol", "open").unwrap(),
            "Hi there carol. Your account has been opened successfully. Thank you for your business."
        );
        assert!(ledger.has_account("carol"));
        assert_eq!(
            dispatcher.process("carol", "open").unwrap(),
            "Hi there carol. Looks like you already have an account. No need to open another one."
        );
    }

    #[test]
    fn test_admin_open_account() {
        let (ledger, dispatcher) = setup(&[("root", Authorization::Admin, 0), ("carol", Authorization::Citizen, 0)]);
        assert_eq!(
            dispatcher.process("root", "admin-open newacct").unwrap(),
            "Account `newacct` has been opened successfully."
        );
        assert_eq!(
            dispatcher.process("root", "admin-open newacct").unwrap(),
            "Account `newacct` already exists."
        );
        assert!(dispatcher
            .process("carol", "admin-open other")
            .unwrap()
            .contains("does not have the required authorization"));
        assert!(!ledger.has_account("other"));
    }

    #[test]
    fn test_balance() {
        let (_, dispatcher) = setup(&[("root", Authorization::Admin, 42)]);
        assert_eq!(
            dispatcher.process("root", "balance").unwrap(),
            "Hi there admin root. The balance on your account is 42. Have a great day."
        );
        assert!(dispatcher
            .process("ghost", "balance")
            .unwrap()
            .contains("you don't have an account yet"));
    }

    #[test]
    fn test_add_public_key() {
        let (ledger, dispatcher) = setup(&[("alice", Authorization::Citizen, 0)]);
        let key = PrivateKey::generate();
        let pem = key.public_key().to_pem().unwrap();
        let message = format!("add-public-key\n\n{}\n", pem);

        assert_eq!(dispatcher.process("alice", &message).unwrap(), "Public key added successfully.");
        assert_eq!(ledger.get_account("alice").unwrap().public_keys, vec![key.public_key()]);
    }

    #[test]
    fn test_add_garbage_public_key() {
        let (ledger, dispatcher) = setup(&[("alice", Authorization::Citizen, 0)]);
        let reply = dispatcher.process("alice", "add-public-key\nnot a key").unwrap();
        assert!(reply.starts_with("Incorrectly formatted key. Inner error message: "));
        assert!(ledger.get_account("alice").unwrap().public_keys.is_empty());
    }

    #[test]
    fn test_authorize() {
        let (ledger, dispatcher) = setup(&[("root", Authorization::Admin, 0), ("bob", Authorization::Citizen, 0)]);
        assert_eq!(
            dispatcher.process("root", "authorize bob developer").unwrap(),
            "bob now has authorization level DEVELOPER."
        );
        assert_eq!(ledger.get_account("bob").unwrap().authorization, Authorization::Developer);
        assert!(dispatcher
            .process("root", "authorize bob king")
            .unwrap()
            .starts_with("Authorization formatted incorrectly."));
    }

    #[test]
    fn test_list_accounts() {
        let (_, dispatcher) = setup(&[("root", Authorization::Admin, 3), ("bob", Authorization::Citizen, 7)]);
        assert_eq!(
            dispatcher.process("root", "list").unwrap(),
            "| Account | Balance |\n| --- | --- |\n| bob | 7 |\n| root | 3 |"
        );
    }

    #[test]
    fn test_print_money() {
        let (ledger, dispatcher) = setup(&[("root", Authorization::Admin, 0), ("bob", Authorization::Citizen, 0)]);
        assert_eq!(dispatcher.process("root", "print-money 100 bob").unwrap(), "Money printed successfully.");
        assert_eq!(balance_of(&ledger, "bob"), BigInt::from(100));
        assert!(dispatcher.process("root", "print-money 0 bob").unwrap().starts_with("Sorry"));
        assert_eq!(ledger.total_supply(), BigInt::from(100));
    }

    #[test]
    fn test_admin_transfer() {
        let (ledger, dispatcher) = setup(&[
            ("root", Authorization::Admin, 0),
            ("alice", Authorization::Citizen, 20),
            ("bob", Authorization::Citizen, 0),
        ]);
        let reply = dispatcher.process("root", "admin-transfer 20 alice bob").unwrap();
        assert!(reply.starts_with("Transfer performed successfully."));
        assert_eq!(balance_of(&ledger, "bob"), BigInt::from(20));
    }

    #[test]
    fn test_recurring_transfer() {
        let (ledger, dispatcher) = setup(&[
            ("root", Authorization::Admin, 0),
            ("alice", Authorization::Citizen, 30),
            ("bob", Authorization::Citizen, 0),
        ]);
        let reply = dispatcher
            .process("root", "admin-create-recurring-transfer 10 alice bob 3")
            .unwrap();
        assert!(reply.starts_with("Recurring transfer set up with ID `"));

        let pending = ledger.recurring_transfers();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].total_amount, BigInt::from(30));
        assert!(reply.contains(pending[0].id()));

        assert!(dispatcher
            .process("root", "admin-create-recurring-transfer 10 alice bob 0")
            .unwrap()
            .starts_with("Sorry"));
    }

    #[test]
    fn test_freeze_blocks_transfers() {
        let (_, dispatcher) = setup(&[
            ("root", Authorization::Admin, 0),
            ("alice", Authorization::Citizen, 20),
            ("bob", Authorization::Citizen, 0),
        ]);
        assert_eq!(dispatcher.process("root", "admin-freeze bob").unwrap(), "Account `bob` has been frozen.");
        assert_eq!(
            dispatcher.process("alice", "transfer 5 bob").unwrap(),
            "Sorry, but I can't perform that transfer."
        );
        assert_eq!(dispatcher.process("root", "admin-unfreeze bob").unwrap(), "Account `bob` has been unfrozen.");
        assert!(dispatcher
            .process("alice", "transfer 5 bob")
            .unwrap()
            .starts_with("Transfer performed successfully."));
    }

    /// Opens the account inside `has_account`, as if another message won the race.
    struct RacingLedger {
        inner: InMemoryLedger,
        contested: &'static str,
    }

    impl AccountingService for RacingLedger {
        fn has_account(&self, name: &str) -> bool {
            if name == self.contested {
                let _ = self.inner.open_account(name);
                return false;
            }
            self.inner.has_account(name)
        }

        fn get_account(&self, name: &str) -> Option<Account> {
            self.inner.get_account(name)
        }

        fn open_account(&self, name: &str) -> Result<Account, LedgerError> {
            self.inner.open_account(name)
        }

        fn get_account_authorization(&self, account: &Account) -> Authorization {
            self.inner.get_account_authorization(account)
        }

        fn set_authorization(&self, actor: &Account, target: &Account, level: Authorization) -> Result<(), LedgerError> {
            self.inner.set_authorization(actor, target, level)
        }

        fn can_transfer(&self, sender: &Account, recipient: &Account, amount: &BigInt) -> bool {
            self.inner.can_transfer(sender, recipient, amount)
        }

        fn transfer(
            &self,
            actor: &Account,
            sender: &Account,
            recipient: &Account,
            amount: &BigInt,
        ) -> Result<Option<String>, LedgerError> {
            self.inner.transfer(actor, sender, recipient, amount)
        }

        fn print_money(&self, actor: &Account, recipient: &Account, amount: &BigInt) -> Result<(), LedgerError> {
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

    fn racing_dispatcher(contested: &'static str) -> Dispatcher {
        let inner = InMemoryLedger::new();
        inner.seed_account("root", Authorization::Admin, &BigInt::from(0)).unwrap();
        let ledger = Arc::new(RacingLedger { inner, contested });
        Dispatcher::new(CommandRegistry::standard().unwrap(), ledger, Arc::new(Ed25519Signatures))
    }

    #[test]
    fn test_admin_open_lost_race_is_rejected() {
        let dispatcher = racing_dispatcher("newacct");
        assert_eq!(
            dispatcher.process("root", "admin-open newacct").unwrap(),
            "Account `newacct` already exists."
        );
    }

    #[test]
    fn test_open_lost_race_reports_existing_account() {
        let dispatcher = racing_dispatcher("carol");
        assert_eq!(
            dispatcher.process("carol", "open").unwrap(),
            "Hi there carol. Looks like you already have an account. No need to open another one."
        );
    }

    #[test]
    fn test_help_greets_author() {
        let (_, dispatcher) = setup(&[]);
        let reply = dispatcher.process("dave", "help").unwrap();
        assert!(reply.starts_with("Hi dave! Here's a list of the commands I understand:\n\n  * "));
    }
}
