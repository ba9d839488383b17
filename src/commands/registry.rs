//! Command registry
//!
//! An immutable table from command token to [`CommandSpec`]. Build it once
//! at startup and hand it to the dispatcher.

use super::dispatch::Invocation;
use super::handlers;
use super::proxy::{self, PROXY_COMMAND};
use crate::account::Authorization;
use crate::error::{CommandError, RegistryError};
use std::collections::BTreeMap;

/// Runs one command and produces the reply text.
pub type Handler = fn(&Invocation<'_>) -> Result<String, CommandError>;

#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub handler: Handler,
    pub min_level: Authorization,
}

impl CommandSpec {
    /// A command anyone may run
    pub const fn new(
        name: &'static str,
        usage: &'static str,
        description: &'static str,
        handler: Handler,
    ) -> Self {
        Self {
            name,
            usage,
            description,
            handler,
            min_level: Authorization::Citizen,
        }
    }

    pub const fn requires(mut self, level: Authorization) -> Self {
        self.min_level = level;
        self
    }

    pub fn is_visible_to(&self, level: Authorization) -> bool {
        level.satisfies(self.min_level)
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("min_level", &self.min_level)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. Names are unique.
    pub fn register(&mut self, spec: CommandSpec) -> Result<&mut Self, RegistryError> {
        if self.commands.contains_key(spec.name) {
            return Err(RegistryError::DuplicateCommand(spec.name.to_string()));
        }
        self.commands.insert(spec.name, spec);
        Ok(self)
    }

    pub fn from_specs(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// The full command set of the bot
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_specs(standard_commands())
    }

    pub fn lookup(&self, token: &str) -> Option<&CommandSpec> {
        self.commands.get(token)
    }

    /// Commands `level` may run, sorted by name
    pub fn list_visible_to(&self, level: Authorization) -> Vec<&CommandSpec> {
        self.commands
            .values()
            .filter(|spec| spec.is_visible_to(level))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn standard_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("help", "help", "prints a help message.", handlers::help),
        CommandSpec::new(
            "transfer",
            "transfer AMOUNT BENEFICIARY",
            "transfers AMOUNT to user BENEFICIARY's account.",
            handlers::transfer,
        ),
        CommandSpec::new("open", "open", "opens a new account.", handlers::open_account),
        CommandSpec::new(
            "balance",
            "balance",
            "prints the balance on your account.",
            handlers::balance,
        ),
        CommandSpec::new(
            "add-public-key",
            "add-public-key",
            "associates a public key with your account. The public key should be encoded as \
             the contents of a PEM file that is placed on a line after the command itself.",
            handlers::add_public_key,
        ),
        CommandSpec::new(
            PROXY_COMMAND,
            "proxy dsa PROXIED_ACCOUNT SIGNATURE",
            "makes PROXIED_ACCOUNT perform the action described in the remainder of the message \
             (starting on the next line). SIGNATURE must be a base64-encoded signature of the \
             SHA-512 hash of the remainder of the message, made with a key whose public key is \
             associated with the proxied account. This command allows a user or application to \
             safely perform actions on an account holder's behalf.",
            proxy::process_proxy_command,
        ),
        CommandSpec::new(
            "authorize",
            "authorize ACCOUNT citizen|admin|developer",
            "sets an account's authorization.",
            handlers::authorize,
        )
        .requires(Authorization::Admin),
        CommandSpec::new(
            "admin-transfer",
            "admin-transfer AMOUNT SENDER BENEFICIARY",
            "transfers AMOUNT from SENDER to BENEFICIARY.",
            handlers::admin_transfer,
        )
        .requires(Authorization::Admin),
        CommandSpec::new(
            "list",
            "list",
            "lists all accounts and the balance on the accounts.",
            handlers::list_accounts,
        )
        .requires(Authorization::Admin),
        CommandSpec::new(
            "print-money",
            "print-money AMOUNT BENEFICIARY",
            "generates AMOUNT money and deposits it in BENEFICIARY's account.",
            handlers::print_money,
        )
        .requires(Authorization::Admin),
        CommandSpec::new(
            "admin-create-recurring-transfer",
            "admin-create-recurring-transfer AMOUNT_PER_TICK SENDER BENEFICIARY TICK_COUNT",
            "creates a transfer that will transfer AMOUNT_PER_TICK from SENDER to BENEFICIARY \
             every tick, for TICK_COUNT ticks.",
            handlers::admin_create_recurring_transfer,
        )
        .requires(Authorization::Admin),
        CommandSpec::new(
            "admin-open",
            "admin-open ACCOUNT_NAME",
            "opens a new account with a particular name. If a user has ACCOUNT_NAME, then the \
             newly created account will become that user's account.",
            handlers::admin_open_account,
        )
        .requires(Authorization::Admin),
        CommandSpec::new(
            "admin-freeze",
            "admin-freeze ACCOUNT_NAME",
            "freezes an account. Frozen accounts can neither send nor receive transfers.",
            handlers::admin_freeze,
        )
        .requires(Authorization::Admin),
        CommandSpec::new(
            "admin-unfreeze",
            "admin-unfreeze ACCOUNT_NAME",
            "unfreezes a frozen account.",
            handlers::admin_unfreeze,
        )
        .requires(Authorization::Admin),
    ]
}
