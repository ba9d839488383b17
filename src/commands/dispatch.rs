//! Message dispatcher
//!
//! Resolves the first token of a message to a registered command, enforces
//! the command's minimum authorization, runs the handler and turns every
//! recoverable failure into reply text. Only capability failures escape,
//! as [`DispatchError`].
//!
//! The dispatcher keeps no mutable state between calls; it can be shared
//! across threads behind an `Arc`.

use super::help::list_commands_as_markdown;
use super::registry::{CommandRegistry, CommandSpec};
use crate::account::Authorization;
use crate::accounting::AccountingService;
use crate::crypto::SignatureService;
use crate::error::{CommandError, DispatchError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Proxies may wrap ordinary commands but not other proxies.
pub const DEFAULT_MAX_PROXY_DEPTH: usize = 1;

/// Everything a handler may look at while running one command.
pub struct Invocation<'a> {
    /// Effective author; for proxied commands this is the proxied account
    pub author: &'a str,
    pub message: &'a str,
    /// Number of proxy envelopes already unwrapped around this message
    pub depth: usize,
    dispatcher: &'a Dispatcher,
}

impl<'a> Invocation<'a> {
    pub fn ledger(&self) -> &'a dyn AccountingService {
        self.dispatcher.ledger()
    }

    pub fn signatures(&self) -> &'a dyn SignatureService {
        self.dispatcher.signatures()
    }

    pub fn dispatcher(&self) -> &'a Dispatcher {
        self.dispatcher
    }

    /// Help listing scoped to the author's level
    pub fn help_listing(&self) -> String {
        self.dispatcher.help_for(self.author)
    }
}

pub struct Dispatcher {
    registry: CommandRegistry,
    ledger: Arc<dyn AccountingService>,
    signatures: Arc<dyn SignatureService>,
    max_proxy_depth: usize,
}

impl Dispatcher {
    pub fn new(
        registry: CommandRegistry,
        ledger: Arc<dyn AccountingService>,
        signatures: Arc<dyn SignatureService>,
    ) -> Self {
        Self {
            registry,
            ledger,
            signatures,
            max_proxy_depth: DEFAULT_MAX_PROXY_DEPTH,
        }
    }

    pub fn with_max_proxy_depth(mut self, depth: usize) -> Self {
        self.max_proxy_depth = depth;
        self
    }

    pub fn max_proxy_depth(&self) -> usize {
        self.max_proxy_depth
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &dyn AccountingService {
        self.ledger.as_ref()
    }

    pub fn signatures(&self) -> &dyn SignatureService {
        self.signatures.as_ref()
    }

    /// Process one message from `author` and produce the reply.
    pub fn process(&self, author: &str, message: &str) -> Result<String, DispatchError> {
        self.process_nested(author, message, 0)
    }

    /// Re-entry point for unwrapped proxy envelopes.
    pub(crate) fn process_nested(
        &self,
        author: &str,
        message: &str,
        depth: usize,
    ) -> Result<String, DispatchError> {
        let Some(token) = message.split_whitespace().next() else {
            return Ok(format!(
                "Hi {}! You sent me an empty message. Here's a list of commands I do understand:\n\n{}",
                author,
                self.help_for(author)
            ));
        };

        let Some(spec) = self.registry.lookup(token) else {
            debug!(author, token, "Unrecognized command");
            return Ok(format!(
                "Hi {}! I didn't quite understand your command `{}`. Here's a list of commands I do understand:\n\n{}",
                author,
                token,
                self.help_for(author)
            ));
        };

        debug!(command = spec.name, author, depth, "Dispatching command");
        let invocation = Invocation {
            author,
            message,
            depth,
            dispatcher: self,
        };
        let outcome = self
            .check_authorization(author, spec)
            .and_then(|()| (spec.handler)(&invocation));

        match outcome {
            Ok(reply) => Ok(reply),
            Err(CommandError::Ledger(e)) => Err(DispatchError::Ledger(e)),
            Err(e) => {
                debug!(command = spec.name, author, reply = %e, "Command failed");
                Ok(e.to_string())
            }
        }
    }

    /// Level of `author`, or the default level when there is no such account.
    pub fn authorization_of(&self, author: &str) -> Authorization {
        self.ledger
            .get_account(author)
            .map(|account| self.ledger.get_account_authorization(&account))
            .unwrap_or_default()
    }

    pub fn help_for(&self, author: &str) -> String {
        list_commands_as_markdown(&self.registry, self.authorization_of(author))
    }

    fn check_authorization(&self, author: &str, spec: &CommandSpec) -> Result<(), CommandError> {
        if spec.min_level <= Authorization::default() {
            return Ok(());
        }

        let permitted = self
            .ledger
            .get_account(author)
            .is_some_and(|account| self.ledger.get_account_authorization(&account).satisfies(spec.min_level));

        if permitted {
            Ok(())
        } else {
            warn!(command = spec.name, author, required = %spec.min_level, "Authorization denied");
            Err(CommandError::NotAuthorized(author.to_string()))
        }
    }
}

impl From<DispatchError> for CommandError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Ledger(e) => CommandError::Ledger(e),
        }
    }
}
