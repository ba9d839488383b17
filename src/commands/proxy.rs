//! Signed delegation ("proxy") protocol
//!
//! A proxy message lets one party run a command as another account, provided
//! the command carries a signature from a key that account registered:
//!
//! ```text
//! proxy dsa PROXIED_ACCOUNT BASE64_SIGNATURE
//! <inner command, possibly spanning several lines>
//! ```
//!
//! The signature covers the SHA-512 digest of the inner command exactly as it
//! appears after the header line, minus one trailing line terminator. Keys
//! are tried in registration order and the first one that verifies wins.
//! After verification the dispatcher re-enters with the proxied account as
//! author, bounded by the dispatcher's maximum proxy depth.

use super::dispatch::Invocation;
use super::parse::split_exact;
use crate::account::Account;
use crate::accounting::AccountingService;
use crate::crypto::{PrivateKey, SignatureService};
use crate::error::CommandError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{info, warn};

pub const PROXY_COMMAND: &str = "proxy";

/// The only accepted protocol identifier
pub const PROXY_PROTOCOL: &str = "dsa";

const ENVELOPE_USAGE: &str =
    "Invalid formatting; expected `proxy dsa PROXIED_ACCOUNT SIGNATURE` followed by another command on the next line.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEnvelope {
    pub proxied_account: String,
    pub signature: Vec<u8>,
    /// Signed inner command, verbatim
    pub command: String,
}

/// Drop a single trailing `\n` or `\r\n`.
pub fn strip_line_terminator(body: &str) -> &str {
    body.strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
}

impl ProxyEnvelope {
    /// Split a proxy message into header fields and inner command.
    pub fn decode(message: &str) -> Result<Self, CommandError> {
        let (header, body) = message
            .split_once('\n')
            .ok_or_else(|| CommandError::malformed(ENVELOPE_USAGE))?;

        let command = strip_line_terminator(body);
        if command.trim().is_empty() {
            return Err(CommandError::malformed(ENVELOPE_USAGE));
        }

        let [marker, protocol, proxied_account, encoded_signature] =
            split_exact::<4>(header).map_err(|_| CommandError::malformed(ENVELOPE_USAGE))?;
        if marker != PROXY_COMMAND || protocol != PROXY_PROTOCOL {
            return Err(CommandError::malformed(ENVELOPE_USAGE));
        }

        let signature = BASE64.decode(encoded_signature).map_err(|e| {
            CommandError::malformed(format!("{} The signature is not valid base64: {}.", ENVELOPE_USAGE, e))
        })?;

        Ok(ProxyEnvelope {
            proxied_account: proxied_account.to_string(),
            signature,
            command: command.to_string(),
        })
    }

    /// Render the envelope as a proxy message.
    pub fn encode(&self) -> String {
        format!(
            "{} {} {} {}\n{}\n",
            PROXY_COMMAND,
            PROXY_PROTOCOL,
            self.proxied_account,
            BASE64.encode(&self.signature),
            self.command
        )
    }

    /// Check the signature against the proxied account's registered keys.
    ///
    /// Returns the proxied account on success. Failure never says which keys
    /// were tried.
    pub fn verify(
        &self,
        ledger: &dyn AccountingService,
        signatures: &dyn SignatureService,
    ) -> Result<Account, CommandError> {
        let account = ledger
            .get_account(&self.proxied_account)
            .ok_or_else(|| CommandError::NoAccount(self.proxied_account.clone()))?;

        let digest = signatures.hash(self.command.as_bytes());
        let verified = account
            .public_keys
            .iter()
            .any(|key| signatures.verify(&digest, &self.signature, key));

        if verified {
            Ok(account)
        } else {
            Err(CommandError::InvalidSignature)
        }
    }
}

/// Build a signed proxy message running `command` as `proxied_account`.
///
/// Surrounding whitespace of `command` is trimmed before signing.
pub fn compose_proxy_command(
    proxied_account: &str,
    key: &PrivateKey,
    command: &str,
    signatures: &dyn SignatureService,
) -> String {
    let command = command.trim();
    let digest = signatures.hash(command.as_bytes());
    ProxyEnvelope {
        proxied_account: proxied_account.to_string(),
        signature: signatures.sign(&digest, key),
        command: command.to_string(),
    }
    .encode()
}

/// Handler for the `proxy` command.
pub fn process_proxy_command(invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let max_depth = invocation.dispatcher().max_proxy_depth();
    if invocation.depth >= max_depth {
        warn!(author = invocation.author, depth = invocation.depth, "Proxy nesting limit reached");
        return Err(CommandError::ProxyDepthExceeded(max_depth));
    }

    let envelope = ProxyEnvelope::decode(invocation.message).inspect_err(|_| {
        warn!(author = invocation.author, "Malformed proxy envelope");
    })?;

    let account = envelope
        .verify(invocation.ledger(), invocation.signatures())
        .inspect_err(|e| {
            warn!(author = invocation.author, proxied = %envelope.proxied_account, reason = %e, "Proxy verification failed");
        })?;

    info!(author = invocation.author, proxied = %account.name, "Executing command by proxy");
    let reply = invocation
        .dispatcher()
        .process_nested(&account.name, &envelope.command, invocation.depth + 1)?;
    Ok(reply)
}
