use super::keys::load_private_key;
use crate::commands::compose_proxy_command;
use crate::crypto::Ed25519Signatures;
use crate::error::CliError;
use std::path::Path;

/// Sign `command` with the key at `key_path` and print the proxy message.
pub fn handle_proxy_command(account: &str, key_path: &Path, command: &str) -> Result<(), CliError> {
    let key = load_private_key(key_path)?;
    print!("{}", compose_proxy_command(account, &key, command, &Ed25519Signatures));
    Ok(())
}
