//! Interactive console
//!
//! Stands in for a chat transport: every message typed here is processed as
//! if `account` had sent it. `login NAME` switches identity, `exit` quits.
//! `add-public-key` and `proxy` keep reading lines until a blank one.

use crate::commands::{Dispatcher, PROXY_COMMAND};
use crate::error::CliError;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

const MULTILINE_COMMANDS: [&str; 2] = ["add-public-key", PROXY_COMMAND];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplAction {
    Exit,
    Login(String),
    /// First line of a message; `true` when more lines follow
    Message(String, bool),
}

pub fn parse_line(line: &str) -> ReplAction {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some("exit"), None, _) => ReplAction::Exit,
        (Some("login"), Some(name), None) => ReplAction::Login(name.to_string()),
        (Some(first), _, _) => ReplAction::Message(line.to_string(), MULTILINE_COMMANDS.contains(&first)),
        (None, _, _) => ReplAction::Message(String::new(), false),
    }
}

/// Run one message on the blocking pool and return the reply.
pub async fn submit(dispatcher: Arc<Dispatcher>, author: String, message: String) -> Result<String, CliError> {
    let reply = tokio::task::spawn_blocking(move || dispatcher.process(&author, &message)).await??;
    Ok(reply)
}

pub async fn run(dispatcher: Arc<Dispatcher>, mut account: String) -> Result<(), CliError> {
    println!("=== Ledger Bot ===");
    println!("Logged in as '{}'. Type `help` for commands, `login NAME` to switch, `exit` to quit.", account);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", account);
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let message = match parse_line(&line) {
            ReplAction::Exit => break,
            ReplAction::Login(name) => {
                println!("Now acting as '{}'.", name);
                account = name;
                continue;
            }
            ReplAction::Message(first, false) => first,
            ReplAction::Message(mut message, true) => {
                while let Some(next) = lines.next_line().await? {
                    if next.trim().is_empty() {
                        break;
                    }
                    message.push('\n');
                    message.push_str(&next);
                }
                message
            }
        };

        match submit(dispatcher.clone(), account.clone(), message).await {
            Ok(reply) => println!("{}\n", reply),
            Err(e) => {
                error!(author = %account, error = %e, "Message processing failed");
                println!("Sorry, something went wrong while processing that message.\n");
            }
        }
    }

    println!("Session ended.");
    Ok(())
}
