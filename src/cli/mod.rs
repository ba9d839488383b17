pub mod keys;
pub mod proxy;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledgerbot")]
#[command(about = "Ledger bot command console", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "ledgerbot.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Talk to the bot interactively (default)
    Repl {
        /// Account to act as; defaults to the configured operator
        #[arg(long)]
        account: Option<String>,
    },
    /// Key management
    Keys {
        #[command(subcommand)]
        cmd: keys::KeysCommands,
    },
    /// Print a signed proxy message
    Proxy {
        /// Account the command will run as
        #[arg(long)]
        account: String,
        /// PEM private key file
        #[arg(long)]
        key: PathBuf,
        /// Inner command text
        #[arg(long)]
        command: String,
    },
}
