use clap::Parser;
use rust_ledgerbot::cli::{self, Cli, Commands};
use rust_ledgerbot::commands::{CommandRegistry, Dispatcher};
use rust_ledgerbot::config::BotConfig;
use rust_ledgerbot::crypto::Ed25519Signatures;
use rust_ledgerbot::error::CliError;
use rust_ledgerbot::interactive;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// RUST_LOG wins over `default_level`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Keys { cmd }) => {
            init_tracing("info");
            cli::keys::handle_keys_command(cmd)
        }
        Some(Commands::Proxy { account, key, command }) => {
            init_tracing("info");
            cli::proxy::handle_proxy_command(&account, &key, &command)
        }
        Some(Commands::Repl { account }) => run_repl(&cli.config, account).await,
        None => run_repl(&cli.config, None).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_repl(config_path: &Path, account: Option<String>) -> Result<(), CliError> {
    let (config, outcome) = BotConfig::resolve(config_path);
    init_tracing(&config.bot.log_level);
    outcome.log(config_path);

    let ledger = Arc::new(config.seed_ledger()?);
    let dispatcher = Dispatcher::new(CommandRegistry::standard()?, ledger, Arc::new(Ed25519Signatures))
        .with_max_proxy_depth(config.proxy.max_depth);
    info!(commands = dispatcher.registry().len(), max_proxy_depth = dispatcher.max_proxy_depth(), "Dispatcher ready");

    let account = account.unwrap_or_else(|| config.bot.operator.clone());
    interactive::run(Arc::new(dispatcher), account).await
}
