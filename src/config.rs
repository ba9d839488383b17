use crate::account::{Authorization, InMemoryLedger};
use crate::commands::DEFAULT_MAX_PROXY_DEPTH;
use crate::error::{ConfigError, LedgerError};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub bot: BotSection,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BotSection {
    /// Account the REPL acts as until `login` switches it
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_operator() -> String {
    "operator".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            operator: default_operator(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProxyConfig {
    /// How many proxy envelopes may be unwrapped for one message
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_PROXY_DEPTH
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Accounts created when the in-memory ledger boots
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LedgerConfig {
    #[serde(default = "default_admins")]
    pub admins: Vec<String>,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub initial_balance: u64,
}

fn default_admins() -> Vec<String> {
    vec![default_operator()]
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admins: default_admins(),
            developers: vec![],
            initial_balance: 0,
        }
    }
}

/// How [`BotConfig::resolve`] arrived at its config
#[derive(Debug)]
pub enum ConfigOutcome {
    Loaded,
    Created,
    CreateFailed(ConfigError),
    /// The file exists but could not be used
    Fallback(ConfigError),
}

impl ConfigOutcome {
    pub fn log(&self, path: &Path) {
        match self {
            ConfigOutcome::Loaded => info!(path = %path.display(), "Config loaded"),
            ConfigOutcome::Created => info!(path = %path.display(), "Config file not found, created default"),
            ConfigOutcome::CreateFailed(e) => {
                warn!(path = %path.display(), error = %e, "Config file not found, could not write default")
            }
            ConfigOutcome::Fallback(e) => warn!(path = %path.display(), error = %e, "Bad config, using defaults"),
        }
    }
}

impl BotConfig {
    /// Strict load; any read or parse failure is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load `path`, falling back to defaults. A missing file is created with
    /// the defaults. Nothing is logged; see [`ConfigOutcome::log`].
    pub fn resolve(path: impl AsRef<Path>) -> (Self, ConfigOutcome) {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            let outcome = match config.save(path) {
                Ok(()) => ConfigOutcome::Created,
                Err(e) => ConfigOutcome::CreateFailed(e),
            };
            return (config, outcome);
        }

        match Self::load(path) {
            Ok(config) => (config, ConfigOutcome::Loaded),
            Err(e) => (Self::default(), ConfigOutcome::Fallback(e)),
        }
    }

    /// [`BotConfig::resolve`], logging the outcome right away.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let (config, outcome) = Self::resolve(&path);
        outcome.log(path.as_ref());
        config
    }

    /// Build a ledger holding the configured admin and developer accounts.
    ///
    /// An account listed in both sections gets the higher level.
    pub fn seed_ledger(&self) -> Result<InMemoryLedger, LedgerError> {
        let ledger = InMemoryLedger::new();
        let balance = BigInt::from(self.ledger.initial_balance);

        for name in &self.ledger.developers {
            ledger.seed_account(name, Authorization::Developer, &balance)?;
        }
        for name in &self.ledger.admins {
            if self.ledger.developers.contains(name) {
                continue;
            }
            ledger.seed_account(name, Authorization::Admin, &balance)?;
        }
        Ok(ledger)
    }
}
