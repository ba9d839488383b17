use thiserror::Error;

/// Recoverable failure of a single command.
///
/// The `Display` text of every variant except `Ledger` is the reply sent back
/// to the author. `Ledger` wraps a capability failure and is never shown.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Malformed(String),
    #[error("Sorry, I can't process your request because `{0}` does not have an account yet.")]
    NoAccount(String),
    #[error("Sorry, I can't process your request because `{0}` does not have the required authorization.")]
    NotAuthorized(String),
    #[error("Cannot execute command by proxy because the signature is invalid.")]
    InvalidSignature,
    #[error("Sorry, but I can't perform that transfer.")]
    TransferInfeasible,
    #[error("{0}")]
    Rejected(String),
    #[error("Cannot execute command by proxy because proxies may only be nested {0} level(s) deep.")]
    ProxyDepthExceeded(usize),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl CommandError {
    pub fn malformed(text: impl Into<String>) -> Self {
        CommandError::Malformed(text.into())
    }

    /// Whether this error becomes a reply instead of escaping the dispatcher.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CommandError::Ledger(_))
    }
}

/// Failure reported by an accounting service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),
    #[error("Transfer rejected: {0}")]
    TransferRejected(String),
    #[error("Invalid tick count: {0}")]
    InvalidTickCount(u64),
    #[error("Account {0} may not perform this operation")]
    Unauthorized(String),
}

/// Unclassified failure escaping `Dispatcher::process`.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Ledger failure: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid key encoding: {0}")]
pub struct KeyFormatError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command `{0}` is already registered")]
    DuplicateCommand(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Failure of an operator CLI command.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Key(#[from] KeyFormatError),
    #[error("Refusing to overwrite existing file {0}")]
    FileExists(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("Could not seed ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Message task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
