//! Command layer: grammars, registry, dispatcher and the proxy protocol

pub mod dispatch;
pub mod handlers;
pub mod help;
pub mod parse;
pub mod proxy;
pub mod registry;

pub use dispatch::{Dispatcher, Invocation, DEFAULT_MAX_PROXY_DEPTH};
pub use help::{list_commands, list_commands_as_markdown};
pub use proxy::{compose_proxy_command, ProxyEnvelope, PROXY_COMMAND, PROXY_PROTOCOL};
pub use registry::{CommandRegistry, CommandSpec, Handler};
