//! Help listings scoped to an authorization level

use super::registry::CommandRegistry;
use crate::account::Authorization;

/// One line per visible command, sorted by command name.
pub fn list_commands(registry: &CommandRegistry, level: Authorization) -> Vec<String> {
    registry
        .list_visible_to(level)
        .into_iter()
        .map(|spec| format!("`{}` &ndash; {}", spec.usage, spec.description))
        .collect()
}

pub fn list_commands_as_markdown(registry: &CommandRegistry, level: Authorization) -> String {
    list_commands(registry, level)
        .iter()
        .map(|item| format!("  * {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}
