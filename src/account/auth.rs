//! Authorization levels for accounts
//!
//! Levels are totally ordered by rank: `Citizen < Admin < Developer`.
//! Every account holds exactly one level; new accounts start at `Citizen`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Authorization {
    #[default]
    Citizen,
    Admin,
    Developer,
}

impl Authorization {
    /// All levels, lowest first.
    pub const ALL: [Authorization; 3] = [
        Authorization::Citizen,
        Authorization::Admin,
        Authorization::Developer,
    ];

    /// Upper-case level name as shown in replies
    pub fn name(self) -> &'static str {
        match self {
            Authorization::Citizen => "CITIZEN",
            Authorization::Admin => "ADMIN",
            Authorization::Developer => "DEVELOPER",
        }
    }

    /// Whether an account at this level may run something requiring `required`.
    pub fn satisfies(self, required: Authorization) -> bool {
        self >= required
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid authorization level: {0}. Allowed: citizen, admin, developer")]
pub struct UnknownAuthorization(pub String);

impl FromStr for Authorization {
    type Err = UnknownAuthorization;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CITIZEN" => Ok(Authorization::Citizen),
            "ADMIN" => Ok(Authorization::Admin),
            "DEVELOPER" => Ok(Authorization::Developer),
            _ => Err(UnknownAuthorization(s.to_string())),
        }
    }
}
