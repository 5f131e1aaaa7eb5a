/// Account roles
///
/// A closed set. Unknown role strings are rejected wherever they are parsed:
/// inside token claims (serde) and in account rows (`FromStr`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Collaborator,
    Citizen,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Collaborator => "collaborator",
            Role::Citizen => "citizen",
        }
    }

    /// Admin passes every role check.
    pub fn is_superuser(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "collaborator" => Ok(Role::Collaborator),
            "citizen" => Ok(Role::Citizen),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
