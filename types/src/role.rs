use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who is looking at the data.
///
/// The scan lifecycle is role-agnostic; roles only decide which views are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Citizen,
    Inspector,
}

#[derive(Debug, Error)]
#[error("unknown role {0:?} (expected citizen or inspector)")]
pub struct UnknownRoleError(pub String);

/// A view or action a role may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Personal overview with verified count and authentic/flagged split.
    Overview,
    /// Start a new scan session.
    Scan,
    /// Personal history list, newest first.
    Cabinet,
    /// Per-city breakdown of field reports.
    Markets,
    /// Aggregate counts across all reports.
    Analytics,
    /// Generated action plan over recent reports.
    PolicyNarrative,
}

const CITIZEN: &[Capability] = &[Capability::Overview, Capability::Scan, Capability::Cabinet];
const INSPECTOR: &[Capability] = &[
    Capability::Markets,
    Capability::Analytics,
    Capability::PolicyNarrative,
];

impl Role {
    #[must_use]
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Citizen => CITIZEN,
            Role::Inspector => INSPECTOR,
        }
    }

    #[must_use]
    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// First view shown after switching to this role.
    #[must_use]
    pub const fn landing(self) -> Capability {
        self.capabilities()[0]
    }

    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Role::Citizen => Role::Inspector,
            Role::Inspector => Role::Citizen,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Inspector => "inspector",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "citizen" => Ok(Role::Citizen),
            "inspector" | "admin" => Ok(Role::Inspector),
            _ => Err(UnknownRoleError(trimmed.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
