use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// City a scan was performed in.
///
/// The set is closed; the analysis prompt and the dashboard both rely on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Locale {
    #[default]
    Karachi,
    Lahore,
    Islamabad,
    Peshawar,
}

#[derive(Debug, Error)]
#[error("unknown city {0:?} (expected Karachi, Lahore, Islamabad or Peshawar)")]
pub struct UnknownLocaleError(pub String);

impl Locale {
    pub const ALL: [Locale; 4] = [
        Locale::Karachi,
        Locale::Lahore,
        Locale::Islamabad,
        Locale::Peshawar,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Locale::Karachi => "Karachi",
            Locale::Lahore => "Lahore",
            Locale::Islamabad => "Islamabad",
            Locale::Peshawar => "Peshawar",
        }
    }
}

impl FromStr for Locale {
    type Err = UnknownLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Locale::ALL
            .into_iter()
            .find(|locale| locale.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLocaleError(trimmed.to_string()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
