use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position of a fax in the review workflow.
///
/// `Pending` is the degenerate entry state, `Categorized` the normal one.
/// `Processed` is terminal for review transitions; only deletion leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaxStatus {
    Pending,
    Categorized,
    Approved,
    Overridden,
    Processed,
}

impl FaxStatus {
    pub const ALL: [FaxStatus; 5] = [
        Self::Pending,
        Self::Categorized,
        Self::Approved,
        Self::Overridden,
        Self::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Categorized => "categorized",
            Self::Approved => "approved",
            Self::Overridden => "overridden",
            Self::Processed => "processed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed)
    }
}

impl fmt::Display for FaxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == lower)
            .ok_or_else(|| format!("unknown fax status '{}'", s))
    }
}
