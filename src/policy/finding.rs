use serde::{Deserialize, Serialize};

use crate::model::{Cidr, PortSpan};

/// Severity of an exposure finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Open to the internet, but not on a risky port.
    Warn,
    /// A risky port is reachable from the internet.
    Fail,
}

impl Severity {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "warn" | "warning" => Some(Self::Warn),
            "fail" | "critical" => Some(Self::Fail),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// One flagged policy violation. Pure output: never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub group_id: String,
    pub group_name: String,
    pub port: PortSpan,
    pub cidr: Cidr,
    pub severity: Severity,
    pub reason: String,
}

/// Metadata about an exposure check, used for `list-checks` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
}
