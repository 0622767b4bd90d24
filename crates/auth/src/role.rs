use core::str::FromStr;

use serde::{Deserialize, Serialize};

use eximhub_core::DomainError;

/// Marketplace capability of an actor.
///
/// An actor holds exactly one role. Exporters list products; importers reserve
/// stock from them. The set is closed on purpose: policy checks match on the
/// variant instead of comparing strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Exporter,
    Importer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Exporter => "exporter",
            Role::Importer => "importer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exporter" => Ok(Role::Exporter),
            "importer" => Ok(Role::Importer),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}
