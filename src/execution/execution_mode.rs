use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::AsterixError;

/// How the service runs a statement and hands back its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Results come back in the submit reply.
    #[default]
    Immediate,
    /// The submit reply carries a result handle to fetch once.
    Deferred,
    /// The submit reply carries a status handle to poll until success.
    Async,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Immediate => "immediate",
            ExecutionMode::Deferred => "deferred",
            ExecutionMode::Async => "async",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = AsterixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "immediate" => Ok(ExecutionMode::Immediate),
            "deferred" => Ok(ExecutionMode::Deferred),
            "async" => Ok(ExecutionMode::Async),
            _ => Err(AsterixError::validation(format!("Invalid mode: {}", s))),
        }
    }
}
