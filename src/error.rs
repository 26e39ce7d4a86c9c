use std::fmt;

use serde::{Deserialize, Serialize};

/// One diagnostic entry as reported by the query service in its `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiagnostic {
    #[serde(default)]
    pub code: Option<i64>,
    pub msg: String,
}

impl fmt::Display for ServiceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.msg),
            None => f.write_str(&self.msg),
        }
    }
}

fn join_diagnostics(errors: &[ServiceDiagnostic]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

fn handle_suffix(handle: &Option<String>) -> String {
    handle.as_ref().map_or(String::new(), |h| format!("\nHandle: {}", h))
}

/// Coarse classification of an [`AsterixError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Protocol,
    Remote,
    Incomplete,
    Interface,
}

#[derive(Debug, thiserror::Error)]
pub enum AsterixError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection failed after {retries} retries: {message}")]
    ConnectionFailed { retries: u32, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request errored with status code {status}: {excerpt}")]
    HttpStatus { status: u16, excerpt: String },

    #[error("Failed to decode JSON response: {message}\n{excerpt}")]
    Decode { message: String, excerpt: String },

    #[error("Protocol error: {message}{}", handle_suffix(.handle))]
    Protocol { message: String, handle: Option<String> },

    #[error("Query failed with status '{status}': {}", join_diagnostics(.errors))]
    Remote { status: String, errors: Vec<ServiceDiagnostic> },

    #[error("Async query did not complete within {attempts} status checks\nHandle: {handle}")]
    NotCompleted { attempts: u32, handle: String },

    #[error("Interface error: {0}")]
    Interface(String),

    #[error("Failed to execute query: {source}\nQuery: {statement}{}", handle_suffix(.handle))]
    Query {
        statement: String,
        handle: Option<String>,
        #[source]
        source: Box<AsterixError>,
    },
}

pub type Result<T, E = AsterixError> = std::result::Result<T, E>;

impl AsterixError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn protocol(message: impl Into<String>, handle: Option<&str>) -> Self {
        Self::Protocol { message: message.into(), handle: handle.map(str::to_string) }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ConnectionFailed { .. } | Self::Request(_) | Self::HttpStatus { .. } => ErrorKind::Transport,
            Self::Decode { .. } | Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::NotCompleted { .. } => ErrorKind::Incomplete,
            Self::Interface(_) => ErrorKind::Interface,
            Self::Query { source, .. } => source.kind(),
        }
    }

    /// Only connection-level faults are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } => true,
            Self::Query { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Statement text attached to this error, if it went through execution.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Query { statement, .. } => Some(statement),
            _ => None,
        }
    }

    pub fn handle(&self) -> Option<&str> {
        match self {
            Self::Protocol { handle, .. } => handle.as_deref(),
            Self::NotCompleted { handle, .. } => Some(handle),
            Self::Query { handle, source, .. } => handle.as_deref().or_else(|| source.handle()),
            _ => None,
        }
    }

    /// Wrap this error with the statement that produced it. Already wrapped
    /// errors are returned untouched.
    pub fn with_statement(self, statement: &str, handle: Option<&str>) -> Self {
        match self {
            Self::Query { .. } => self,
            other => {
                let handle = handle.map(str::to_string).or_else(|| other.handle().map(str::to_string));
                Self::Query { statement: statement.to_string(), handle, source: Box::new(other) }
            }
        }
    }
}
