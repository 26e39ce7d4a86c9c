use once_cell::sync::Lazy;
use regex::Regex;

use crate::AsterixError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

/// Syntax checks for names that end up unquoted in statement text.
pub struct Identifier;

impl Identifier {
    pub fn is_valid(name: &str) -> bool {
        IDENTIFIER.is_match(name)
    }

    pub fn validate(name: &str, what: &str) -> Result<(), AsterixError> {
        if Self::is_valid(name) {
            return Ok(());
        }
        Err(AsterixError::validation(format!("Invalid {}: '{}'", what, name)))
    }

    /// A field path is one or more identifiers separated by dots.
    pub fn validate_path(path: &str) -> Result<(), AsterixError> {
        if !path.is_empty() && path.split('.').all(Self::is_valid) {
            return Ok(());
        }
        Err(AsterixError::validation(format!("Invalid field name: '{}'", path)))
    }
}
