use crate::{execution::Cursor, AsterixError};

/// Anything that can hand out a usable cursor: a single connection, or a pool
/// acquiring one.
pub trait CursorProvider: Send + Sync {
    fn cursor(&self) -> Result<Cursor, AsterixError>;
}
