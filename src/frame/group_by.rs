use crate::{frame::QueryFrame, AsterixError};

/// Grouping keys waiting for their aggregates.
#[derive(Debug)]
pub struct GroupBy {
    frame: QueryFrame,
    keys: Vec<String>,
}

impl GroupBy {
    pub(crate) fn new(frame: QueryFrame, keys: Vec<String>) -> Self {
        Self { frame, keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Apply `(field, function)` aggregates over the grouping keys.
    pub fn agg<'a>(self, aggregates: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<QueryFrame, AsterixError> {
        let keys = self.keys.iter().map(String::as_str).collect::<Vec<_>>();
        self.frame.aggregate(aggregates, &keys)
    }
}
