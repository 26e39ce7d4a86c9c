use serde_json::{Map, Value};

use crate::execution::Row;

pub const SCALAR_KEY: &str = "value";

/// Brings every reply shape to a sequence of keyed records.
pub struct ResultNormalizer;

impl ResultNormalizer {
    /// - absent or null: no rows
    /// - a sequence: one row per item
    /// - a record: one row
    /// - a scalar: one `{"value": x}` row
    pub fn normalize(results: Option<Value>) -> Vec<Row> {
        match results {
            None | Some(Value::Null) => vec![],
            Some(Value::Array(items)) => items.into_iter().map(Self::to_row).collect(),
            Some(other) => vec![Self::to_row(other)],
        }
    }

    pub fn to_row(item: Value) -> Row {
        match item {
            Value::Object(map) => Row(map),
            other => {
                let mut map = Map::new();
                map.insert(SCALAR_KEY.to_string(), other);
                Row(map)
            },
        }
    }
}
