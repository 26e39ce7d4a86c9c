use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use ordered_float::NotNan;
use serde_json::Value;

use crate::AsterixError;

/// A typed value that can be written into statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(NotNan<f64>),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Ordered collection, rendered with brackets.
    List(Vec<Literal>),
    /// Unordered collection, rendered with double braces.
    Multiset(Vec<Literal>),
    /// Keyed record; insertion order is kept in the rendered text.
    Object(IndexMap<String, Literal>),
}

impl Literal {
    pub fn float(value: f64) -> Result<Self, AsterixError> {
        Self::try_from(value)
    }

    pub fn list<T: Into<Literal>>(items: impl IntoIterator<Item = T>) -> Self {
        Literal::List(items.into_iter().map(Into::into).collect())
    }

    pub fn multiset<T: Into<Literal>>(items: impl IntoIterator<Item = T>) -> Self {
        Literal::Multiset(items.into_iter().map(Into::into).collect())
    }

    pub fn object<K: Into<String>, V: Into<Literal>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Literal::Object(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value as i64)
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Int(value as i64)
    }
}

impl From<NotNan<f64>> for Literal {
    fn from(value: NotNan<f64>) -> Self {
        Literal::Float(value)
    }
}

impl TryFrom<f64> for Literal {
    type Error = AsterixError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        NotNan::new(value)
            .map(Literal::Float)
            .map_err(|_| AsterixError::validation("NaN cannot be used as a literal"))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<NaiveDate> for Literal {
    fn from(value: NaiveDate) -> Self {
        Literal::Date(value)
    }
}

impl From<NaiveTime> for Literal {
    fn from(value: NaiveTime) -> Self {
        Literal::Time(value)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(value: NaiveDateTime) -> Self {
        Literal::DateTime(value)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(value: Vec<T>) -> Self {
        Literal::list(value)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}

impl TryFrom<Value> for Literal {
    type Error = AsterixError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Literal::Null),
            Value::Bool(b) => Ok(Literal::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Literal::Int(i)),
                None => match n.as_f64() {
                    Some(f) => Literal::try_from(f),
                    None => Err(AsterixError::validation(format!("unsupported number: {}", n))),
                },
            },
            Value::String(s) => Ok(Literal::String(s)),
            Value::Array(items) => items
                .into_iter()
                .map(Literal::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Literal::List),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| Literal::try_from(v).map(|v| (k, v)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Literal::Object),
        }
    }
}
