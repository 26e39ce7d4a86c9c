use std::{fmt, str::FromStr};

use crate::AsterixError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Avg,
    Sum,
    Count,
    Min,
    Max,
    ArrayAgg,
}

impl AggregateFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::ArrayAgg => "ARRAY_AGG",
        }
    }

    /// Output column name for `FUNC(field)`, e.g. `avg_stars`.
    pub fn output_name(&self, field: &str) -> String {
        let field = field
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>();
        format!("{}_{}", self.name().to_ascii_lowercase(), field)
    }
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateFunc {
    type Err = AsterixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVG" => Ok(AggregateFunc::Avg),
            "SUM" => Ok(AggregateFunc::Sum),
            "COUNT" => Ok(AggregateFunc::Count),
            "MIN" => Ok(AggregateFunc::Min),
            "MAX" => Ok(AggregateFunc::Max),
            "ARRAY_AGG" => Ok(AggregateFunc::ArrayAgg),
            _ => Err(AsterixError::validation(format!("Invalid aggregate function: {}", s))),
        }
    }
}

impl TryFrom<&str> for AggregateFunc {
    type Error = AsterixError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
