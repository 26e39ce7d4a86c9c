use crate::expr::Identifier;
use crate::AsterixError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnnestSource {
    /// A field of the dataset bound to `alias`.
    Field { alias: String, path: String },
    /// A caller-supplied expression, already alias-qualified.
    Expression(String),
}

/// `UNNEST <source> AS <name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnnestSpec {
    pub source: UnnestSource,
    pub name: String,
}

impl UnnestSpec {
    pub fn field(alias: &str, path: &str, name: &str) -> Result<Self, AsterixError> {
        Identifier::validate(alias, "alias")?;
        Identifier::validate_path(path)?;
        Identifier::validate(name, "alias")?;
        Ok(Self {
            source: UnnestSource::Field { alias: alias.to_string(), path: path.to_string() },
            name: name.to_string(),
        })
    }

    pub fn expression(expression: &str, name: &str) -> Result<Self, AsterixError> {
        if expression.trim().is_empty() {
            return Err(AsterixError::validation("Unnest expression must not be empty"));
        }
        Identifier::validate(name, "alias")?;
        Ok(Self { source: UnnestSource::Expression(expression.trim().to_string()), name: name.to_string() })
    }

    pub fn render(&self) -> String {
        match &self.source {
            UnnestSource::Field { alias, path } => format!("UNNEST {}.{} AS {}", alias, path, self.name),
            UnnestSource::Expression(expr) => format!("UNNEST {} AS {}", expr, self.name),
        }
    }
}
