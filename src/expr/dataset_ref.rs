use std::fmt;

use crate::{expr::{Attribute, Identifier}, AsterixError};

/// A dataset named by an optional namespace (dataverse) and a local name.
///
/// Two references are the same dataset when their local names match and their
/// namespaces match, an absent namespace matching any namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRef {
    pub namespace: Option<String>,
    pub name: String,
}

impl DatasetRef {
    pub fn new(namespace: Option<&str>, name: &str) -> Result<Self, AsterixError> {
        if let Some(ns) = namespace {
            Identifier::validate(ns, "namespace")?;
        }
        Identifier::validate(name, "dataset name")?;
        Ok(Self { namespace: namespace.map(str::to_string), name: name.to_string() })
    }

    /// Parse `name` or `namespace.name`.
    pub fn parse(text: &str) -> Result<Self, AsterixError> {
        let parts = text.split('.').collect::<Vec<_>>();
        match parts.as_slice() {
            [name] => Self::new(None, name),
            [namespace, name] => Self::new(Some(namespace), name),
            _ => Err(AsterixError::validation(format!("Invalid dataset reference: '{}'", text))),
        }
    }

    pub fn same_dataset(&self, other: &DatasetRef) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.namespace, &other.namespace) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Attribute of this dataset. The path is kept as given; it is validated
    /// by the operations that need a plain field path.
    pub fn attr(&self, path: &str) -> Attribute {
        Attribute::new(self.clone(), path)
    }
}

impl TryFrom<&str> for DatasetRef {
    type Error = AsterixError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DatasetRef::parse(value)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}
