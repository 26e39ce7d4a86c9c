use crate::expr::{DatasetRef, Identifier};
use crate::AsterixError;

/// `JOIN <dataset> <right_alias> ON <left_alias>.<left_key> = <right_alias>.<right_key>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub dataset: DatasetRef,
    pub left_alias: String,
    pub right_alias: String,
    pub left_key: String,
    pub right_key: String,
}

impl JoinSpec {
    pub fn new(
        dataset: DatasetRef,
        left_alias: &str,
        right_alias: &str,
        left_key: &str,
        right_key: &str,
    ) -> Result<Self, AsterixError> {
        Identifier::validate(left_alias, "alias")?;
        Identifier::validate(right_alias, "alias")?;
        Identifier::validate_path(left_key)?;
        Identifier::validate_path(right_key)?;

        Ok(Self {
            dataset,
            left_alias: left_alias.to_string(),
            right_alias: right_alias.to_string(),
            left_key: left_key.to_string(),
            right_key: right_key.to_string(),
        })
    }

    /// The namespace is selected once with `USE`, so only the local name is
    /// written here.
    pub fn render(&self) -> String {
        format!(
            "JOIN {} {} ON {}.{} = {}.{}",
            self.dataset.name, self.right_alias, self.left_alias, self.left_key, self.right_alias, self.right_key
        )
    }
}
