use crate::expr::DatasetRef;

/// Dataset-to-alias bindings for one statement.
///
/// Built from the primary dataset followed by each registered join, in
/// registration order. Lookups return the first binding that names the
/// dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(DatasetRef, String)>,
}

impl AliasTable {
    pub fn new(primary: DatasetRef, alias: impl Into<String>) -> Self {
        Self { entries: vec![(primary, alias.into())] }
    }

    pub fn bind(&mut self, dataset: DatasetRef, alias: impl Into<String>) {
        self.entries.push((dataset, alias.into()));
    }

    pub fn alias_of(&self, dataset: &DatasetRef) -> Option<&str> {
        self.entries
            .iter()
            .find(|(ds, _)| ds.same_dataset(dataset))
            .map(|(_, alias)| alias.as_str())
    }

    pub fn primary_alias(&self) -> &str {
        &self.entries[0].1
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entries.iter().any(|(_, a)| a == alias)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, a)| a.as_str())
    }
}
