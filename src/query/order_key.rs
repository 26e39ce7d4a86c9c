#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub key: String,
    pub descending: bool,
}

impl OrderKey {
    pub fn new(key: impl Into<String>, descending: bool) -> Self {
        Self { key: key.into(), descending }
    }

    pub fn direction(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }
}
