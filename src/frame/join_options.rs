/// Keys and aliases for [`QueryFrame::join`](crate::frame::QueryFrame::join).
///
/// Either `on` (same key on both sides) or both `left_on` and `right_on` must
/// be set. The right alias defaults to `r<join index>`; the left alias
/// defaults to the primary alias, and naming an unbound left alias renames
/// the primary alias.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinOptions {
    pub on: Option<String>,
    pub left_on: Option<String>,
    pub right_on: Option<String>,
    pub left_alias: Option<String>,
    pub right_alias: Option<String>,
}

impl JoinOptions {
    pub fn on(key: &str) -> Self {
        Self { on: Some(key.to_string()), ..Self::default() }
    }

    pub fn keys(left_on: &str, right_on: &str) -> Self {
        Self { left_on: Some(left_on.to_string()), right_on: Some(right_on.to_string()), ..Self::default() }
    }

    pub fn with_left_alias(mut self, alias: &str) -> Self {
        self.left_alias = Some(alias.to_string());
        self
    }

    pub fn with_right_alias(mut self, alias: &str) -> Self {
        self.right_alias = Some(alias.to_string());
        self
    }

    pub(crate) fn resolve_keys(&self) -> Option<(&str, &str)> {
        match (&self.on, &self.left_on, &self.right_on) {
            (Some(key), _, _) => Some((key, key)),
            (None, Some(left), Some(right)) => Some((left, right)),
            _ => None,
        }
    }
}
