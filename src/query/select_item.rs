/// One projection entry: either a bare field/expression or `expr AS alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub text: String,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let upper = text.to_ascii_uppercase();
        let alias = upper
            .rfind(" AS ")
            .map(|pos| text[pos + 4..].trim().to_string())
            .filter(|alias| !alias.is_empty());

        Self { text: text.to_string(), alias }
    }
}

impl From<&str> for SelectItem {
    fn from(value: &str) -> Self {
        SelectItem::parse(value)
    }
}

impl From<String> for SelectItem {
    fn from(value: String) -> Self {
        SelectItem::parse(&value)
    }
}
