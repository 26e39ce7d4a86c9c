use crate::{expr::{AliasTable, Identifier}, AsterixError};

/// Names visible to GROUP BY / ORDER BY keys and select items.
pub struct KeyScope<'a> {
    pub aliases: &'a AliasTable,
    /// Output names assigned with `AS`, including aggregate outputs.
    pub output_names: Vec<&'a str>,
    /// Names bound by UNNEST.
    pub unnest_names: Vec<&'a str>,
}

/// Turns a caller-supplied key into statement text.
pub struct KeyResolver;

impl KeyResolver {
    /// Resolve a GROUP BY or ORDER BY key. In order:
    /// 1. an output name from `... AS name` is used bare;
    /// 2. an UNNEST name is used bare;
    /// 3. a function call or an already qualified key is used verbatim;
    /// 4. anything else is qualified with the primary alias.
    ///
    /// Keys falling through to rules 3 and 4 must be function calls or field
    /// paths; anything else is a Validation error.
    pub fn resolve(key: &str, scope: &KeyScope) -> Result<String, AsterixError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AsterixError::validation("empty GROUP BY or ORDER BY key"));
        }
        if scope.output_names.iter().any(|name| *name == key) || scope.unnest_names.iter().any(|name| *name == key) {
            return Ok(key.to_string());
        }
        if !key.contains('(') {
            Identifier::validate_path(key)?;
        }
        Ok(Self::resolve_field(key, scope))
    }

    /// Same as [`KeyResolver::resolve`] without the output-name rule; used for
    /// fields inside aggregate calls.
    pub fn resolve_field(key: &str, scope: &KeyScope) -> String {
        let key = key.trim();
        if scope.unnest_names.iter().any(|name| *name == key) {
            return key.to_string();
        }
        if Self::is_qualified(key, scope) {
            return key.to_string();
        }
        format!("{}.{}", scope.aliases.primary_alias(), key)
    }

    /// True for function calls and for keys whose first path segment is a
    /// bound alias or UNNEST name.
    pub fn is_qualified(key: &str, scope: &KeyScope) -> bool {
        if key.contains('(') {
            return true;
        }
        match key.split_once('.') {
            Some((head, _)) => scope.aliases.contains_alias(head) || scope.unnest_names.iter().any(|name| *name == head),
            None => false,
        }
    }
}
