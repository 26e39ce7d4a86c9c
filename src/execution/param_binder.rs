use crate::{
    literal::{Literal, LiteralSerializer},
    AsterixError
};

/// Client-side substitution of positional `?` placeholders.
pub struct ParamBinder;

impl ParamBinder {
    /// Byte offsets of every `?` outside quoted string literals and
    /// backquoted identifiers.
    pub fn placeholders(template: &str) -> Vec<usize> {
        let mut out = vec![];
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (pos, ch) in template.char_indices() {
            match quote {
                Some(q) => {
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == q {
                        quote = None;
                    }
                },
                None => match ch {
                    '\'' | '"' | '`' => quote = Some(ch),
                    '?' => out.push(pos),
                    _ => {},
                },
            }
        }
        out
    }

    /// Replace each placeholder, in order, with the literal text of the
    /// matching value. With no values the template is returned unchanged.
    pub fn bind(template: &str, params: &[Literal]) -> Result<String, AsterixError> {
        if params.is_empty() {
            return Ok(template.to_string());
        }

        let positions = Self::placeholders(template);
        if positions.len() != params.len() {
            return Err(AsterixError::validation(format!(
                "Number of parameters ({}) does not match number of placeholders ({})",
                params.len(),
                positions.len()
            )));
        }

        let mut out = String::with_capacity(template.len() + params.len() * 8);
        let mut last = 0;
        for (pos, param) in positions.into_iter().zip(params) {
            out.push_str(&template[last..pos]);
            out.push_str(&LiteralSerializer::serialize(param)?);
            last = pos + 1;
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}
