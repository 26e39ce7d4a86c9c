use crate::{literal::Literal, AsterixError};

/// Writes [`Literal`] values as SQL++ literal text.
///
/// All quoting and escaping for statement text lives here; predicate rendering
/// and placeholder substitution both go through [`LiteralSerializer::serialize`].
pub struct LiteralSerializer;

impl LiteralSerializer {
    pub fn serialize(literal: &Literal) -> Result<String, AsterixError> {
        let mut out = String::new();
        Self::write(literal, &mut out)?;
        Ok(out)
    }

    /// Serialize every item and join them with `, `.
    pub fn serialize_all(literals: &[Literal]) -> Result<String, AsterixError> {
        let mut out = String::new();
        Self::write_items(literals, &mut out)?;
        Ok(out)
    }

    pub fn quote_string(value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for ch in value.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
        out.push('\'');
        out
    }

    fn quote_key(key: &str) -> String {
        let mut out = String::with_capacity(key.len() + 2);
        out.push('"');
        for ch in key.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }

    fn write(literal: &Literal, out: &mut String) -> Result<(), AsterixError> {
        match literal {
            Literal::Null => out.push_str("NULL"),
            Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Literal::Int(i) => out.push_str(&i.to_string()),
            Literal::Float(f) => out.push_str(&Self::format_float(f.into_inner())?),
            Literal::String(s) => out.push_str(&Self::quote_string(s)),
            Literal::Date(d) => {
                out.push_str(&format!("date('{}')", d.format("%Y-%m-%d")));
            },
            Literal::Time(t) => {
                out.push_str(&format!("time('{}')", t.format("%H:%M:%S%.f")));
            },
            Literal::DateTime(dt) => {
                out.push_str(&format!("datetime('{}')", dt.format("%Y-%m-%dT%H:%M:%S%.f")));
            },
            Literal::List(items) => {
                out.push('[');
                Self::write_items(items, out)?;
                out.push(']');
            },
            Literal::Multiset(items) => {
                out.push_str("{{");
                Self::write_items(items, out)?;
                out.push_str("}}");
            },
            Literal::Object(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&Self::quote_key(key));
                    out.push_str(": ");
                    Self::write(value, out)?;
                }
                out.push('}');
            },
        }
        Ok(())
    }

    fn write_items(items: &[Literal], out: &mut String) -> Result<(), AsterixError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            Self::write(item, out)?;
        }
        Ok(())
    }

    fn format_float(value: f64) -> Result<String, AsterixError> {
        if !value.is_finite() {
            return Err(AsterixError::validation(format!("non-finite number {} has no literal form", value)));
        }
        // whole floats always carry a fraction or an exponent so the service types them as double
        if value.fract() != 0.0 {
            Ok(value.to_string())
        } else if value.abs() < 1e16 {
            Ok(format!("{:.1}", value))
        } else {
            Ok(format!("{:e}", value))
        }
    }
}
