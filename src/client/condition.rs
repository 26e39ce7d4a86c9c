use serde_json::{Map, Value};

use crate::{
    expr::{Attribute, DatasetRef, Identifier, Predicate},
    literal::Literal,
    AsterixError
};

/// Turns a document-style condition into a [`Predicate`] over one dataset.
///
/// ```text
/// {"city": "Porto"}                          t.city = 'Porto'
/// {"stars": {"$gte": 4, "$lt": 5}}           (t.stars >= 4) AND (t.stars < 5)
/// {"$or": [{"city": "A"}, {"city": "B"}]}    (t.city = 'A') OR (t.city = 'B')
/// {"tags": {"$contains": "wifi"}}            CONTAINS(t.tags, 'wifi')
/// ```
///
/// Top-level entries are ANDed in key order.
pub struct Condition;

impl Condition {
    /// `None` for an empty condition.
    pub fn parse(condition: &Value, dataset: &DatasetRef) -> Result<Option<Predicate>, AsterixError> {
        let entries = condition
            .as_object()
            .ok_or_else(|| AsterixError::validation(format!("condition must be an object, got {}", condition)))?;

        let mut clauses = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            clauses.push(Self::entry(key, value, dataset)?);
        }
        Ok(Self::fold(clauses, Predicate::and))
    }

    fn entry(key: &str, value: &Value, dataset: &DatasetRef) -> Result<Predicate, AsterixError> {
        match key {
            "$and" => Self::group(key, value, dataset, Predicate::and),
            "$or" => Self::group(key, value, dataset, Predicate::or),
            "$not" => Self::parse(value, dataset)?
                .map(Predicate::negate)
                .ok_or_else(|| AsterixError::validation("$not needs a non-empty condition")),
            _ if key.starts_with('$') => Err(AsterixError::validation(format!("unknown condition operator '{}'", key))),
            field => {
                Identifier::validate_path(field)?;
                let attribute = dataset.attr(field);
                match value {
                    Value::Object(ops) if Self::is_operator_map(ops) => Self::operators(&attribute, ops),
                    other => Ok(attribute.eq(Literal::try_from(other.clone())?)),
                }
            },
        }
    }

    fn group(
        key: &str,
        value: &Value,
        dataset: &DatasetRef,
        join: fn(Predicate, Predicate) -> Predicate,
    ) -> Result<Predicate, AsterixError> {
        let items = value
            .as_array()
            .ok_or_else(|| AsterixError::validation(format!("{} expects a list of conditions", key)))?;

        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            if let Some(predicate) = Self::parse(item, dataset)? {
                parts.push(predicate);
            }
        }
        Self::fold(parts, join).ok_or_else(|| AsterixError::validation(format!("{} needs at least one condition", key)))
    }

    /// A non-empty object whose keys are all operators.
    fn is_operator_map(ops: &Map<String, Value>) -> bool {
        !ops.is_empty() && ops.keys().all(|k| k.starts_with('$'))
    }

    fn operators(attribute: &Attribute, ops: &Map<String, Value>) -> Result<Predicate, AsterixError> {
        let mut parts = Vec::with_capacity(ops.len());
        for (op, operand) in ops {
            parts.push(Self::comparison(attribute, op, operand)?);
        }
        Self::fold(parts, Predicate::and).ok_or_else(|| AsterixError::validation("empty operator map"))
    }

    fn comparison(attribute: &Attribute, op: &str, operand: &Value) -> Result<Predicate, AsterixError> {
        let literal = || Literal::try_from(operand.clone());
        match op {
            "$eq" => Ok(attribute.eq(literal()?)),
            "$ne" => Ok(attribute.ne(literal()?)),
            "$gt" => Ok(attribute.gt(literal()?)),
            "$gte" => Ok(attribute.ge(literal()?)),
            "$lt" => Ok(attribute.lt(literal()?)),
            "$lte" => Ok(attribute.le(literal()?)),
            "$like" => match operand {
                Value::String(pattern) => Ok(attribute.like(pattern.as_str())),
                other => Err(AsterixError::validation(format!("$like expects a string pattern, got {}", other))),
            },
            "$in" => match operand {
                Value::Array(items) if !items.is_empty() => {
                    let values = items.iter().cloned().map(Literal::try_from).collect::<Result<Vec<_>, _>>()?;
                    Ok(attribute.is_in(values))
                },
                other => Err(AsterixError::validation(format!("$in expects a non-empty list, got {}", other))),
            },
            "$between" => match operand.as_array().map(Vec::as_slice) {
                Some([low, high]) => Ok(attribute.between(Literal::try_from(low.clone())?, Literal::try_from(high.clone())?)),
                _ => Err(AsterixError::validation(format!("$between expects [low, high], got {}", operand))),
            },
            "$contains" => Ok(attribute.contains(literal()?)),
            "$exists" => match operand {
                Value::Bool(false) => Ok(attribute.is_null()),
                _ => Ok(attribute.is_not_null()),
            },
            "$notexists" => Ok(attribute.is_null()),
            other => Err(AsterixError::validation(format!("unknown condition operator '{}'", other))),
        }
    }

    fn fold(parts: Vec<Predicate>, join: fn(Predicate, Predicate) -> Predicate) -> Option<Predicate> {
        parts.into_iter().reduce(join)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        client::Condition,
        expr::{AliasTable, DatasetRef},
        ErrorKind
    };

    fn render(condition: serde_json::Value) -> String {
        let ds = DatasetRef::parse("Shop.Users").unwrap();
        let table = AliasTable::new(ds.clone(), "t");
        Condition::parse(&condition, &ds).unwrap().unwrap().render(&table).unwrap()
    }

    fn parse_err(condition: serde_json::Value) -> ErrorKind {
        let ds = DatasetRef::parse("Users").unwrap();
        Condition::parse(&condition, &ds).unwrap_err().kind()
    }

    #[test]
    pub fn test_equality_and_operators() {
        assert_eq!(render(json!({"city": "Porto"})), "t.city = 'Porto'");
        assert_eq!(render(json!({"age": {"$gte": 18, "$lt": 65}})), "(t.age >= 18) AND (t.age < 65)");
        assert_eq!(render(json!({"name": {"$like": "A%"}, "active": true})), "(t.active = true) AND (t.name LIKE 'A%')");
        assert_eq!(render(json!({"address.zip": {"$ne": null}})), "t.address.zip != NULL");
    }

    #[test]
    pub fn test_collections_and_nulls() {
        assert_eq!(render(json!({"id": {"$in": [1, 2]}})), "t.id IN (1, 2)");
        assert_eq!(render(json!({"age": {"$between": [20, 30]}})), "t.age BETWEEN 20 AND 30");
        assert_eq!(render(json!({"tags": {"$contains": "wifi"}})), "CONTAINS(t.tags, 'wifi')");
        assert_eq!(render(json!({"email": {"$exists": true}})), "t.email IS NOT NULL");
        assert_eq!(render(json!({"email": {"$notexists": true}})), "t.email IS NULL");
    }

    #[test]
    pub fn test_groups() {
        assert_eq!(
            render(json!({"$or": [{"city": "A"}, {"city": "B"}], "age": {"$gt": 30}})),
            "((t.city = 'A') OR (t.city = 'B')) AND (t.age > 30)"
        );
        assert_eq!(render(json!({"$not": {"city": "A"}})), "NOT (t.city = 'A')");
    }

    #[test]
    pub fn test_object_value_is_plain_equality() {
        assert_eq!(render(json!({"meta": {"k": 1}})), r#"t.meta = {"k": 1}"#);
    }

    #[test]
    pub fn test_empty_condition() {
        let ds = DatasetRef::parse("Users").unwrap();
        assert!(Condition::parse(&json!({}), &ds).unwrap().is_none());
    }

    #[test]
    pub fn test_rejected_conditions() {
        assert_eq!(parse_err(json!([1])), ErrorKind::Validation);
        assert_eq!(parse_err(json!({"a b": 1})), ErrorKind::Validation);
        assert_eq!(parse_err(json!({"$xor": []})), ErrorKind::Validation);
        assert_eq!(parse_err(json!({"age": {"$near": 1}})), ErrorKind::Validation);
        assert_eq!(parse_err(json!({"id": {"$in": []}})), ErrorKind::Validation);
        assert_eq!(parse_err(json!({"age": {"$between": [1]}})), ErrorKind::Validation);
        assert_eq!(parse_err(json!({"$or": []})), ErrorKind::Validation);
        assert_eq!(parse_err(json!({"name": {"$like": 3}})), ErrorKind::Validation);
    }
}
