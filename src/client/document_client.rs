use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    client::Condition,
    connection::CursorProvider,
    execution::Row,
    expr::{AliasTable, DatasetRef, Identifier, Predicate},
    frame::QueryFrame,
    literal::{Literal, LiteralSerializer},
    query::{OrderKey, DEFAULT_ALIAS},
    AsterixError
};

/// Arguments of [`DocumentClient::find`]. Everything is optional; the
/// default finds every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub condition: Option<Value>,
    pub projection: Vec<String>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_projection<T: Into<String>>(mut self, fields: impl IntoIterator<Item = T>) -> Self {
        self.projection = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order_by.push(OrderKey::new(field, descending));
        self
    }

    pub fn with_limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn with_offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }
}

/// Record-level reads and writes against named datasets, with conditions
/// given as JSON documents (see [`Condition`]).
///
/// Dataset names without a namespace are qualified with the current
/// dataverse, when one is set.
#[derive(Clone)]
pub struct DocumentClient {
    provider: Arc<dyn CursorProvider>,
    dataverse: Option<String>,
}

impl std::fmt::Debug for DocumentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentClient").field("dataverse", &self.dataverse).finish()
    }
}

impl DocumentClient {
    pub fn new(provider: Arc<dyn CursorProvider>) -> Self {
        Self { provider, dataverse: None }
    }

    pub fn dataverse(&self) -> Option<&str> {
        self.dataverse.as_deref()
    }

    pub fn use_dataverse(&mut self, name: &str) -> Result<&mut Self, AsterixError> {
        Identifier::validate(name, "dataverse")?;
        self.dataverse = Some(name.to_string());
        Ok(self)
    }

    pub fn find(&self, dataset: &str, options: &FindOptions) -> Result<Vec<Row>, AsterixError> {
        let dataset = self.dataset(dataset)?;
        for field in &options.projection {
            Identifier::validate_path(field)?;
        }

        let mut frame = QueryFrame::from_dataset(Arc::clone(&self.provider), dataset.clone());
        if !options.projection.is_empty() {
            frame = frame.select(options.projection.iter().map(String::as_str));
        }
        if let Some(predicate) = self.condition(options.condition.as_ref(), &dataset)? {
            frame = frame.filter(predicate);
        }
        for key in &options.order_by {
            frame = frame.order_by(&key.key, key.descending);
        }
        if let Some(n) = options.limit {
            frame = frame.limit(n);
        }
        if let Some(n) = options.offset {
            frame = frame.offset(n);
        }
        frame.fetch_all()
    }

    /// First matching record, if any.
    pub fn find_one(&self, dataset: &str, condition: Option<Value>) -> Result<Option<Row>, AsterixError> {
        let options = FindOptions { condition, limit: Some(1), ..FindOptions::default() };
        Ok(self.find(dataset, &options)?.into_iter().next())
    }

    pub fn count(&self, dataset: &str, condition: Option<Value>) -> Result<u64, AsterixError> {
        let dataset = self.dataset(dataset)?;
        let mut frame = QueryFrame::from_dataset(Arc::clone(&self.provider), dataset.clone()).select(["COUNT(*) AS count"]);
        if let Some(predicate) = self.condition(condition.as_ref(), &dataset)? {
            frame = frame.filter(predicate);
        }

        let row = frame.fetch_one()?;
        match row.as_ref().and_then(|r| r.get("count")) {
            Some(count) => count
                .as_u64()
                .ok_or_else(|| AsterixError::protocol(format!("count reply is not a number: {}", count), None)),
            None => Err(AsterixError::protocol("count reply carried no count", None)),
        }
    }

    /// Insert one or more records; each must be a JSON object.
    pub fn insert(&self, dataset: &str, records: &[Value]) -> Result<Vec<Row>, AsterixError> {
        let dataset = self.dataset(dataset)?;
        if records.is_empty() {
            return Err(AsterixError::validation("insert needs at least one record"));
        }

        let mut rendered = Vec::with_capacity(records.len());
        for record in records {
            if !record.is_object() {
                return Err(AsterixError::validation(format!("records must be objects, got {}", record)));
            }
            rendered.push(LiteralSerializer::serialize(&Literal::try_from(record.clone())?)?);
        }

        let statement = format!("{}INSERT INTO {} ([{}]);", Self::use_prefix(&dataset), dataset.name, rendered.join(", "));
        info!(dataset = %dataset, records = records.len(), "inserting records");
        self.run(&statement)
    }

    /// Set `updates` on every record matching `condition`. Rewrites the
    /// matching records with UPSERT, since the service has no UPDATE.
    pub fn update(&self, dataset: &str, condition: &Value, updates: &Value) -> Result<Vec<Row>, AsterixError> {
        let dataset = self.dataset(dataset)?;
        let where_clause = self.required_condition(condition, &dataset)?;

        let fields = updates
            .as_object()
            .filter(|map| !map.is_empty())
            .ok_or_else(|| AsterixError::validation(format!("updates must be a non-empty object, got {}", updates)))?;

        let mut record = DEFAULT_ALIAS.to_string();
        for (field, value) in fields {
            Identifier::validate(field, "field name")?;
            let value = LiteralSerializer::serialize(&Literal::try_from(value.clone())?)?;
            record = format!("OBJECT_PUT({}, {}, {})", record, LiteralSerializer::quote_string(field), value);
        }

        let statement = format!(
            "{}UPSERT INTO {} (SELECT VALUE {} FROM {} {} WHERE {});",
            Self::use_prefix(&dataset),
            dataset.name,
            record,
            dataset.name,
            DEFAULT_ALIAS,
            where_clause
        );
        info!(dataset = %dataset, "updating records");
        self.run(&statement)
    }

    pub fn delete(&self, dataset: &str, condition: &Value) -> Result<Vec<Row>, AsterixError> {
        let dataset = self.dataset(dataset)?;
        let where_clause = self.required_condition(condition, &dataset)?;

        let statement = format!(
            "{}DELETE FROM {} {} WHERE {};",
            Self::use_prefix(&dataset),
            dataset.name,
            DEFAULT_ALIAS,
            where_clause
        );
        info!(dataset = %dataset, "deleting records");
        self.run(&statement)
    }

    fn dataset(&self, name: &str) -> Result<DatasetRef, AsterixError> {
        let dataset = DatasetRef::parse(name)?;
        match (&dataset.namespace, &self.dataverse) {
            (None, Some(dataverse)) => DatasetRef::new(Some(dataverse), &dataset.name),
            _ => Ok(dataset),
        }
    }

    fn condition(&self, condition: Option<&Value>, dataset: &DatasetRef) -> Result<Option<Predicate>, AsterixError> {
        match condition {
            Some(condition) => Condition::parse(condition, dataset),
            None => Ok(None),
        }
    }

    /// Rendered WHERE text; writes never run without a condition.
    fn required_condition(&self, condition: &Value, dataset: &DatasetRef) -> Result<String, AsterixError> {
        let predicate = Condition::parse(condition, dataset)?
            .ok_or_else(|| AsterixError::validation("a non-empty condition is required"))?;
        predicate.render(&AliasTable::new(dataset.clone(), DEFAULT_ALIAS))
    }

    fn use_prefix(dataset: &DatasetRef) -> String {
        match &dataset.namespace {
            Some(namespace) => format!("USE {}; ", namespace),
            None => String::new(),
        }
    }

    fn run(&self, statement: &str) -> Result<Vec<Row>, AsterixError> {
        debug!(%statement, "running write statement");
        let mut cursor = self.provider.cursor().map_err(|e| e.with_statement(statement, None))?;
        cursor.execute(statement, &[])?;
        cursor.fetch_all()
    }
}
