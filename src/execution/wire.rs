use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ServiceDiagnostic,
    execution::{ExecuteOptions, ExecutionMode},
    expr::Identifier,
    AsterixError
};

/// Body of a statement submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub statement: String,
    pub mode: ExecutionMode,
    pub pretty: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_context_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataverse: Option<String>,
    /// `$name` keyed parameter values.
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

impl QueryRequest {
    pub fn new(statement: &str, options: &ExecuteOptions) -> Result<Self, AsterixError> {
        let mut params = IndexMap::new();
        for (name, value) in &options.named_params {
            Identifier::validate(name, "parameter name")?;
            params.insert(format!("${}", name), value.clone());
        }

        Ok(Self {
            statement: statement.to_string(),
            mode: options.mode,
            pretty: options.pretty,
            readonly: options.readonly,
            client_context_id: options.client_context_id.clone(),
            dataverse: options.dataverse.clone(),
            params,
        })
    }

    pub fn to_value(&self) -> Result<Value, AsterixError> {
        serde_json::to_value(self).map_err(|e| AsterixError::validation(format!("request is not serializable: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Running,
    Success,
    Failed,
    Fatal,
    Timeout,
}

impl QueryStatus {
    /// `queued` is reported before a query starts running and is treated
    /// the same way.
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "running" | "queued" => Some(QueryStatus::Running),
            "success" => Some(QueryStatus::Success),
            "failed" => Some(QueryStatus::Failed),
            "fatal" => Some(QueryStatus::Fatal),
            "timeout" => Some(QueryStatus::Timeout),
            _ => None,
        }
    }

    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, QueryStatus::Failed | QueryStatus::Fatal | QueryStatus::Timeout)
    }
}

const ENVELOPE_KEYS: [&str; 4] = ["requestID", "results", "errors", "metrics"];

/// Any reply of the query service: submit, status poll or result fetch.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "requestID", default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub errors: Vec<ServiceDiagnostic>,
    #[serde(default)]
    pub metrics: Option<Value>,
}

impl QueryResponse {
    pub fn from_value(value: Value) -> Result<Self, AsterixError> {
        if !value.is_object() {
            return Err(AsterixError::protocol(format!("expected a JSON object reply, got {}", value), None));
        }
        serde_json::from_value(value).map_err(|e| AsterixError::protocol(format!("unexpected reply shape: {e}"), None))
    }

    /// Result-handle replies either wrap the rows in the usual reply object
    /// or are the rows themselves: a sequence, a single record, a scalar or
    /// `null`.
    pub fn from_result_value(value: Value) -> Result<Self, AsterixError> {
        if Self::is_envelope(&value) {
            return Self::from_value(value);
        }
        Ok(Self { results: Some(value), ..Default::default() })
    }

    fn is_envelope(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|map| ENVELOPE_KEYS.iter().any(|key| map.contains_key(*key)))
    }

    /// Recognised status, or a protocol error naming the unknown value.
    pub fn query_status(&self, handle: Option<&str>) -> Result<QueryStatus, AsterixError> {
        match self.status.as_deref() {
            Some(status) => QueryStatus::parse(status)
                .ok_or_else(|| AsterixError::protocol(format!("unrecognized status '{}'", status), handle)),
            None => Err(AsterixError::protocol("reply carried no status", handle)),
        }
    }

    /// Turn service-reported failures into a `Remote` error.
    pub fn check(self) -> Result<Self, AsterixError> {
        let failed = self
            .status
            .as_deref()
            .and_then(QueryStatus::parse)
            .is_some_and(|s| s.is_terminal_failure());
        if failed || !self.errors.is_empty() {
            return Err(AsterixError::Remote {
                status: self.status.unwrap_or_else(|| "fatal".to_string()),
                errors: self.errors,
            });
        }
        Ok(self)
    }

    pub fn has_results(&self) -> bool {
        self.results.is_some()
    }
}
