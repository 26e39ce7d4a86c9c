use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use uuid::Uuid;

use crate::execution::ExecutionMode;

/// Attempt ceiling and spacing for status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { max_attempts: 100, interval: Duration::from_millis(500) }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }
}

/// Per-execution request settings.
///
/// With [`ExecutionMode::Async`] and a `poll` policy the cursor blocks until
/// the query completes; without one the status handle is left pending for
/// the caller to poll.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecuteOptions {
    pub mode: ExecutionMode,
    pub pretty: bool,
    pub readonly: bool,
    pub client_context_id: Option<String>,
    pub dataverse: Option<String>,
    /// Server-side named parameters, sent as `$name` fields.
    pub named_params: IndexMap<String, Value>,
    pub poll: Option<PollPolicy>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate() -> Self {
        Self { mode: ExecutionMode::Immediate, ..Self::default() }
    }

    pub fn deferred() -> Self {
        Self { mode: ExecutionMode::Deferred, ..Self::default() }
    }

    pub fn asynchronous(poll: Option<PollPolicy>) -> Self {
        Self { mode: ExecutionMode::Async, poll, ..Self::default() }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_client_context_id(mut self, id: impl Into<String>) -> Self {
        self.client_context_id = Some(id.into());
        self
    }

    pub fn with_generated_context_id(self) -> Self {
        self.with_client_context_id(Uuid::new_v4().to_string())
    }

    pub fn with_dataverse(mut self, dataverse: impl Into<String>) -> Self {
        self.dataverse = Some(dataverse.into());
        self
    }

    /// A leading `$` on `name` is optional.
    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.named_params.insert(name.trim_start_matches('$').to_string(), value.into());
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = Some(poll);
        self
    }
}
