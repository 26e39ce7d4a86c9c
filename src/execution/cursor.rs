use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use serde_json::Value;
use tracing::debug;

use crate::{
    execution::{
        Completion, ExecuteOptions, ExecutionMode, ParamBinder, PollOutcome, PollPolicy, QueryProtocol, QueryRequest,
        QueryResponse, ResultNormalizer, Row, Submission,
    },
    literal::Literal,
    AsterixError, ErrorKind
};

/// Runs statements and buffers their normalized rows.
///
/// Each execution replaces the previous one's state. Rows are handed out once:
/// the fetch methods and iteration drain the buffer.
#[derive(Debug)]
pub struct Cursor {
    protocol: QueryProtocol,
    connection_closed: Arc<AtomicBool>,
    closed: bool,
    default_poll: PollPolicy,
    statement: Option<String>,
    pending: Option<String>,
    rows: VecDeque<Row>,
    row_count: Option<usize>,
    request_id: Option<String>,
    metrics: Option<Value>,
}

impl Cursor {
    pub fn new(protocol: QueryProtocol, connection_closed: Arc<AtomicBool>, default_poll: PollPolicy) -> Self {
        Self {
            protocol,
            connection_closed,
            closed: false,
            default_poll,
            statement: None,
            pending: None,
            rows: VecDeque::new(),
            row_count: None,
            request_id: None,
            metrics: None,
        }
    }

    pub fn default_poll(&self) -> PollPolicy {
        self.default_poll
    }

    /// Run `statement` in immediate mode.
    pub fn execute(&mut self, statement: &str, params: &[Literal]) -> Result<(), AsterixError> {
        self.execute_with(statement, params, &ExecuteOptions::default())
    }

    /// Run `statement`, substituting `params` for its `?` placeholders first.
    /// Every failure carries the statement text as sent.
    pub fn execute_with(&mut self, statement: &str, params: &[Literal], options: &ExecuteOptions) -> Result<(), AsterixError> {
        self.ensure_open()?;
        self.clear();

        let rendered = ParamBinder::bind(statement, params).map_err(|e| e.with_statement(statement, None))?;
        self.statement = Some(rendered.clone());

        self.run(&rendered, options).map_err(|e| {
            let e = e.with_statement(&rendered, self.pending.as_deref());
            self.pending = None;
            e
        })
    }

    /// Start an async execution and return its status handle without waiting.
    /// `None` means the service answered inline and rows are already buffered.
    pub fn submit(&mut self, statement: &str, params: &[Literal], options: &ExecuteOptions) -> Result<Option<String>, AsterixError> {
        let mut options = options.clone().with_mode(ExecutionMode::Async);
        options.poll = None;
        self.execute_with(statement, params, &options)?;
        Ok(self.pending.clone())
    }

    /// Check a pending async execution once. Returns true once rows are
    /// buffered.
    pub fn poll(&mut self) -> Result<bool, AsterixError> {
        self.ensure_open()?;
        let handle = self.pending_or_err()?;

        let result = match self.protocol.poll(&handle) {
            Ok(PollOutcome::Running) => Ok(false),
            Ok(PollOutcome::Done(completion)) => self.complete(completion).map(|_| true),
            Err(e) => Err(e),
        };
        self.settle(result, &handle)
    }

    /// Block on a pending async execution until it completes.
    pub fn wait(&mut self, policy: PollPolicy) -> Result<(), AsterixError> {
        self.ensure_open()?;
        let handle = self.pending_or_err()?;

        let result = self.protocol.wait(&handle, policy).and_then(|completion| self.complete(completion));
        self.settle(result, &handle)
    }

    pub fn pending_handle(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn fetch_one(&mut self) -> Result<Option<Row>, AsterixError> {
        self.ensure_readable()?;
        Ok(self.rows.pop_front())
    }

    pub fn fetch_many(&mut self, size: usize) -> Result<Vec<Row>, AsterixError> {
        self.ensure_readable()?;
        let size = size.min(self.rows.len());
        Ok(self.rows.drain(..size).collect())
    }

    pub fn fetch_all(&mut self) -> Result<Vec<Row>, AsterixError> {
        self.ensure_readable()?;
        Ok(self.rows.drain(..).collect())
    }

    /// Rows not yet handed out.
    pub fn buffered(&self) -> usize {
        self.rows.len()
    }

    /// Rows produced by the last completed execution; `None` before one
    /// completes.
    pub fn row_count(&self) -> Option<usize> {
        self.row_count
    }

    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn metrics(&self) -> Option<&Value> {
        self.metrics.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed || self.connection_closed.load(Ordering::SeqCst)
    }

    /// Drop buffered rows and refuse further use. Abandoning a pending async
    /// query does not stop it on the server.
    pub fn close(&mut self) {
        if !self.closed {
            debug!("closing cursor");
        }
        self.closed = true;
        self.clear();
    }

    fn run(&mut self, statement: &str, options: &ExecuteOptions) -> Result<(), AsterixError> {
        let request = QueryRequest::new(statement, options)?;
        match self.protocol.submit(&request)? {
            Submission::Done(completion) => self.complete(completion),
            Submission::StatusHandle(handle) => {
                self.pending = Some(handle.clone());
                match options.poll {
                    Some(policy) => {
                        let completion = self.protocol.wait(&handle, policy)?;
                        self.complete(completion)
                    },
                    None => Ok(()),
                }
            },
        }
    }

    fn complete(&mut self, completion: Completion) -> Result<(), AsterixError> {
        let response = self.protocol.resolve(completion)?;
        self.store(response);
        Ok(())
    }

    fn store(&mut self, response: QueryResponse) {
        let rows = ResultNormalizer::normalize(response.results);
        debug!(rows = rows.len(), "query completed");
        self.pending = None;
        self.row_count = Some(rows.len());
        self.rows = rows.into();
        self.request_id = response.request_id;
        self.metrics = response.metrics;
    }

    /// Terminal failures end the pending execution; transport faults keep it
    /// so the caller can poll again.
    fn settle<T>(&mut self, result: Result<T, AsterixError>, handle: &str) -> Result<T, AsterixError> {
        result.map_err(|e| {
            if e.kind() != ErrorKind::Transport {
                self.pending = None;
            }
            match &self.statement {
                Some(statement) => e.with_statement(statement, Some(handle)),
                None => e,
            }
        })
    }

    fn clear(&mut self) {
        self.statement = None;
        self.pending = None;
        self.rows.clear();
        self.row_count = None;
        self.request_id = None;
        self.metrics = None;
    }

    fn pending_or_err(&self) -> Result<String, AsterixError> {
        self.pending
            .clone()
            .ok_or_else(|| AsterixError::Interface("no query is pending".into()))
    }

    fn ensure_open(&self) -> Result<(), AsterixError> {
        if self.connection_closed.load(Ordering::SeqCst) {
            return Err(AsterixError::Interface("connection is closed".into()));
        }
        if self.closed {
            return Err(AsterixError::Interface("cursor is closed".into()));
        }
        Ok(())
    }

    fn ensure_readable(&self) -> Result<(), AsterixError> {
        self.ensure_open()?;
        if self.pending.is_some() {
            return Err(AsterixError::Interface("query is still running; poll or wait first".into()));
        }
        Ok(())
    }
}

/// Drains the buffered rows. A cursor that is closed or still waiting on an
/// async handle has no rows to hand out, so iteration ends at once; use
/// [`Cursor::fetch_all`] to get the `Interface` error for those states.
impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }
}
