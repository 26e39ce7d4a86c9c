use std::thread;

use tracing::{debug, info, trace};

use crate::{
    execution::{ExecutionMode, PollPolicy, QueryRequest, QueryResponse, QueryStatus},
    transport::Transport,
    AsterixError
};

/// Where a finished execution's rows are.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Rows came back inline.
    Response(QueryResponse),
    /// Rows must be fetched from this result handle.
    ResultHandle(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Done(Completion),
    /// Async execution accepted; poll this status handle.
    StatusHandle(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Running,
    Done(Completion),
}

/// Request/reply rules of the query service for the three execution modes.
///
/// ```text
/// async:    submit -> status handle -> poll* -> success(result handle) -> fetch
/// deferred: submit -> result handle -> fetch
/// ```
#[derive(Debug, Clone)]
pub struct QueryProtocol {
    transport: Transport,
}

impl QueryProtocol {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn submit(&self, request: &QueryRequest) -> Result<Submission, AsterixError> {
        info!(mode = %request.mode, "executing query");
        debug!(statement = %request.statement, "query statement");

        let reply = self.transport.post_query(request.to_value()?)?;
        let response = QueryResponse::from_value(reply)?.check()?;

        match request.mode {
            ExecutionMode::Immediate => Ok(Submission::Done(Completion::Response(response))),
            ExecutionMode::Deferred => match response.handle.clone() {
                Some(handle) => {
                    debug!(%handle, "received result handle");
                    Ok(Submission::Done(Completion::ResultHandle(handle)))
                },
                None if response.has_results() => Ok(Submission::Done(Completion::Response(response))),
                None => Err(AsterixError::protocol("deferred reply carried no handle", None)),
            },
            ExecutionMode::Async => {
                let status = response.query_status(response.handle.as_deref())?;
                match (status, response.handle.clone()) {
                    (QueryStatus::Running, Some(handle)) => {
                        debug!(%handle, "received status handle");
                        Ok(Submission::StatusHandle(handle))
                    },
                    (QueryStatus::Running, None) => Err(AsterixError::protocol("async reply carried no handle", None)),
                    (QueryStatus::Success, _) if response.has_results() => {
                        Ok(Submission::Done(Completion::Response(response)))
                    },
                    (status, handle) => Err(AsterixError::protocol(
                        format!("unexpected async reply status {:?}", status),
                        handle.as_deref(),
                    )),
                }
            },
        }
    }

    /// One status check.
    pub fn poll(&self, status_handle: &str) -> Result<PollOutcome, AsterixError> {
        trace!(handle = %status_handle, "checking query status");
        let reply = self.transport.get_handle(status_handle)?;
        let response = QueryResponse::from_value(reply)
            .map_err(|e| Self::attach_handle(e, status_handle))?;

        match response.query_status(Some(status_handle))? {
            QueryStatus::Running => Ok(PollOutcome::Running),
            QueryStatus::Success => match response.handle.clone() {
                Some(handle) => {
                    debug!(%handle, "received result handle");
                    Ok(PollOutcome::Done(Completion::ResultHandle(handle)))
                },
                None if response.has_results() => Ok(PollOutcome::Done(Completion::Response(response))),
                None => Err(AsterixError::protocol("success status carried no result handle", Some(status_handle))),
            },
            QueryStatus::Failed | QueryStatus::Fatal | QueryStatus::Timeout => Err(AsterixError::Remote {
                status: response.status.unwrap_or_default(),
                errors: response.errors,
            }),
        }
    }

    /// Poll until the query leaves the running state, sleeping `interval`
    /// between checks. Exceeding `max_attempts` is [`AsterixError::NotCompleted`].
    pub fn wait(&self, status_handle: &str, policy: PollPolicy) -> Result<Completion, AsterixError> {
        for attempt in 1..=policy.max_attempts {
            match self.poll(status_handle)? {
                PollOutcome::Done(completion) => return Ok(completion),
                PollOutcome::Running => {
                    trace!(attempt, max_attempts = policy.max_attempts, "query still running");
                    if attempt < policy.max_attempts && !policy.interval.is_zero() {
                        thread::sleep(policy.interval);
                    }
                },
            }
        }
        Err(AsterixError::NotCompleted { attempts: policy.max_attempts, handle: status_handle.to_string() })
    }

    pub fn fetch(&self, result_handle: &str) -> Result<QueryResponse, AsterixError> {
        debug!(handle = %result_handle, "fetching query result");
        let reply = self.transport.get_handle(result_handle)?;
        QueryResponse::from_result_value(reply)
            .map_err(|e| Self::attach_handle(e, result_handle))?
            .check()
    }

    /// Reply carrying the rows of a completion, fetching when needed.
    pub fn resolve(&self, completion: Completion) -> Result<QueryResponse, AsterixError> {
        match completion {
            Completion::Response(response) => Ok(response),
            Completion::ResultHandle(handle) => self.fetch(&handle),
        }
    }

    fn attach_handle(err: AsterixError, handle: &str) -> AsterixError {
        match err {
            AsterixError::Protocol { message, handle: None } => AsterixError::protocol(message, Some(handle)),
            other => other,
        }
    }
}
