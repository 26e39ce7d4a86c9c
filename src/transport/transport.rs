use std::{fmt, sync::Arc, thread};

use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::{
    error::ServiceDiagnostic,
    transport::{HttpBackend, HttpRequest, HttpResponse, RetryPolicy},
    AsterixError
};

pub const QUERY_ENDPOINT: &str = "/query/service";
pub const EXCERPT_LIMIT: usize = 1000;

/// Sends JSON requests to the query service through an [`HttpBackend`],
/// retrying connection-level faults and decoding every reply as JSON.
#[derive(Clone)]
pub struct Transport {
    base_url: Url,
    backend: Arc<dyn HttpBackend>,
    retry: RetryPolicy,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .finish()
    }
}

impl Transport {
    pub fn new(base_url: Url, backend: Arc<dyn HttpBackend>, retry: RetryPolicy) -> Self {
        Self { base_url, backend, retry }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Resolve a path or server-issued handle against the base URL. Absolute
    /// handles are kept as they are.
    pub fn resolve(&self, handle: &str) -> Result<Url, AsterixError> {
        if handle.trim().is_empty() {
            return Err(AsterixError::protocol("empty handle", None));
        }
        self.base_url
            .join(handle)
            .map_err(|e| AsterixError::protocol(format!("invalid handle: {e}"), Some(handle)))
    }

    /// POST a statement payload to the query endpoint.
    pub fn post_query(&self, body: Value) -> Result<Value, AsterixError> {
        let url = self.resolve(QUERY_ENDPOINT)?;
        self.exchange(HttpRequest::post(url, body))
    }

    /// GET a status or result handle.
    pub fn get_handle(&self, handle: &str) -> Result<Value, AsterixError> {
        let url = self.resolve(handle)?;
        self.exchange(HttpRequest::get(url))
    }

    pub fn exchange(&self, request: HttpRequest) -> Result<Value, AsterixError> {
        let response = self.send_with_retry(&request)?;
        if !response.is_success() {
            return Err(Self::status_error(&response));
        }
        Self::decode(&response.body)
    }

    fn send_with_retry(&self, request: &HttpRequest) -> Result<HttpResponse, AsterixError> {
        let mut retry = 0;
        loop {
            debug!(method = %request.method, url = %request.url, attempt = retry + 1, "sending request");
            match self.backend.send(request) {
                Ok(response) => return Ok(response),
                Err(fault) if fault.is_transient() => {
                    warn!(attempt = retry + 1, %fault, "request failed");
                    if retry >= self.retry.max_retries {
                        return Err(AsterixError::ConnectionFailed {
                            retries: self.retry.max_retries,
                            message: fault.to_string(),
                        });
                    }
                    let delay = self.retry.delay_for(retry);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    retry += 1;
                    debug!(retry, max_retries = self.retry.max_retries, "retrying request");
                },
                Err(fault) => return Err(AsterixError::Request(fault.to_string())),
            }
        }
    }

    /// Error replies that carry a service error document keep its diagnostics;
    /// anything else is reported with an excerpt of the body.
    fn status_error(response: &HttpResponse) -> AsterixError {
        if let Ok(Value::Object(doc)) = serde_json::from_str::<Value>(&response.body) {
            let errors = doc
                .get("errors")
                .cloned()
                .and_then(|errors| serde_json::from_value::<Vec<ServiceDiagnostic>>(errors).ok())
                .unwrap_or_default();
            if !errors.is_empty() {
                let status = doc
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or("fatal")
                    .to_string();
                return AsterixError::Remote { status, errors };
            }
        }
        AsterixError::HttpStatus { status: response.status, excerpt: excerpt(&response.body) }
    }

    /// An empty body decodes to `null`.
    fn decode(body: &str) -> Result<Value, AsterixError> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(body).map_err(|e| {
            let excerpt = excerpt(body);
            error!(%e, %excerpt, "invalid JSON response");
            AsterixError::Decode { message: e.to_string(), excerpt }
        })
    }
}

/// At most [`EXCERPT_LIMIT`] characters of `body`, with `...` appended when cut.
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
