use std::fmt;

use serde_json::Value;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// JSON body, only sent with POST.
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self { method: HttpMethod::Get, url, body: None }
    }

    pub fn post(url: Url, body: Value) -> Self {
        Self { method: HttpMethod::Post, url, body: Some(body) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A failure to complete the exchange at all. Replies with an error status
/// are not faults; they come back as an [`HttpResponse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendFault {
    #[error("connection error: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Other(String),
}

impl BackendFault {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendFault::Connect(_) | BackendFault::Timeout(_))
    }
}

/// One blocking HTTP exchange.
pub trait HttpBackend: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BackendFault>;
}
