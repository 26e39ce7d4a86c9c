use std::time::Duration;

use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
};
use tracing::trace;

use crate::{
    transport::{BackendFault, HttpBackend, HttpMethod, HttpRequest, HttpResponse},
    AsterixError
};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Default)]
pub struct ReqwestBackendBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl ReqwestBackendBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    pub fn build(self) -> Result<ReqwestBackend, AsterixError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        default_headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut builder = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(default_headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let client = builder
            .build()
            .map_err(|e| AsterixError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(ReqwestBackend { inner: client })
    }
}

/// [`HttpBackend`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    inner: Client,
}

impl ReqwestBackend {
    pub fn builder() -> ReqwestBackendBuilder {
        ReqwestBackendBuilder::default()
    }

    fn classify(err: reqwest::Error) -> BackendFault {
        if err.is_timeout() {
            BackendFault::Timeout(err.to_string())
        } else if err.is_connect() {
            BackendFault::Connect(err.to_string())
        } else {
            BackendFault::Other(err.to_string())
        }
    }
}

impl HttpBackend for ReqwestBackend {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BackendFault> {
        let mut req = match request.method {
            HttpMethod::Get => self.inner.get(request.url.clone()),
            HttpMethod::Post => self.inner.post(request.url.clone()),
        };
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let res = req.send().map_err(Self::classify)?;
        let status = res.status().as_u16();
        let body = res.text().map_err(Self::classify)?;
        trace!(status, %body, "response");

        Ok(HttpResponse { status, body })
    }
}
