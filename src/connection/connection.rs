use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tracing::info;
use url::Url;

use crate::{
    connection::{ConnectionConfig, CursorProvider},
    execution::{Cursor, QueryProtocol},
    transport::{HttpBackend, ReqwestBackend, RetryPolicy, Transport},
    AsterixError
};

/// A handle on the query service. Cheap to clone; clones share the closed
/// state, and closing any of them closes every cursor they opened.
#[derive(Debug, Clone)]
pub struct Connection {
    config: ConnectionConfig,
    transport: Transport,
    closed: Arc<AtomicBool>,
}

impl Connection {
    pub fn open(config: ConnectionConfig) -> Result<Self, AsterixError> {
        let backend = ReqwestBackend::builder().timeout(config.timeout).build()?;
        Self::with_backend(config, Arc::new(backend))
    }

    pub fn with_backend(config: ConnectionConfig, backend: Arc<dyn HttpBackend>) -> Result<Self, AsterixError> {
        let base_url = config.parse_base_url()?;
        info!(base_url = %base_url, "initialized query service connection");

        let transport = Transport::new(base_url, backend, config.retry_policy());
        Ok(Self { config, transport, closed: Arc::new(AtomicBool::new(false)) })
    }

    pub fn cursor(&self) -> Result<Cursor, AsterixError> {
        if self.is_closed() {
            return Err(AsterixError::Interface("connection is closed".into()));
        }
        Ok(Cursor::new(
            QueryProtocol::new(self.transport.clone()),
            Arc::clone(&self.closed),
            self.config.poll_policy(),
        ))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.transport.retry_policy()
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("closed query service connection");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl CursorProvider for Connection {
    fn cursor(&self) -> Result<Cursor, AsterixError> {
        Connection::cursor(self)
    }
}
