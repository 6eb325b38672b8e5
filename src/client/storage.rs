//! Top-level handle on a storage daemon

use crate::client::config::ClientConfig;
use crate::error::Result;
use crate::transport::{HttpEngine, ReqwestEngine, Transport};
use crate::upload::UploadService;
use log::debug;
use std::sync::Arc;

/// Groups the transport and the services built on it
#[derive(Debug, Clone)]
pub struct StorageClient {
    config: ClientConfig,
    transport: Transport,
    blob: UploadService,
}

impl StorageClient {
    /// Create a client talking HTTP through reqwest
    pub fn new(config: ClientConfig) -> Result<Self> {
        let engine = ReqwestEngine::new()?;
        Self::with_engine(config, Arc::new(engine))
    }

    /// Create a client on top of a custom HTTP engine
    pub fn with_engine(config: ClientConfig, engine: Arc<dyn HttpEngine>) -> Result<Self> {
        config.validate()?;

        let mut transport = Transport::new(config.base_url()?, engine);
        for (name, value) in &config.headers {
            transport = transport.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = config.default_timeout() {
            transport = transport.timeout(timeout);
        }

        debug!("storage client for {}", transport.base_url());
        Ok(Self {
            blob: UploadService::new(transport.clone()),
            transport,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// The add endpoint client
    pub fn blob(&self) -> &UploadService {
        &self.blob
    }
}
