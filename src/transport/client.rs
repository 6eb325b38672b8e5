//! Request dispatch against the daemon's base URL

use crate::error::{Result, StorageError};
use crate::transport::engine::HttpEngine;
use crate::transport::types::{HttpRequest, RequestOptions, Response};
use bytesize::ByteSize;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Base address, default headers and default timeout shared by requests
#[derive(Clone)]
pub struct Transport {
    base_url: Url,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    engine: Arc<dyn HttpEngine>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Transport {
    /// Transport with no default headers and no timeout
    pub fn new(base_url: Url, engine: Arc<dyn HttpEngine>) -> Self {
        Self {
            base_url,
            headers: Vec::new(),
            timeout: None,
            engine,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolve `resource` against the base URL and append the query pairs
    pub fn url(&self, resource: &str, search_params: &[(String, String)]) -> Result<Url> {
        let mut url = self.base_url.join(resource)?;
        if !search_params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in search_params {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Default headers followed by `headers`, a per-call header replacing
    /// every earlier header of the same name
    pub fn merge_headers(&self, headers: &[(String, String)]) -> Vec<(String, String)> {
        let mut merged = self.headers.clone();
        for (name, value) in headers {
            merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            merged.push((name.clone(), value.clone()));
        }
        merged
    }

    /// Issue one request
    ///
    /// Resolves with the response whatever its status, or with
    /// [`Response::error`] when the engine got no answer. Only an elapsed
    /// timeout (`Timeout`) or a fired signal (`Aborted`) fail the call; both
    /// drop the in-flight exchange.
    pub async fn send(&self, resource: &str, options: RequestOptions) -> Result<Response> {
        let url = self.url(resource, &options.search_params)?;
        let timeout = options.timeout.or(self.timeout);
        let operation = format!("{} {}", options.method, resource);

        debug!(
            "{} {} ({}, timeout {:?})",
            options.method,
            url,
            ByteSize(options.body.as_ref().map_or(0, |body| body.len() as u64)),
            timeout
        );

        let request = HttpRequest {
            method: options.method,
            url,
            headers: self.merge_headers(&options.headers),
            body: options.body,
        };

        let exchange = self.engine.execute(request, options.progress);
        let bounded = async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .map_err(|_| StorageError::timeout(operation.clone())),
                None => Ok(exchange.await),
            }
        };

        let signal = options.signal.unwrap_or_default();
        let outcome = tokio::select! {
            biased;
            _ = signal.cancelled() => Err(StorageError::aborted(operation.clone())),
            outcome = bounded => outcome,
        };

        match outcome {
            Ok(Ok(response)) => {
                debug!(
                    "{} answered {} {} ({})",
                    operation,
                    response.status,
                    response.status_text,
                    ByteSize(response.body.len() as u64)
                );
                Ok(response)
            }
            Ok(Err(failure)) => {
                warn!("{} failed: {}", operation, failure);
                Ok(Response::error())
            }
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }
}
