//! The HTTP engine seam and its reqwest implementation

use crate::error::{Result, StorageError};
use crate::transport::types::{
    HttpRequest, Method, NetworkFailure, Progress, ProgressCallback, Response, ResponseKind,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use log::trace;

/// Size of the slices a request body is streamed in
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Performs one HTTP exchange
///
/// Implementations resolve with `Err` only when no answer was obtained at
/// all; any status code is a successful exchange. Dropping the returned
/// future must tear the request down.
#[async_trait]
pub trait HttpEngine: Send + Sync {
    async fn execute(
        &self,
        request: HttpRequest,
        progress: Option<ProgressCallback>,
    ) -> std::result::Result<Response, NetworkFailure>;
}

/// Split `body` into chunks, reporting cumulative progress as each is taken
pub fn progress_stream(
    body: Bytes,
    progress: Option<ProgressCallback>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static {
    let total = body.len() as u64;
    let chunks: Vec<Bytes> = (0..body.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| body.slice(start..(start + UPLOAD_CHUNK_SIZE).min(body.len())))
        .collect();

    let mut loaded = 0u64;
    stream::iter(chunks).map(move |chunk| {
        loaded += chunk.len() as u64;
        if let Some(progress) = &progress {
            progress(Progress::new(total, loaded));
        }
        Ok::<_, std::io::Error>(chunk)
    })
}

/// [`HttpEngine`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestEngine {
    client: reqwest::Client,
}

impl ReqwestEngine {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::config_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl HttpEngine for ReqwestEngine {
    async fn execute(
        &self,
        request: HttpRequest,
        progress: Option<ProgressCallback>,
    ) -> std::result::Result<Response, NetworkFailure> {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            builder = builder.header(reqwest::header::CONTENT_LENGTH, body.len());
            builder = match progress {
                Some(progress) => {
                    builder.body(reqwest::Body::wrap_stream(progress_stream(body, Some(progress))))
                }
                None => builder.body(body),
            };
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkFailure::new(e.to_string()))?;

        let status = response.status();
        let url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkFailure::new(e.to_string()))?;
        trace!("received {} body bytes from {}", body.len(), url);

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            url: Some(url),
            body,
            kind: ResponseKind::Basic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_progress_stream_reports_cumulative_counts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let callback: ProgressCallback = Arc::new(move |progress: Progress| {
            recorder.lock().unwrap().push(progress);
        });

        let body = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let chunks: Vec<Bytes> = progress_stream(body.clone(), Some(callback))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), body.to_vec());

        let total = body.len() as u64;
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Progress::new(total, UPLOAD_CHUNK_SIZE as u64),
                Progress::new(total, UPLOAD_CHUNK_SIZE as u64 * 2),
                Progress::new(total, total),
            ]
        );
    }

    #[tokio::test]
    async fn test_progress_stream_empty_body() {
        let chunks: Vec<_> = progress_stream(Bytes::new(), None).collect().await;
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(reqwest_method(Method::Post), reqwest::Method::POST);
        assert_eq!(reqwest_method(Method::Get), reqwest::Method::GET);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let engine = ReqwestEngine::new().unwrap();
        let request = HttpRequest {
            method: Method::Get,
            url: url::Url::parse("http://127.0.0.1:9/api/v0/version").unwrap(),
            headers: Vec::new(),
            body: None,
        };
        assert!(engine.execute(request, None).await.is_err());
    }
}
