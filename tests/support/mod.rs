//! In-process stand-in for the storage daemon

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use storage_staging::transport::ProgressCallback;
use storage_staging::{
    ClientConfig, HttpEngine, HttpRequest, NetworkFailure, Progress, Response, StorageClient,
};

pub enum Reply {
    Respond(Response),
    Fail(String),
    Hang,
}

pub struct MockDaemon {
    reply: Reply,
    requests: Mutex<Vec<HttpRequest>>,
    dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl MockDaemon {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Answers 200 with one JSON object per line
    pub fn ndjson(lines: &[&str]) -> Arc<Self> {
        let body = lines
            .iter()
            .map(|line| format!("{}\n", line))
            .collect::<String>();
        Self::new(Reply::Respond(
            Response::new(200, "OK", body).with_header("Content-Type", "application/json"),
        ))
    }

    pub fn status(status: u16, status_text: &str) -> Arc<Self> {
        Self::new(Reply::Respond(Response::new(
            status,
            status_text,
            "{\"Message\":\"failed\",\"Code\":0,\"Type\":\"error\"}",
        )))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Whether an in-flight request was torn down
    pub fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpEngine for MockDaemon {
    async fn execute(
        &self,
        request: HttpRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<Response, NetworkFailure> {
        let size = request.body.as_ref().map_or(0, |body| body.len() as u64);
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        if let Some(progress) = progress {
            progress(Progress::new(size, size / 2));
            progress(Progress::new(size, size));
        }

        match &self.reply {
            Reply::Respond(response) => Ok(response.clone().with_url(url)),
            Reply::Fail(message) => Err(NetworkFailure::new(message.clone())),
            Reply::Hang => {
                let _flag = DropFlag(self.dropped.clone());
                futures::future::pending().await
            }
        }
    }
}

pub fn client(daemon: Arc<MockDaemon>) -> StorageClient {
    StorageClient::with_engine(ClientConfig::default(), daemon).unwrap()
}

#[derive(Debug)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Decode the multipart body of a recorded request
pub async fn parts(request: &HttpRequest) -> Vec<Part> {
    let content_type = request.header("Content-Type").unwrap();
    let boundary = multer::parse_boundary(content_type).unwrap();
    let body = request.body.clone().unwrap();
    let mut multipart =
        multer::Multipart::new(stream::iter(vec![Ok::<_, Infallible>(body)]), boundary);

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .file_name()
            .map(|filename| urlencoding::decode(filename).unwrap().into_owned());
        let content_type = field.content_type().map(|mime| mime.to_string());
        let headers = field
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap().to_string(),
                )
            })
            .collect();
        let data = field.bytes().await.unwrap().to_vec();
        parts.push(Part {
            name,
            filename,
            content_type,
            headers,
            data,
        });
    }
    parts
}
