//! Add endpoint operations

use crate::error::{Result, StorageError};
use crate::multipart::{BoundarySource, MultipartEncoder, PartOptions, RandomBoundary};
use crate::staging::{EntryId, FileId, StagingTree};
use crate::transport::{Method, RequestOptions, Transport};
use crate::types::{split_mtime, File};
use crate::upload::types::{AddEntry, PutOptions, UploadResult};
use bytesize::ByteSize;
use log::{debug, trace, warn};
use std::sync::Arc;

/// Resource of the add endpoint, relative to the base URL
pub const ADD_RESOURCE: &str = "add";

/// Decode the newline-delimited JSON body of the add endpoint
///
/// Blank lines and progress lines (no `Hash`) are skipped; every other line
/// must decode into an added entry or the whole response is rejected.
pub fn parse_add_response(text: &str) -> Result<Vec<UploadResult>> {
    let mut results = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let entry: AddEntry = serde_json::from_str(line)?;
        if entry.is_progress() {
            trace!(
                "skipping progress line for {:?} ({:?} bytes)",
                entry.name,
                entry.bytes
            );
            continue;
        }
        results.push(entry.into_result()?);
    }
    Ok(results)
}

/// Client of the daemon's add endpoint
#[derive(Clone)]
pub struct UploadService {
    transport: Transport,
    boundary: Arc<dyn BoundarySource>,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("transport", &self.transport)
            .finish()
    }
}

impl UploadService {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            boundary: Arc::new(RandomBoundary::default()),
        }
    }

    /// Replace the source of multipart boundaries
    pub fn with_boundary_source(mut self, boundary: Arc<dyn BoundarySource>) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Upload several files in one request
    ///
    /// # Arguments
    ///
    /// * `files` - The files to add, one `file` part each
    /// * `options` - Add options
    ///
    /// # Returns
    ///
    /// One result per line reported by the daemon, in reporting order
    pub async fn put_all(&self, files: &[File], options: &PutOptions) -> Result<Vec<UploadResult>> {
        options.validate()?;
        if files.is_empty() {
            return Err(StorageError::invalid_parameter(
                "files",
                "At least one file is required",
            ));
        }

        let mut encoder = MultipartEncoder::with_boundary_source(self.boundary.as_ref());
        for file in files {
            let (secs, nsecs) = split_mtime(&file.last_modified);
            encoder.append(
                "file",
                file.clone(),
                PartOptions::new()
                    .header("mtime", secs.to_string())
                    .header("mtime-nsecs", nsecs.to_string()),
            )?;
        }

        self.add(encoder, options).await
    }

    /// Upload one file
    ///
    /// # Returns
    ///
    /// The first result reported by the daemon; an empty report is an error
    pub async fn put(&self, file: &File, options: &PutOptions) -> Result<UploadResult> {
        let results = self.put_all(std::slice::from_ref(file), options).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::upload_error("Daemon reported no added entries"))
    }

    /// Upload a whole staging tree in one request
    ///
    /// Each staged file's pending [`crate::staging::StatFuture`] resolves
    /// with the result whose path matches the file's full path. When the
    /// tree cannot be encoded or the request fails, every pending handle
    /// fails with the same error.
    pub async fn put_tree(
        &self,
        tree: &StagingTree,
        options: &PutOptions,
    ) -> Result<Vec<UploadResult>> {
        options.validate()?;
        if tree.is_empty() {
            return Err(StorageError::invalid_parameter(
                "tree",
                "The staging tree is empty",
            ));
        }

        let files: Vec<(String, FileId)> = tree
            .iter()
            .filter_map(|entry| match entry.id() {
                EntryId::File(id) => Some((entry.path(), id)),
                EntryId::Directory(_) => None,
            })
            .collect();

        let mut encoder = MultipartEncoder::with_boundary_source(self.boundary.as_ref());
        let sent = match encoder.append_tree(tree) {
            Ok(()) => self.add(encoder, options).await,
            Err(e) => Err(e),
        };

        let results = match sent {
            Ok(results) => results,
            Err(e) => {
                for (_, id) in &files {
                    tree.file(*id).complete_stat(Err(e.clone()));
                }
                return Err(e);
            }
        };

        for (path, id) in &files {
            let outcome = results
                .iter()
                .find(|result| &result.path == path)
                .cloned()
                .ok_or_else(|| {
                    StorageError::upload_error(format!("Daemon reported no entry for {}", path))
                });
            if let Err(e) = &outcome {
                warn!("{}", e);
            }
            tree.file(*id).complete_stat(outcome);
        }

        Ok(results)
    }

    async fn add(&self, encoder: MultipartEncoder, options: &PutOptions) -> Result<Vec<UploadResult>> {
        let parts = encoder.len();
        let body = encoder.to_blob();
        debug!("adding {} parts ({})", parts, ByteSize(body.size()));

        let mut request = RequestOptions::new()
            .method(Method::Post)
            .header("Content-Type", body.content_type())
            .body(body.into_bytes())
            .progress_callback(options.progress.clone());
        for (name, value) in options.search_params() {
            request = request.search_param(name, value);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        if let Some(signal) = &options.signal {
            request = request.signal(signal.clone());
        }

        let response = self.transport.send(ADD_RESOURCE, request).await?;
        if !response.ok() {
            let message = if response.status_text.is_empty() {
                format!("Request failed with status {}", response.status)
            } else {
                response.status_text.clone()
            };
            warn!("add failed: {}", message);
            return Err(StorageError::upload_error(message));
        }

        let results = parse_add_response(&response.text())?;
        debug!("daemon added {} entries", results.len());
        Ok(results)
    }
}
