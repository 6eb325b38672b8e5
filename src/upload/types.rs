use crate::error::{Result, StorageError};
use crate::transport::{Progress, ProgressCallback};
use crate::types::Cid;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options of an add request
#[derive(Clone, Default)]
pub struct PutOptions {
    pub chunker: Option<String>,
    pub cid_version: Option<u8>,
    pub hash_alg: Option<String>,
    pub only_hash: bool,
    pub pin: bool,
    pub raw_leaves: bool,
    pub trickle: bool,
    pub wrap_with_directory: bool,
    pub timeout: Option<Duration>,
    pub signal: Option<CancellationToken>,
    pub progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for PutOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutOptions")
            .field("chunker", &self.chunker)
            .field("cid_version", &self.cid_version)
            .field("hash_alg", &self.hash_alg)
            .field("only_hash", &self.only_hash)
            .field("pin", &self.pin)
            .field("raw_leaves", &self.raw_leaves)
            .field("trickle", &self.trickle)
            .field("wrap_with_directory", &self.wrap_with_directory)
            .field("timeout", &self.timeout)
            .field("signal", &self.signal.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunker(mut self, chunker: impl Into<String>) -> Self {
        self.chunker = Some(chunker.into());
        self
    }

    pub fn cid_version(mut self, cid_version: u8) -> Self {
        self.cid_version = Some(cid_version);
        self
    }

    pub fn hash_alg(mut self, hash_alg: impl Into<String>) -> Self {
        self.hash_alg = Some(hash_alg.into());
        self
    }

    pub fn only_hash(mut self, only_hash: bool) -> Self {
        self.only_hash = only_hash;
        self
    }

    pub fn pin(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    pub fn raw_leaves(mut self, raw_leaves: bool) -> Self {
        self.raw_leaves = raw_leaves;
        self
    }

    pub fn trickle(mut self, trickle: bool) -> Self {
        self.trickle = trickle;
        self
    }

    pub fn wrap_with_directory(mut self, wrap_with_directory: bool) -> Self {
        self.wrap_with_directory = wrap_with_directory;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(cid_version) = self.cid_version {
            if cid_version > 1 {
                return Err(StorageError::invalid_parameter(
                    "cid_version",
                    "CID version must be 0 or 1",
                ));
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(StorageError::invalid_parameter(
                    "timeout",
                    "Timeout must be greater than 0",
                ));
            }
        }

        if matches!(self.chunker.as_deref(), Some(chunker) if chunker.trim().is_empty()) {
            return Err(StorageError::invalid_parameter(
                "chunker",
                "Chunker cannot be blank",
            ));
        }

        Ok(())
    }

    /// Query parameters of the add endpoint, `stream-channels` first
    ///
    /// Flags are only sent when set; a CID version of 0 is the daemon's
    /// default and is left out.
    pub fn search_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("stream-channels".to_string(), "true".to_string())];
        let mut flag = |name: &str, enabled: bool| {
            if enabled {
                params.push((name.to_string(), "true".to_string()));
            }
        };

        flag("progress", self.progress.is_some());
        flag("trickle", self.trickle);
        flag("only-hash", self.only_hash);
        flag("wrap-with-directory", self.wrap_with_directory);

        if let Some(chunker) = self.chunker.as_deref().filter(|c| !c.is_empty()) {
            params.push(("chunker".to_string(), chunker.to_string()));
        }
        if self.pin {
            params.push(("pin".to_string(), "true".to_string()));
        }
        if self.raw_leaves {
            params.push(("raw-leaves".to_string(), "true".to_string()));
        }
        if let Some(cid_version) = self.cid_version.filter(|v| *v > 0) {
            params.push(("cid-version".to_string(), cid_version.to_string()));
        }
        if let Some(hash_alg) = self.hash_alg.as_deref().filter(|h| !h.is_empty()) {
            params.push(("hashAlg".to_string(), hash_alg.to_string()));
        }

        params
    }
}

/// One file added by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub path: String,
    pub size: u64,
    pub cid: Cid,
}

impl UploadResult {
    pub fn new(path: impl Into<String>, size: u64, cid: Cid) -> Self {
        Self {
            path: path.into(),
            size,
            cid,
        }
    }
}

/// `Size` is a decimal string, though some daemons send a number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SizeField {
    Text(String),
    Number(u64),
}

/// One line of the add endpoint's response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddEntry {
    #[serde(rename = "Hash")]
    pub hash: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Size")]
    pub size: Option<SizeField>,
    /// Bytes processed so far, set on progress lines
    #[serde(rename = "Bytes")]
    pub bytes: Option<u64>,
}

impl AddEntry {
    /// Whether this line reports progress rather than an added file
    pub fn is_progress(&self) -> bool {
        self.hash.is_none()
    }

    pub fn into_result(self) -> Result<UploadResult> {
        let hash = self.hash.ok_or_else(|| {
            StorageError::invalid_response(format!("entry \"{}\" has no hash", self.name))
        })?;
        let cid: Cid = hash
            .parse()
            .map_err(|e| StorageError::invalid_response(format!("{}: {:?}", e, hash)))?;

        let size = match self.size {
            Some(SizeField::Number(size)) => size,
            Some(SizeField::Text(size)) => size.trim().parse::<u64>().map_err(|_| {
                StorageError::invalid_response(format!(
                    "entry \"{}\" has invalid size {:?}",
                    self.name, size
                ))
            })?,
            None => {
                return Err(StorageError::invalid_response(format!(
                    "entry \"{}\" has no size",
                    self.name
                )))
            }
        };

        Ok(UploadResult::new(self.name, size, cid))
    }
}
