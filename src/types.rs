//! Type-safe wrappers for the values exchanged with the storage daemon

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Content Identifier (CID) issued by the storage daemon
///
/// The client never derives or inspects CIDs; it only carries the hash
/// string the daemon reported, so equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Creates a new CID from a string without validation
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    /// Returns the CID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the CID and returns the inner String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CidError::Empty);
        }

        if s.chars().any(char::is_whitespace) {
            return Err(CidError::InvalidFormat(
                "CID must not contain whitespace".into(),
            ));
        }

        Ok(Cid(s.to_string()))
    }
}

impl Display for Cid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Cid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CidError {
    Empty,
    InvalidFormat(String),
}

impl fmt::Display for CidError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CidError::Empty => write!(f, "CID is empty"),
            CidError::InvalidFormat(msg) => write!(f, "Invalid CID format: {}", msg),
        }
    }
}

impl std::error::Error for CidError {}

/// Immutable bytes with a declared content type
///
/// Cloning and slicing share the underlying buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    content_type: String,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Returns a read-only view of `start..end`
    ///
    /// Out-of-range bounds are clamped to the blob size and an inverted range
    /// yields an empty blob.
    pub fn slice(&self, start: u64, end: Option<u64>, content_type: Option<&str>) -> Blob {
        let size = self.size();
        let start = start.min(size) as usize;
        let end = end.unwrap_or(size).min(size) as usize;
        let data = if end > start {
            self.data.slice(start..end)
        } else {
            Bytes::new()
        };

        Blob {
            data,
            content_type: content_type
                .map(str::to_string)
                .unwrap_or_else(|| self.content_type.clone()),
        }
    }
}

impl From<Bytes> for Blob {
    fn from(data: Bytes) -> Self {
        Blob::new(data, "")
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Blob::new(data, "")
    }
}

impl From<&'static [u8]> for Blob {
    fn from(data: &'static [u8]) -> Self {
        Blob::new(Bytes::from_static(data), "")
    }
}

impl From<&'static str> for Blob {
    fn from(data: &'static str) -> Self {
        Blob::new(Bytes::from_static(data.as_bytes()), "")
    }
}

/// A named blob as handed to `put`/`put_all`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub blob: Blob,
    pub name: String,
    /// Relative path recorded for the file, preferred over `name` as filename
    pub path: Option<String>,
    pub last_modified: DateTime<Utc>,
}

impl File {
    pub fn new(blob: impl Into<Blob>, name: impl Into<String>) -> Self {
        Self {
            blob: blob.into(),
            name: name.into(),
            path: None,
            last_modified: Utc::now(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// The filename recorded for this file: its path when set, else its name
    pub fn filename(&self) -> Option<&str> {
        self.path
            .as_deref()
            .filter(|path| !path.is_empty())
            .or(Some(self.name.as_str()).filter(|name| !name.is_empty()))
    }

    pub fn size(&self) -> u64 {
        self.blob.size()
    }
}

/// File mode, either numeric or an already serialized string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mode {
    Numeric(u32),
    Text(String),
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Numeric(mode) => write!(f, "{:04o}", mode),
            Mode::Text(mode) => write!(f, "{}", mode),
        }
    }
}

impl From<u32> for Mode {
    fn from(mode: u32) -> Self {
        Mode::Numeric(mode)
    }
}

impl From<&str> for Mode {
    fn from(mode: &str) -> Self {
        Mode::Text(mode.to_string())
    }
}

/// Splits a timestamp into the `(mtime, mtime-nsecs)` header values
///
/// Seconds are floor-divided so instants before the epoch keep a
/// non-negative nanosecond remainder.
pub fn split_mtime(time: &DateTime<Utc>) -> (i64, u32) {
    let millis = time.timestamp_millis();
    let secs = millis.div_euclid(1000);
    let nsecs = (millis.rem_euclid(1000) as u32) * 1_000_000;
    (secs, nsecs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cid_from_str_valid() {
        let cid = Cid::from_str("QmYwAPJzv5CZsnA").unwrap();
        assert_eq!(cid.as_str(), "QmYwAPJzv5CZsnA");
        assert_eq!(cid, Cid::new("QmYwAPJzv5CZsnA"));
    }

    #[test]
    fn test_cid_from_str_invalid() {
        assert_eq!(Cid::from_str("  "), Err(CidError::Empty));
        assert!(Cid::from_str("Qm a").is_err());
    }

    #[test]
    fn test_cid_display() {
        let cid = Cid::new("bafybeigdyrzt");
        assert_eq!(cid.to_string(), "bafybeigdyrzt");
    }

    #[test]
    fn test_blob_slice_clamps() {
        let blob = Blob::new(&b"ABCDE"[..], "text/plain");
        assert_eq!(blob.slice(1, Some(3), None).bytes().as_ref(), b"BC");
        assert_eq!(blob.slice(3, None, None).bytes().as_ref(), b"DE");
        assert_eq!(blob.slice(2, Some(100), None).bytes().as_ref(), b"CDE");
        assert!(blob.slice(4, Some(2), None).is_empty());
        assert_eq!(blob.slice(0, None, None).content_type(), "text/plain");
        assert_eq!(
            blob.slice(0, None, Some("application/json")).content_type(),
            "application/json"
        );
    }

    #[test]
    fn test_file_filename_prefers_path() {
        let file = File::new("abc", "a.txt");
        assert_eq!(file.filename(), Some("a.txt"));

        let file = file.path("docs/a.txt");
        assert_eq!(file.filename(), Some("docs/a.txt"));

        let nameless = File::new("abc", "");
        assert_eq!(nameless.filename(), None);
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(Mode::Numeric(0o644).to_string(), "0644");
        assert_eq!(Mode::Numeric(0o7).to_string(), "0007");
        assert_eq!(Mode::Numeric(0o100755).to_string(), "100755");
        assert_eq!(Mode::from("0755").to_string(), "0755");
    }

    #[test]
    fn test_split_mtime() {
        let time = Utc.timestamp_millis_opt(1_600_000_000_123).unwrap();
        assert_eq!(split_mtime(&time), (1_600_000_000, 123_000_000));

        let before_epoch = Utc.timestamp_millis_opt(-1).unwrap();
        assert_eq!(split_mtime(&before_epoch), (-1, 999_000_000));
    }
}
