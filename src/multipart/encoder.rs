//! multipart/form-data encoding
//!
//! Every part starts with its own `--boundary` line, consecutive parts are
//! separated by a line break and the body ends with the closing
//! `--boundary--` line.

use crate::error::{Result, StorageError};
use crate::multipart::boundary::{BoundarySource, RandomBoundary};
use crate::types::{Blob, File};
use bytes::{Bytes, BytesMut};
use log::trace;

const CRLF: &[u8] = b"\r\n";

/// Content type sent for blobs that do not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Percent-encode a filename, leaving `!'()*` as they are
fn encode_filename(filename: &str) -> String {
    let mut encoded = urlencoding::encode(filename).into_owned();
    let marks = [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")];
    for (escaped, literal) in marks {
        encoded = encoded.replace(escaped, literal);
    }
    encoded
}

/// Line breaks would end the part's header block early
fn check_header_text(parameter: &str, text: &str) -> Result<()> {
    if text.contains(['\r', '\n']) {
        return Err(StorageError::invalid_parameter(
            parameter,
            format!("Line break in multipart header text {:?}", text),
        ));
    }
    Ok(())
}

/// Body of one part
#[derive(Debug, Clone)]
pub enum PartContent {
    /// Raw bytes; no content type is synthesized for them
    Bytes(Bytes),
    Blob(Blob),
    /// A blob whose recorded path or name becomes the default filename
    File(File),
}

impl PartContent {
    fn filename(&self) -> Option<&str> {
        match self {
            PartContent::File(file) => file.filename(),
            PartContent::Bytes(_) | PartContent::Blob(_) => None,
        }
    }

    fn blob(&self) -> Option<&Blob> {
        match self {
            PartContent::Bytes(_) => None,
            PartContent::Blob(blob) => Some(blob),
            PartContent::File(file) => Some(&file.blob),
        }
    }

    fn bytes(&self) -> &Bytes {
        match self {
            PartContent::Bytes(bytes) => bytes,
            PartContent::Blob(blob) => blob.bytes(),
            PartContent::File(file) => file.blob.bytes(),
        }
    }
}

impl From<Bytes> for PartContent {
    fn from(bytes: Bytes) -> Self {
        PartContent::Bytes(bytes)
    }
}

impl From<&'static [u8]> for PartContent {
    fn from(bytes: &'static [u8]) -> Self {
        PartContent::Bytes(Bytes::from_static(bytes))
    }
}

impl From<Blob> for PartContent {
    fn from(blob: Blob) -> Self {
        PartContent::Blob(blob)
    }
}

impl From<File> for PartContent {
    fn from(file: File) -> Self {
        PartContent::File(file)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartOptions {
    pub filename: Option<String>,
    /// Extra header lines, emitted in order
    pub headers: Vec<(String, String)>,
}

impl PartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(header, _)| header.eq_ignore_ascii_case(name))
    }
}

pub struct MultipartEncoder {
    boundary: String,
    parts: Vec<Bytes>,
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartEncoder {
    /// Create an encoder with a random boundary
    pub fn new() -> Self {
        Self::with_boundary_source(&RandomBoundary::default())
    }

    pub fn with_boundary_source(source: &dyn BoundarySource) -> Self {
        Self::with_boundary(source.boundary())
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// MIME type of the encoded body
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append one part; earlier parts are never revisited
    ///
    /// Fails with `InvalidParameter`, leaving the encoder untouched, when the
    /// field name or a header contains a line break.
    pub fn append(
        &mut self,
        name: &str,
        content: impl Into<PartContent>,
        options: PartOptions,
    ) -> Result<()> {
        check_header_text("name", name)?;
        for (header, value) in &options.headers {
            check_header_text("header", header)?;
            check_header_text(header, value)?;
        }

        let content = content.into();
        let filename = options
            .filename
            .as_deref()
            .or_else(|| content.filename());

        let disposition = match filename {
            Some(filename) => format!(
                "form-data; name=\"{}\"; filename=\"{}\"",
                name,
                encode_filename(filename)
            ),
            None => format!("form-data; name=\"{}\"", name),
        };

        let body = content.bytes();
        let mut part = BytesMut::with_capacity(body.len() + 256);
        part.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        part.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());

        if !options.has_header("Content-Type") {
            if let Some(blob) = content.blob() {
                let content_type = match blob.content_type() {
                    "" => DEFAULT_CONTENT_TYPE,
                    content_type => content_type,
                };
                check_header_text("content_type", content_type)?;
                part.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
        }

        for (header, value) in &options.headers {
            part.extend_from_slice(format!("{}: {}\r\n", header, value).as_bytes());
        }

        part.extend_from_slice(CRLF);
        part.extend_from_slice(body);

        trace!(
            "encoded part {:?} ({} body bytes, filename {:?})",
            name,
            body.len(),
            filename
        );
        self.parts.push(part.freeze());
        Ok(())
    }

    /// Concatenate the parts into the final body
    pub fn to_blob(&self) -> Blob {
        let size: usize = self.parts.iter().map(|part| part.len() + CRLF.len()).sum();
        let mut body = BytesMut::with_capacity(size + self.boundary.len() + 8);

        for (index, part) in self.parts.iter().enumerate() {
            if index > 0 {
                body.extend_from_slice(CRLF);
            }
            body.extend_from_slice(part);
        }

        if !self.parts.is_empty() {
            body.extend_from_slice(CRLF);
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        Blob::new(body.freeze(), self.content_type())
    }
}

impl std::fmt::Debug for MultipartEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartEncoder")
            .field("boundary", &self.boundary)
            .field("parts", &self.parts.len())
            .finish()
    }
}
