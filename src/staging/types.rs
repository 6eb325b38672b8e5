use crate::types::Mode;
use chrono::{DateTime, Utc};

/// Whether a lookup may create the missing entry, and with which options
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Create<O> {
    /// Fail with `NotFound` when the entry is missing
    #[default]
    No,
    /// Create the entry with default options
    Default,
    /// Create the entry with the given options
    With(O),
}

impl<O: Default> Create<O> {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Create::No)
    }

    /// Options for the entry to create, `None` when creation is disabled
    pub fn into_options(self) -> Option<O> {
        match self {
            Create::No => None,
            Create::Default => Some(O::default()),
            Create::With(options) => Some(options),
        }
    }
}

impl<O> From<bool> for Create<O> {
    fn from(create: bool) -> Self {
        if create {
            Create::Default
        } else {
            Create::No
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryOptions {
    pub mode: Option<Mode>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Default hash algorithm for descendants. Recorded only: the add
    /// endpoint takes its hashing options per request, through `PutOptions`.
    pub hash_alg: Option<String>,
}

impl DirectoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: impl Into<Mode>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn hash_alg(mut self, hash_alg: impl Into<String>) -> Self {
        self.hash_alg = Some(hash_alg.into());
        self
    }
}

/// Options of a staged file
///
/// `mode`, `last_modified` and `content_type` are encoded with the file's
/// part. The hashing hints (`hash_alg`, `raw_leaves`, `chunker`,
/// `cid_version`) are kept with the entry for callers to read back; uploads
/// take those settings from `PutOptions`, which apply to the whole request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileOptions {
    pub mode: Option<Mode>,
    pub last_modified: Option<DateTime<Utc>>,
    pub hash_alg: Option<String>,
    pub raw_leaves: bool,
    pub chunker: Option<String>,
    pub cid_version: Option<u8>,
    pub content_type: Option<String>,
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: impl Into<Mode>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn hash_alg(mut self, hash_alg: impl Into<String>) -> Self {
        self.hash_alg = Some(hash_alg.into());
        self
    }

    pub fn raw_leaves(mut self, raw_leaves: bool) -> Self {
        self.raw_leaves = raw_leaves;
        self
    }

    pub fn chunker(mut self, chunker: impl Into<String>) -> Self {
        self.chunker = Some(chunker.into());
        self
    }

    pub fn cid_version(mut self, cid_version: u8) -> Self {
        self.cid_version = Some(cid_version);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub offset: u64,
    pub truncate: bool,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateDirectoryOptions {
    /// Create missing intermediate directories
    pub parents: bool,
    pub directory: DirectoryOptions,
}

impl CreateDirectoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parents(mut self, parents: bool) -> Self {
        self.parents = parents;
        self
    }

    pub fn directory(mut self, directory: DirectoryOptions) -> Self {
        self.directory = directory;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteFileOptions {
    /// Create missing intermediate directories
    pub parents: bool,
    pub create: Create<FileOptions>,
    pub write: WriteOptions,
}

impl WriteFileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parents(mut self, parents: bool) -> Self {
        self.parents = parents;
        self
    }

    pub fn create(mut self, create: impl Into<Create<FileOptions>>) -> Self {
        self.create = create.into();
        self
    }

    pub fn create_with(mut self, options: FileOptions) -> Self {
        self.create = Create::With(options);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.write.offset = offset;
        self
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.write.truncate = truncate;
        self
    }
}
