//! Files and directories held by the staging tree

use crate::error::{EntryKind, Result, StorageError};
use crate::staging::stat::{StatContext, StatFuture};
use crate::staging::types::{DirectoryOptions, FileOptions, WriteOptions};
use crate::types::Blob;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::Arc;

/// Index of a directory in its staging tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectoryId(pub(crate) usize);

/// Index of a file in its staging tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryId {
    Directory(DirectoryId),
    File(FileId),
}

impl EntryId {
    pub(crate) fn index(&self) -> usize {
        match self {
            EntryId::Directory(DirectoryId(index)) | EntryId::File(FileId(index)) => *index,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            EntryId::Directory(_) => EntryKind::Directory,
            EntryId::File(_) => EntryKind::File,
        }
    }
}

impl From<DirectoryId> for EntryId {
    fn from(id: DirectoryId) -> Self {
        EntryId::Directory(id)
    }
}

impl From<FileId> for EntryId {
    fn from(id: FileId) -> Self {
        EntryId::File(id)
    }
}

/// Capabilities shared by both entry kinds
pub trait StagedEntry {
    fn name(&self) -> &str;
    fn parent(&self) -> Option<DirectoryId>;
    fn kind(&self) -> EntryKind;
}

#[derive(Debug)]
pub struct FileEntry {
    parent: DirectoryId,
    name: String,
    content: Blob,
    pub options: FileOptions,
    stat: Arc<StatContext>,
}

impl FileEntry {
    pub(crate) fn new(parent: DirectoryId, name: String, options: FileOptions) -> Self {
        let content_type = options.content_type.clone().unwrap_or_default();
        Self {
            parent,
            name,
            content: Blob::new(Bytes::new(), content_type),
            options,
            stat: Arc::new(StatContext::new()),
        }
    }

    pub fn content(&self) -> &Blob {
        &self.content
    }

    pub fn size(&self) -> u64 {
        self.content.size()
    }

    pub fn content_type(&self) -> &str {
        self.content.content_type()
    }

    /// Write `content` at `options.offset`
    ///
    /// Writing at the current size appends, writing inside the content
    /// overwrites the covered bytes and keeps the tail. The content is always
    /// replaced by a new buffer, never mutated in place.
    pub fn write(&mut self, content: impl Into<Bytes>, options: WriteOptions) -> Result<()> {
        let content = content.into();
        let blob = if options.truncate {
            Bytes::new()
        } else {
            self.content.bytes().clone()
        };

        let size = blob.len() as u64;
        let offset = options.offset;
        if offset > size {
            return Err(StorageError::out_of_bounds(offset, size));
        }

        let offset = offset as usize;
        let end = offset + content.len();
        let data = if blob.is_empty() {
            content
        } else {
            let tail = if blob.len() > end {
                &blob[end..]
            } else {
                &[][..]
            };
            let mut data = BytesMut::with_capacity(offset + content.len() + tail.len());
            data.extend_from_slice(&blob[..offset]);
            data.extend_from_slice(&content);
            data.extend_from_slice(tail);
            data.freeze()
        };

        self.content = Blob::new(data, self.content.content_type().to_string());
        Ok(())
    }

    /// Read-only view of `start..end` (end defaults to the content size)
    pub fn slice(&self, start: u64, end: Option<u64>, content_type: Option<&str>) -> Blob {
        self.content.slice(start, end, content_type)
    }

    /// Future resolving once an upload of this file completes
    pub fn stat(&self) -> StatFuture {
        StatFuture::new(self.stat.clone())
    }

    /// Fulfil the pending stat result; later calls are ignored
    pub fn complete_stat(&self, result: Result<crate::upload::types::UploadResult>) -> bool {
        self.stat.complete(result)
    }

    pub fn is_stat_completed(&self) -> bool {
        self.stat.is_completed()
    }
}

impl StagedEntry for FileEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<DirectoryId> {
        Some(self.parent)
    }

    fn kind(&self) -> EntryKind {
        EntryKind::File
    }
}

#[derive(Debug)]
pub struct DirectoryEntry {
    parent: Option<DirectoryId>,
    name: String,
    index: HashMap<String, EntryId>,
    order: Vec<EntryId>,
    pub options: DirectoryOptions,
}

impl DirectoryEntry {
    pub(crate) fn new(parent: Option<DirectoryId>, name: String, options: DirectoryOptions) -> Self {
        Self {
            parent,
            name,
            index: HashMap::new(),
            order: Vec::new(),
            options,
        }
    }

    pub fn get(&self, name: &str) -> Option<EntryId> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Children in insertion order
    pub fn entries(&self) -> &[EntryId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, id: EntryId) {
        debug_assert!(!self.index.contains_key(&name));
        self.index.insert(name, id);
        self.order.push(id);
    }
}

impl StagedEntry for DirectoryEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<DirectoryId> {
        self.parent
    }

    fn kind(&self) -> EntryKind {
        EntryKind::Directory
    }
}

#[derive(Debug)]
pub enum Entry {
    Directory(DirectoryEntry),
    File(FileEntry),
}

impl Entry {
    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryEntry> {
        match self {
            Entry::Directory(directory) => Some(directory),
            Entry::File(_) => None,
        }
    }
}

impl StagedEntry for Entry {
    fn name(&self) -> &str {
        match self {
            Entry::Directory(directory) => directory.name(),
            Entry::File(file) => file.name(),
        }
    }

    fn parent(&self) -> Option<DirectoryId> {
        match self {
            Entry::Directory(directory) => directory.parent(),
            Entry::File(file) => file.parent(),
        }
    }

    fn kind(&self) -> EntryKind {
        match self {
            Entry::Directory(_) => EntryKind::Directory,
            Entry::File(_) => EntryKind::File,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> FileEntry {
        FileEntry::new(DirectoryId(0), "f".to_string(), FileOptions::default())
    }

    fn at(offset: u64) -> WriteOptions {
        WriteOptions::new().offset(offset)
    }

    #[test]
    fn test_write_into_empty_file() {
        let mut f = file();
        f.write(&b"hello"[..], at(0)).unwrap();
        assert_eq!(f.content().bytes().as_ref(), b"hello");
        assert_eq!(f.size(), 5);
    }

    #[test]
    fn test_write_truncate_replaces() {
        let mut f = file();
        f.write(&b"first content"[..], at(0)).unwrap();
        f.write(&b"second"[..], at(0).truncate(true)).unwrap();
        assert_eq!(f.content().bytes().as_ref(), b"second");
    }

    #[test]
    fn test_write_splice_append_and_bounds() {
        let mut f = file();
        f.write(&b"ABCDE"[..], at(0)).unwrap();

        f.write(&b"xy"[..], at(1)).unwrap();
        assert_eq!(f.content().bytes().as_ref(), b"AxyDE");

        f.write(&b"z"[..], at(5)).unwrap();
        assert_eq!(f.content().bytes().as_ref(), b"AxyDEz");

        match f.write(&b"q"[..], at(7)) {
            Err(StorageError::OutOfBounds { offset, size }) => {
                assert_eq!(offset, 7);
                assert_eq!(size, 6);
            }
            other => panic!("Expected OutOfBounds, got {:?}", other),
        }
        assert_eq!(f.content().bytes().as_ref(), b"AxyDEz");
    }

    #[test]
    fn test_write_past_tail_extends() {
        let mut f = file();
        f.write(&b"ABC"[..], at(0)).unwrap();
        f.write(&b"xyz"[..], at(2)).unwrap();
        assert_eq!(f.content().bytes().as_ref(), b"ABxyz");
    }

    #[test]
    fn test_write_keeps_previous_buffer_intact() {
        let mut f = file();
        f.write(&b"ABCDE"[..], at(0)).unwrap();
        let before = f.content().clone();
        f.write(&b"zz"[..], at(0)).unwrap();

        assert_eq!(before.bytes().as_ref(), b"ABCDE");
        assert_eq!(f.content().bytes().as_ref(), b"zzCDE");
    }

    #[test]
    fn test_write_keeps_content_type() {
        let mut f = FileEntry::new(
            DirectoryId(0),
            "page.html".to_string(),
            FileOptions::new().content_type("text/html"),
        );
        f.write(&b"<p>"[..], at(0)).unwrap();
        assert_eq!(f.content_type(), "text/html");
        assert_eq!(f.slice(1, None, None).bytes().as_ref(), b"p>");
        assert_eq!(f.slice(0, Some(1), None).content_type(), "text/html");
    }

    #[test]
    fn test_directory_insertion_order() {
        let mut dir = DirectoryEntry::new(None, String::new(), DirectoryOptions::default());
        dir.insert("b".to_string(), EntryId::File(FileId(2)));
        dir.insert("a".to_string(), EntryId::Directory(DirectoryId(1)));

        assert_eq!(
            dir.entries(),
            &[EntryId::File(FileId(2)), EntryId::Directory(DirectoryId(1))]
        );
        assert_eq!(dir.get("a"), Some(EntryId::Directory(DirectoryId(1))));
        assert!(dir.get("c").is_none());
        assert_eq!(dir.kind(), EntryKind::Directory);
    }
}
