//! The in-memory staging tree
//!
//! Entries live in an arena owned by [`StagingTree`] and refer to their
//! parent by index, so full paths are computed on demand from the parent
//! chain instead of being memoized on the entry.

use crate::error::{EntryKind, Result, StorageError};
use crate::staging::entry::{
    DirectoryEntry, DirectoryId, Entry, EntryId, FileEntry, FileId, StagedEntry,
};
use crate::staging::path;
use crate::staging::stat::StatFuture;
use crate::staging::types::{
    Create, CreateDirectoryOptions, DirectoryOptions, FileOptions, WriteFileOptions,
};
use bytes::Bytes;
use log::trace;

#[derive(Debug)]
pub struct StagingTree {
    nodes: Vec<Entry>,
}

impl Default for StagingTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StagingTree {
    /// Create a tree holding only the unnamed root directory
    pub fn new() -> Self {
        Self {
            nodes: vec![Entry::Directory(DirectoryEntry::new(
                None,
                String::new(),
                DirectoryOptions::default(),
            ))],
        }
    }

    pub fn root(&self) -> DirectoryId {
        DirectoryId(0)
    }

    pub fn entry(&self, id: impl Into<EntryId>) -> &Entry {
        &self.nodes[id.into().index()]
    }

    pub fn directory(&self, id: DirectoryId) -> &DirectoryEntry {
        match &self.nodes[id.0] {
            Entry::Directory(directory) => directory,
            Entry::File(_) => unreachable!("directory id {} refers to a file", id.0),
        }
    }

    pub fn file(&self, id: FileId) -> &FileEntry {
        match &self.nodes[id.0] {
            Entry::File(file) => file,
            Entry::Directory(_) => unreachable!("file id {} refers to a directory", id.0),
        }
    }

    pub fn file_mut(&mut self, id: FileId) -> &mut FileEntry {
        match &mut self.nodes[id.0] {
            Entry::File(file) => file,
            Entry::Directory(_) => unreachable!("file id {} refers to a directory", id.0),
        }
    }

    fn directory_mut(&mut self, id: DirectoryId) -> &mut DirectoryEntry {
        match &mut self.nodes[id.0] {
            Entry::Directory(directory) => directory,
            Entry::File(_) => unreachable!("directory id {} refers to a file", id.0),
        }
    }

    /// Full path of an entry, its ancestors' names joined with `/`
    ///
    /// The root has the empty path; its children have single-segment paths.
    pub fn path(&self, id: impl Into<EntryId>) -> String {
        let mut names = Vec::new();
        let mut current = Some(id.into());
        while let Some(id) = current {
            let entry = self.entry(id);
            if entry.parent().is_some() {
                names.push(entry.name());
            }
            current = entry.parent().map(EntryId::Directory);
        }
        names.reverse();
        path::join(&names)
    }

    /// Path of a directory as shown in error messages
    fn display_path(&self, id: DirectoryId) -> String {
        format!("/{}", self.path(id))
    }

    /// Number of entries below the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, parent: DirectoryId, name: &str, entry: Entry) -> EntryId {
        let index = self.nodes.len();
        let id = match entry {
            Entry::Directory(_) => EntryId::Directory(DirectoryId(index)),
            Entry::File(_) => EntryId::File(FileId(index)),
        };
        self.nodes.push(entry);
        self.directory_mut(parent).insert(name.to_string(), id);
        trace!("staged {} {:?}", id.kind(), self.path(id));
        id
    }

    /// Create a new empty directory `name` inside `parent`
    pub fn create_directory_in(
        &mut self,
        parent: DirectoryId,
        name: &str,
        options: DirectoryOptions,
    ) -> Result<DirectoryId> {
        if self.directory(parent).contains(name) {
            return Err(StorageError::existing_entry(
                self.display_path(parent),
                name,
            ));
        }

        let directory = DirectoryEntry::new(Some(parent), name.to_string(), options);
        match self.push(parent, name, Entry::Directory(directory)) {
            EntryId::Directory(id) => Ok(id),
            EntryId::File(_) => unreachable!(),
        }
    }

    /// Look up directory `name` inside `parent`, creating it if allowed
    ///
    /// An existing directory is returned unchanged, whatever options were
    /// passed for creation.
    pub fn get_directory_in(
        &mut self,
        parent: DirectoryId,
        name: &str,
        create: impl Into<Create<DirectoryOptions>>,
    ) -> Result<DirectoryId> {
        match self.directory(parent).get(name) {
            Some(EntryId::Directory(id)) => Ok(id),
            Some(EntryId::File(_)) => Err(StorageError::invalid_entry(
                self.display_path(parent),
                name,
                EntryKind::Directory,
                EntryKind::File,
            )),
            None => match create.into().into_options() {
                Some(options) => self.create_directory_in(parent, name, options),
                None => Err(StorageError::not_found(
                    self.display_path(parent),
                    name,
                    EntryKind::Directory,
                )),
            },
        }
    }

    /// Look up file `name` inside `parent`, creating it empty if allowed
    pub fn get_file_in(
        &mut self,
        parent: DirectoryId,
        name: &str,
        create: impl Into<Create<FileOptions>>,
    ) -> Result<FileId> {
        match self.directory(parent).get(name) {
            Some(EntryId::File(id)) => Ok(id),
            Some(EntryId::Directory(_)) => Err(StorageError::invalid_entry(
                self.display_path(parent),
                name,
                EntryKind::File,
                EntryKind::Directory,
            )),
            None => match create.into().into_options() {
                Some(options) => {
                    let file = FileEntry::new(parent, name.to_string(), options);
                    match self.push(parent, name, Entry::File(file)) {
                        EntryId::File(id) => Ok(id),
                        EntryId::Directory(_) => unreachable!(),
                    }
                }
                None => Err(StorageError::not_found(
                    self.display_path(parent),
                    name,
                    EntryKind::File,
                )),
            },
        }
    }

    /// Walk every segment but the last, returning the directory reached and
    /// the final segment name
    pub fn resolve(
        &mut self,
        from: DirectoryId,
        path: &str,
        create: impl Into<Create<DirectoryOptions>>,
    ) -> Result<(DirectoryId, String)> {
        let mut segments = path::split(path)?;
        let create = create.into();
        let name = segments.pop().unwrap_or_default();

        let mut directory = from;
        for segment in &segments {
            directory = self.get_directory_in(directory, segment, create.clone())?;
        }

        Ok((directory, name))
    }

    /// Like [`Self::resolve`] but never creates anything
    fn resolve_existing(&self, from: DirectoryId, segments: &[String]) -> Result<DirectoryId> {
        let mut directory = from;
        for segment in segments {
            directory = match self.directory(directory).get(segment) {
                Some(EntryId::Directory(id)) => id,
                Some(EntryId::File(_)) => {
                    return Err(StorageError::invalid_entry(
                        self.display_path(directory),
                        segment,
                        EntryKind::Directory,
                        EntryKind::File,
                    ))
                }
                None => {
                    return Err(StorageError::not_found(
                        self.display_path(directory),
                        segment,
                        EntryKind::Directory,
                    ))
                }
            };
        }
        Ok(directory)
    }

    /// Create the directory at `path` relative to the root
    ///
    /// Missing intermediate directories are created only with `parents`.
    pub fn create_directory(
        &mut self,
        path: &str,
        options: CreateDirectoryOptions,
    ) -> Result<DirectoryId> {
        let create = if options.parents {
            Create::With(options.directory.clone())
        } else {
            Create::No
        };
        let root = self.root();
        let (directory, name) = self.resolve(root, path, create)?;
        self.create_directory_in(directory, &name, options.directory)
    }

    /// Write `content` into the file at `path`, creating it if allowed
    ///
    /// Every failure is detected before the tree is touched, so a failed
    /// call never leaves freshly created intermediate directories behind.
    pub fn write_file(
        &mut self,
        path: &str,
        content: impl Into<Bytes>,
        options: WriteFileOptions,
    ) -> Result<FileId> {
        let mut segments = path::split(path)?;
        let name = segments.pop().unwrap_or_default();
        let root = self.root();

        let existing = match self.resolve_existing(root, &segments) {
            Ok(directory) => match self.directory(directory).get(&name) {
                Some(EntryId::File(id)) => Some(id),
                Some(EntryId::Directory(_)) => {
                    return Err(StorageError::invalid_entry(
                        self.display_path(directory),
                        &name,
                        EntryKind::File,
                        EntryKind::Directory,
                    ))
                }
                None if !options.create.is_enabled() => {
                    return Err(StorageError::not_found(
                        self.display_path(directory),
                        &name,
                        EntryKind::File,
                    ))
                }
                None => None,
            },
            Err(StorageError::NotFound { .. }) if options.parents => {
                if !options.create.is_enabled() {
                    return Err(StorageError::not_found(
                        format!("/{}", path::join(&segments)),
                        &name,
                        EntryKind::File,
                    ));
                }
                None
            }
            Err(e) => return Err(e),
        };

        let size = match existing {
            Some(id) if !options.write.truncate => self.file(id).size(),
            _ => 0,
        };
        if options.write.offset > size {
            return Err(StorageError::out_of_bounds(options.write.offset, size));
        }

        let create = if options.parents {
            Create::Default
        } else {
            Create::No
        };
        let (directory, name) = self.resolve(root, path, create)?;
        let file = self.get_file_in(directory, &name, options.create)?;
        self.file_mut(file).write(content, options.write)?;
        Ok(file)
    }

    /// Look up the file at `path` without creating anything
    pub fn get_file(&self, path: &str) -> Result<FileId> {
        let mut segments = path::split(path)?;
        let name = segments.pop().unwrap_or_default();
        let directory = self.resolve_existing(self.root(), &segments)?;
        match self.directory(directory).get(&name) {
            Some(EntryId::File(id)) => Ok(id),
            Some(EntryId::Directory(_)) => Err(StorageError::invalid_entry(
                self.display_path(directory),
                name,
                EntryKind::File,
                EntryKind::Directory,
            )),
            None => Err(StorageError::not_found(
                self.display_path(directory),
                name,
                EntryKind::File,
            )),
        }
    }

    /// Pending upload result of the file at `path`
    pub fn stat(&self, path: &str) -> Result<StatFuture> {
        let file = self.get_file(path)?;
        Ok(self.file(file).stat())
    }

    /// Depth-first, pre-order walk over everything below `directory`
    pub fn iterate(&self, directory: DirectoryId) -> Walk<'_> {
        let mut stack: Vec<EntryId> = self.directory(directory).entries().to_vec();
        stack.reverse();
        Walk { tree: self, stack }
    }

    /// Walk over every entry below the root
    pub fn iter(&self) -> Walk<'_> {
        self.iterate(self.root())
    }
}

/// A borrowed entry yielded while walking the tree
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    tree: &'a StagingTree,
    id: EntryId,
}

impl<'a> EntryRef<'a> {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn entry(&self) -> &'a Entry {
        self.tree.entry(self.id)
    }

    pub fn name(&self) -> &'a str {
        self.entry().name()
    }

    pub fn kind(&self) -> EntryKind {
        self.id.kind()
    }

    pub fn path(&self) -> String {
        self.tree.path(self.id)
    }
}

/// Lazy pre-order traversal; a fresh call re-walks the current state
#[derive(Debug)]
pub struct Walk<'a> {
    tree: &'a StagingTree,
    stack: Vec<EntryId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = EntryRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let EntryId::Directory(directory) = id {
            self.stack
                .extend(self.tree.directory(directory).entries().iter().rev());
        }
        Some(EntryRef {
            tree: self.tree,
            id,
        })
    }
}
