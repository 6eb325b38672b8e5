//! In-memory staging of files and directories
//!
//! This module provides the virtual filesystem that content is assembled in
//! before it is added to the storage daemon.

pub mod entry;
pub mod path;
pub mod stat;
pub mod tree;
pub mod types;

pub use entry::{
    DirectoryEntry, DirectoryId, Entry, EntryId, FileEntry, FileId, StagedEntry,
};
pub use stat::StatFuture;
pub use tree::{EntryRef, StagingTree, Walk};
pub use types::{
    Create, CreateDirectoryOptions, DirectoryOptions, FileOptions, WriteFileOptions,
    WriteOptions,
};
