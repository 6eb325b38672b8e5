//! Serialization of a staging tree into one multipart body

use crate::error::{EntryKind, Result};
use crate::multipart::encoder::{MultipartEncoder, PartContent, PartOptions};
use crate::staging::{Entry, StagingTree};
use crate::types::{split_mtime, Mode};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::debug;

pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

fn metadata_headers(
    mut options: PartOptions,
    mode: Option<&Mode>,
    last_modified: Option<&DateTime<Utc>>,
) -> PartOptions {
    if let Some(mode) = mode {
        options = options.header("mode", mode.to_string());
    }
    if let Some(time) = last_modified {
        let (secs, nsecs) = split_mtime(time);
        options = options
            .header("mtime", secs.to_string())
            .header("mtime-nsecs", nsecs.to_string());
    }
    options
}

impl MultipartEncoder {
    /// Append one part per tree entry, in pre-order
    ///
    /// Field names are `file`/`dir`, suffixed with a counter from the second
    /// entry of the same kind on. Directory parts have an empty body.
    /// Entries appended before a rejected header (see [`Self::append`]) stay
    /// in the encoder.
    pub fn append_tree(&mut self, tree: &StagingTree) -> Result<()> {
        let mut files = 0usize;
        let mut directories = 0usize;

        for entry in tree.iter() {
            let (kind, counter) = match entry.kind() {
                EntryKind::File => ("file", &mut files),
                EntryKind::Directory => ("dir", &mut directories),
            };
            let field = if *counter > 0 {
                format!("{}-{}", kind, counter)
            } else {
                kind.to_string()
            };
            *counter += 1;

            let options = PartOptions::new().filename(entry.path());
            match entry.entry() {
                Entry::Directory(directory) => {
                    let options = metadata_headers(
                        options.header("Content-Type", DIRECTORY_CONTENT_TYPE),
                        directory.options.mode.as_ref(),
                        directory.options.last_modified.as_ref(),
                    );
                    self.append(&field, PartContent::Bytes(Bytes::new()), options)?;
                }
                Entry::File(file) => {
                    let options = metadata_headers(
                        options,
                        file.options.mode.as_ref(),
                        file.options.last_modified.as_ref(),
                    );
                    self.append(&field, file.content().clone(), options)?;
                }
            }
        }

        debug!(
            "serialized staging tree: {} files, {} directories",
            files, directories
        );
        Ok(())
    }

    /// Encoder holding the whole tree
    pub fn from_tree(tree: &StagingTree) -> Result<Self> {
        let mut encoder = Self::new();
        encoder.append_tree(tree)?;
        Ok(encoder)
    }
}
