//! Slash-delimited path parsing for the staging tree

use crate::error::{Result, StorageError};

/// Split a path into its segments
///
/// Segments are separated by `/`; a backslash directly before a `/` keeps
/// the slash inside the segment. Surrounding whitespace is trimmed and empty
/// segments are dropped, so `"/a//b/"` yields `["a", "b"]`.
pub fn split(path: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'/') => {
                chars.next();
                current.push('/');
            }
            '/' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    if segments.is_empty() {
        return Err(StorageError::invalid_path(path));
    }

    Ok(segments)
}

/// Join segments back into a relative path
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}
