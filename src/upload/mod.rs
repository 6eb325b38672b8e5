//! Adding content to the storage daemon
//!
//! [`UploadService`] encodes flat file sets or whole staging trees as
//! multipart bodies, posts them to the add endpoint and decodes the
//! newline-delimited JSON it answers with.

pub mod operations;
pub mod types;

pub use operations::{parse_add_response, UploadService, ADD_RESOURCE};
pub use types::{AddEntry, PutOptions, SizeField, UploadResult};
