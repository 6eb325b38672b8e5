//! multipart/form-data bodies for the add endpoint

pub mod boundary;
pub mod encoder;
pub mod tree;

pub use boundary::{BoundarySource, FixedBoundary, RandomBoundary};
pub use encoder::{MultipartEncoder, PartContent, PartOptions, DEFAULT_CONTENT_TYPE};
pub use tree::DIRECTORY_CONTENT_TYPE;
