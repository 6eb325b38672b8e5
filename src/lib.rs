pub mod client;
pub mod error;
pub mod types;

pub mod multipart;
pub mod staging;
pub mod transport;
pub mod upload;

pub use client::{ClientConfig, StorageClient};

pub use error::{EntryKind, Result, StorageError};

pub use multipart::{BoundarySource, FixedBoundary, MultipartEncoder, PartOptions, RandomBoundary};

pub use staging::{
    Create, CreateDirectoryOptions, DirectoryId, DirectoryOptions, FileId, FileOptions,
    StagingTree, StatFuture, WriteFileOptions, WriteOptions,
};

pub use transport::{
    HttpEngine, HttpRequest, Method, NetworkFailure, Progress, ReqwestEngine, RequestOptions,
    Response, ResponseKind, Transport,
};

pub use types::{Blob, Cid, File, Mode};

pub use upload::{PutOptions, UploadResult, UploadService};
