//! Client construction from configuration

pub mod config;
pub mod storage;

pub use config::{ClientConfig, DEFAULT_URL};
pub use storage::StorageClient;
