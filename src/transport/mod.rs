//! HTTP transport with timeout, cancellation and upload progress
//!
//! [`Transport`] resolves requests against the daemon's base URL and hands
//! them to an [`HttpEngine`]. Completed exchanges, whatever their status,
//! resolve normally; a network failure resolves with [`Response::error`].
//! Only timeouts and fired cancellation signals fail a call.

pub mod client;
pub mod engine;
pub mod types;

pub use client::Transport;
pub use engine::{progress_stream, HttpEngine, ReqwestEngine, UPLOAD_CHUNK_SIZE};
pub use types::{
    HttpRequest, Method, NetworkFailure, Progress, ProgressCallback, RequestOptions, Response,
    ResponseKind,
};
