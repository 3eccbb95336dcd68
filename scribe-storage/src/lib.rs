//! Storage routing and JSONL persistence for the Scribe traffic logger
//!
//! Two collaborators live here: the [`StorageResolver`] that decides where an
//! exchange's two payload streams land, and the [`LineAppender`] that writes
//! one JSON object per line. Both are traits so a host can substitute its own
//! policy; the shipped defaults route by batch header and append to files.

#![warn(missing_docs)]

pub mod append;
pub mod error;
pub mod route;

pub use append::{JsonlAppender, LineAppender};
pub use error::{StorageError, StorageResult};
pub use route::{safe_path_segment, BatchRouter, StoragePaths, StorageResolver, BATCH_HEADER};
