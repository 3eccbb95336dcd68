//! Exchange correlation and recording for the Scribe traffic logger
//!
//! [`TrafficRecorder`] is the orchestration point between the hosting
//! transport and the core aggregation algorithms: it decides whether a
//! request is loggable, writes the input record, keeps the correlation
//! needed to route the eventual response to the same destination pair, and
//! reconstructs streamed responses before writing the output record.

#![warn(missing_docs)]

pub mod preprocess;
pub mod recorder;

pub use preprocess::RequestPreprocessor;
pub use recorder::{TrafficRecorder, TrafficRecorderBuilder};
