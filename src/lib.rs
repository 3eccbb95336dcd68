//! Scribe - capture OpenAI-compatible chat traffic as JSONL
//!
//! Scribe sits beside an HTTP interception layer and persists what flows
//! through it: each loggable request payload and the fully-realized response
//! payload land as one JSONL line each, in a file pair resolved per logical
//! batch. Streamed SSE responses are reconstructed into the single
//! chat-completion object a non-streaming call would have returned, so the
//! logs read the same whether or not the client streamed.
//!
//! The transport itself is out of scope: the host hands Scribe already-parsed
//! request/response text and headers plus an opaque exchange identifier, and
//! Scribe never disturbs the traffic it observes.
//!
//! # Quick Start
//!
//! ```no_run
//! use scribe::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let recorder = TrafficRecorder::new("/var/log/scribe");
//!
//! // On the request hook of the hosting transport:
//! let id = ExchangeId::new("flow-1");
//! let request = RequestHead::new("POST", "/v1/chat/completions")
//!     .with_body(r#"{"model": "gpt-4o-mini", "messages": []}"#);
//! recorder.record_request(&id, &request).await;
//!
//! // On the matching response hook:
//! let response = ResponseHead::new(r#"{"id": "chatcmpl_1", "choices": []}"#)
//!     .with_header("content-type", "application/json");
//! recorder.record_response(&id, Some(&response)).await;
//! # }
//! ```

#![warn(missing_docs)]

// Re-export core types
pub use scribe_core::*;

/// Exchange correlation and recording
pub mod capture {
    pub use scribe_capture::*;
}

/// Storage routing and JSONL persistence
pub mod storage {
    pub use scribe_storage::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use scribe_capture::{RequestPreprocessor, TrafficRecorder, TrafficRecorderBuilder};
    pub use scribe_core::{
        EndpointRegistry, EndpointSpec, ExchangeId, Headers, RequestHead, ResponseHead,
    };
    pub use scribe_storage::{
        BatchRouter, JsonlAppender, LineAppender, StoragePaths, StorageResolver,
    };
    pub use serde_json::{Map, Value};
}
