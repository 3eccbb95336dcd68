//! Core types and algorithms for the Scribe traffic logger
//!
//! This crate holds the parts with real algorithmic content: splitting an SSE
//! response body into discrete JSON events and reassembling those events into
//! the single chat-completion object a non-streaming call would have
//! returned. Everything here is a pure function over borrowed input: no I/O,
//! no async, no shared state.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod endpoint;
pub mod exchange;
pub mod sse;

// Re-export commonly used items
pub use aggregate::aggregate_streamed_response;
pub use endpoint::{EndpointRegistry, EndpointSpec};
pub use exchange::{ExchangeId, Headers, RequestHead, ResponseHead};
pub use sse::{is_event_stream, parse_sse_events, read_json};
