//! Request payload preprocessing
//!
//! Hosts can register transforms that run against a request payload before it
//! is logged: redacting credentials, stamping run metadata, or filtering
//! exchanges out entirely.

use scribe_core::RequestHead;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Transform a request payload before it is logged.
///
/// Preprocessors run in registration order and each receives the previous
/// one's output. Returning `None` vetoes the exchange: nothing is logged and
/// no correlation state is kept.
pub trait RequestPreprocessor: Send + Sync {
    /// Transform the payload, or return `None` to drop the exchange.
    fn transform(
        &self,
        payload: Map<String, Value>,
        request: &RequestHead,
    ) -> Option<Map<String, Value>>;
}

impl<F> RequestPreprocessor for F
where
    F: Fn(Map<String, Value>, &RequestHead) -> Option<Map<String, Value>> + Send + Sync,
{
    fn transform(
        &self,
        payload: Map<String, Value>,
        request: &RequestHead,
    ) -> Option<Map<String, Value>> {
        self(payload, request)
    }
}

/// Run the payload through the chain, stopping at the first veto.
pub(crate) fn apply_preprocessors(
    mut payload: Map<String, Value>,
    request: &RequestHead,
    preprocessors: &[Arc<dyn RequestPreprocessor>],
) -> Option<Map<String, Value>> {
    for preprocessor in preprocessors {
        payload = preprocessor.transform(payload, request)?;
    }
    Some(payload)
}
