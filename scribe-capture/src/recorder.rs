//! Exchange correlation and recording
//!
//! The recorder sees each exchange twice: once when the hosting transport has
//! the complete request, once when it has the complete response. Correlation
//! state lives in an explicit map keyed by the transport's opaque exchange
//! identifier; an entry is created when a request is accepted for logging and
//! taken back out when the matching response is processed or the exchange is
//! abandoned.
//!
//! Every unmet precondition on either side is a silent skip. The recorder
//! must never disrupt the traffic it observes, so nothing in here returns an
//! error to the host; the only reported failures are the appender's storage
//! warnings.

use crate::preprocess::{apply_preprocessors, RequestPreprocessor};
use scribe_core::{
    aggregate_streamed_response, is_event_stream, parse_sse_events, read_json, EndpointRegistry,
    ExchangeId, RequestHead, ResponseHead,
};
use scribe_storage::{BatchRouter, JsonlAppender, LineAppender, StoragePaths, StorageResolver};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Correlation kept between a logged request and its response.
#[derive(Debug, Clone)]
struct ExchangeCorrelation {
    /// The request payload as it was logged, preprocessors applied.
    payload: Value,
    /// Destination pair resolved at request time; the response reuses it.
    paths: StoragePaths,
}

/// Records OpenAI-compatible request/response exchanges as JSONL.
///
/// Construct with [`TrafficRecorder::new`] for the default collaborators, or
/// through [`TrafficRecorder::builder`] to substitute the endpoint registry,
/// storage resolver, appender, or a preprocessor chain.
pub struct TrafficRecorder {
    registry: EndpointRegistry,
    resolver: Arc<dyn StorageResolver>,
    appender: Arc<dyn LineAppender>,
    preprocessors: Vec<Arc<dyn RequestPreprocessor>>,
    in_flight: Mutex<HashMap<ExchangeId, ExchangeCorrelation>>,
}

impl TrafficRecorder {
    /// Recorder with default routing and appending rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::builder(data_dir).build()
    }

    /// Start building a recorder with custom collaborators.
    pub fn builder(data_dir: impl Into<PathBuf>) -> TrafficRecorderBuilder {
        TrafficRecorderBuilder::new(data_dir)
    }

    /// Number of exchanges whose responses have not yet been seen.
    pub fn in_flight(&self) -> usize {
        self.lock_map().len()
    }

    /// Drop correlation state for an exchange whose response will never
    /// arrive. A request that was logged without a response is an acceptable
    /// terminal state, not an error.
    pub fn abandon(&self, id: &ExchangeId) {
        if self.lock_map().remove(id).is_some() {
            debug!("Abandoned exchange {}", id);
        }
    }

    // Correlation lock is never held across an await.
    fn lock_map(&self) -> MutexGuard<'_, HashMap<ExchangeId, ExchangeCorrelation>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Observe the request half of an exchange.
    ///
    /// Skips silently unless the request is a POST to a supported endpoint
    /// with a JSON-object body that survives the preprocessor chain. An
    /// accepted request is appended to the resolved input destination and its
    /// correlation is retained for the response half.
    pub async fn record_request(&self, id: &ExchangeId, request: &RequestHead) {
        if !request.method.eq_ignore_ascii_case("POST") {
            return;
        }
        if !self.registry.supports(&request.path) {
            return;
        }
        if request.body.is_empty() {
            return;
        }
        let payload = match read_json(&request.body) {
            Some(Value::Object(payload)) => payload,
            _ => return,
        };
        let payload = match apply_preprocessors(payload, request, &self.preprocessors) {
            Some(payload) => payload,
            None => {
                trace!("Exchange {} dropped by preprocessor", id);
                return;
            }
        };

        let paths = self.resolver.resolve(request);
        let record = Value::Object(payload);
        self.appender.append(&paths.input_path, &record).await;
        debug!("Recorded request for exchange {}", id);
        self.lock_map().insert(
            id.clone(),
            ExchangeCorrelation {
                payload: record,
                paths,
            },
        );
    }

    /// Observe the response half of an exchange.
    ///
    /// Takes no action without prior correlation state or without a response.
    /// An event-stream body is parsed and aggregated into a single
    /// chat-completion object; any other body is logged as parsed JSON,
    /// verbatim. Either way the record goes to the output destination that
    /// was resolved with the request, never re-resolved.
    pub async fn record_response(&self, id: &ExchangeId, response: Option<&ResponseHead>) {
        let response = match response {
            Some(response) => response,
            None => return,
        };
        let correlation = match self.lock_map().remove(id) {
            Some(correlation) => correlation,
            None => return,
        };
        if !correlation.paths.is_valid() {
            return;
        }
        if response.body.is_empty() {
            return;
        }
        trace!(
            "Correlated response for exchange {} (model {:?})",
            id,
            correlation.payload.get("model").and_then(|v| v.as_str()),
        );

        if is_event_stream(response.content_type()) {
            let events = parse_sse_events(&response.body);
            let payload = match aggregate_streamed_response(&events) {
                Some(payload) => payload,
                None => {
                    trace!("Exchange {} produced an empty event stream", id);
                    return;
                }
            };
            self.appender
                .append(&correlation.paths.output_path, &payload)
                .await;
            debug!("Recorded streamed response for exchange {}", id);
            return;
        }

        let payload = match read_json(&response.body) {
            Some(Value::Null) | None => return,
            Some(payload) => payload,
        };
        self.appender
            .append(&correlation.paths.output_path, &payload)
            .await;
        debug!("Recorded response for exchange {}", id);
    }
}

/// Builder for [`TrafficRecorder`].
///
/// Defaults: the chat-completions endpoint registry, batch-header routing
/// under `data_dir`, and file-backed JSONL appending.
pub struct TrafficRecorderBuilder {
    data_dir: PathBuf,
    registry: EndpointRegistry,
    resolver: Option<Arc<dyn StorageResolver>>,
    appender: Option<Arc<dyn LineAppender>>,
    preprocessors: Vec<Arc<dyn RequestPreprocessor>>,
}

impl TrafficRecorderBuilder {
    /// Start a builder rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry: EndpointRegistry::default(),
            resolver: None,
            appender: None,
            preprocessors: Vec::new(),
        }
    }

    /// Replace the endpoint registry.
    pub fn registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the storage resolver.
    pub fn resolver(mut self, resolver: Arc<dyn StorageResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the line appender.
    pub fn appender(mut self, appender: Arc<dyn LineAppender>) -> Self {
        self.appender = Some(appender);
        self
    }

    /// Append a request preprocessor to the end of the chain.
    pub fn preprocessor(mut self, preprocessor: Arc<dyn RequestPreprocessor>) -> Self {
        self.preprocessors.push(preprocessor);
        self
    }

    /// Build the recorder.
    pub fn build(self) -> TrafficRecorder {
        let resolver: Arc<dyn StorageResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(BatchRouter::new(self.data_dir)),
        };
        let appender: Arc<dyn LineAppender> = match self.appender {
            Some(appender) => appender,
            None => Arc::new(JsonlAppender::new()),
        };
        TrafficRecorder {
            registry: self.registry,
            resolver,
            appender,
            preprocessors: self.preprocessors,
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}
