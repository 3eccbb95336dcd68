//! Storage routing for exchange logs
//!
//! Each exchange resolves to a pair of destinations (one file for request
//! payloads, one for response payloads) and the pair must stay stable for
//! the exchange's whole lifetime: the response is written to the same pair
//! the request was, never re-resolved.

use scribe_core::RequestHead;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolved destinations for one exchange's two payload streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    /// Destination for request payloads.
    pub input_path: PathBuf,
    /// Destination for response payloads.
    pub output_path: PathBuf,
}

impl StoragePaths {
    /// The standard pair rooted at a directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            input_path: dir.join("input.jsonl"),
            output_path: dir.join("output.jsonl"),
        }
    }

    /// True when both destinations are non-empty paths.
    pub fn is_valid(&self) -> bool {
        !self.input_path.as_os_str().is_empty() && !self.output_path.as_os_str().is_empty()
    }
}

/// Resolve storage destinations from request metadata.
///
/// Implementations must be pure: identical metadata resolves to identical
/// paths. The recorder calls `resolve` exactly once per exchange and reuses
/// the pair for the response side.
pub trait StorageResolver: Send + Sync {
    /// Resolve the destination pair for a request.
    fn resolve(&self, request: &RequestHead) -> StoragePaths;
}

/// Default header used to route exchanges into per-batch directories.
pub const BATCH_HEADER: &str = "x-batch-id";

/// Longest path segment a routed header value may produce.
const SEGMENT_MAX: usize = 120;

/// Turn an arbitrary header value into a safe single path segment.
///
/// Keeps ASCII alphanumerics and `-_.`, replaces everything else with `_`,
/// trims separator characters from both ends and truncates to 120 bytes.
/// A value with nothing salvageable becomes `unknown`.
pub fn safe_path_segment(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut cleaned = cleaned
        .trim_matches(|c| matches!(c, '.' | '_' | '-'))
        .to_string();
    cleaned.truncate(SEGMENT_MAX);
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Routes exchanges into per-batch directories keyed by a request header.
///
/// With the routing header present and non-empty, an exchange lands under
/// `<data_dir>/requests/<sanitized-value>/`; otherwise directly under
/// `<data_dir>/`.
#[derive(Debug, Clone)]
pub struct BatchRouter {
    data_dir: PathBuf,
    header: Option<String>,
}

impl BatchRouter {
    /// Create a router rooted at `data_dir` using the default batch header.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            header: Some(BATCH_HEADER.to_string()),
        }
    }

    /// Route by a different header.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into().to_ascii_lowercase());
        self
    }

    /// Disable header routing; every exchange lands in the data directory.
    pub fn without_header(mut self) -> Self {
        self.header = None;
        self
    }
}

impl StorageResolver for BatchRouter {
    fn resolve(&self, request: &RequestHead) -> StoragePaths {
        if let Some(header) = &self.header {
            if let Some(value) = request.headers.get(header) {
                if !value.is_empty() {
                    let segment = safe_path_segment(value);
                    debug!("Routing exchange to batch directory {}", segment);
                    return StoragePaths::in_dir(self.data_dir.join("requests").join(segment));
                }
            }
        }
        StoragePaths::in_dir(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_path_segment_sanitizes() {
        assert_eq!(safe_path_segment("  Batch/1  "), "Batch_1");
    }

    #[test]
    fn safe_path_segment_empty_falls_back_to_unknown() {
        assert_eq!(safe_path_segment("  !!!  "), "unknown");
        assert_eq!(safe_path_segment(""), "unknown");
    }

    #[test]
    fn safe_path_segment_truncates_long_values() {
        let value = "a".repeat(130);
        assert_eq!(safe_path_segment(&value).len(), 120);
    }

    #[test]
    fn safe_path_segment_trims_separator_edges() {
        assert_eq!(safe_path_segment("..batch-7__"), "batch-7");
    }

    #[test]
    fn router_with_header_routes_to_request_subdirectory() {
        let router = BatchRouter::new("/data");
        let request =
            RequestHead::new("POST", "/v1/chat/completions").with_header("x-batch-id", "Batch 1");

        let paths = router.resolve(&request);

        assert_eq!(
            paths.input_path,
            Path::new("/data/requests/Batch_1/input.jsonl")
        );
        assert_eq!(
            paths.output_path,
            Path::new("/data/requests/Batch_1/output.jsonl")
        );
    }

    #[test]
    fn router_without_header_uses_data_dir() {
        let router = BatchRouter::new("/data");
        let request = RequestHead::new("POST", "/v1/chat/completions");

        let paths = router.resolve(&request);

        assert_eq!(paths.input_path, Path::new("/data/input.jsonl"));
        assert_eq!(paths.output_path, Path::new("/data/output.jsonl"));
    }

    #[test]
    fn router_ignores_empty_header_value() {
        let router = BatchRouter::new("/data");
        let request =
            RequestHead::new("POST", "/v1/chat/completions").with_header("x-batch-id", "");

        assert_eq!(router.resolve(&request), StoragePaths::in_dir("/data"));
    }

    #[test]
    fn router_custom_header() {
        let router = BatchRouter::new("/data").with_header("X-Run-Id");
        let request =
            RequestHead::new("POST", "/v1/chat/completions").with_header("x-run-id", "run9");

        let paths = router.resolve(&request);

        assert_eq!(
            paths.input_path,
            Path::new("/data/requests/run9/input.jsonl")
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let router = BatchRouter::new("/data");
        let request =
            RequestHead::new("POST", "/v1/chat/completions").with_header("x-batch-id", "fixed");

        assert_eq!(router.resolve(&request), router.resolve(&request));
    }

    #[test]
    fn paths_validity() {
        assert!(StoragePaths::in_dir("/data").is_valid());
        assert!(!StoragePaths {
            input_path: PathBuf::new(),
            output_path: PathBuf::from("/data/output.jsonl"),
        }
        .is_valid());
    }
}
