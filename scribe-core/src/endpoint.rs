//! Endpoint matching for supported API operations

/// A supported API operation, identified by its path suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Operation name, e.g. `chat.completions`.
    pub name: String,
    /// Path suffixes that select this operation.
    pub suffixes: Vec<String>,
}

impl EndpointSpec {
    /// Create a spec from a name and its path suffixes.
    pub fn new(
        name: impl Into<String>,
        suffixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Matches request paths against an ordered set of endpoint specs.
///
/// Matching is by path suffix so arbitrary routing prefixes (`/v1`,
/// `/openai/v1`, a gateway mount point) all resolve to the same operation.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointSpec>,
}

/// Strip the query string before matching.
fn normalize_path(path: &str) -> &str {
    match path.find('?') {
        Some(at) => &path[..at],
        None => path,
    }
}

impl EndpointRegistry {
    /// Create a registry from an ordered set of specs.
    pub fn new(endpoints: impl IntoIterator<Item = EndpointSpec>) -> Self {
        Self {
            endpoints: endpoints.into_iter().collect(),
        }
    }

    /// Find the first operation one of whose suffixes matches the path.
    pub fn match_path(&self, path: &str) -> Option<&EndpointSpec> {
        let clean = normalize_path(path);
        self.endpoints.iter().find(|endpoint| {
            endpoint
                .suffixes
                .iter()
                .any(|suffix| clean.ends_with(suffix.as_str()))
        })
    }

    /// True when some registered operation matches the path.
    pub fn supports(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }
}

impl Default for EndpointRegistry {
    /// Registry with chat completions support only.
    fn default() -> Self {
        Self::new([EndpointSpec::new("chat.completions", ["/chat/completions"])])
    }
}
