use std::time::Duration;

use async_trait::async_trait;

use querybot_core::types::ImageRef;

/// One labeled section of an answer (a "pod").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultGroup {
    /// Backend-assigned identifier (e.g. `"Input"`, `"Result"`), when known.
    pub id: Option<String>,
    pub title: String,
    pub subresults: Vec<SubResult>,
}

impl ResultGroup {
    /// Whether this group merely echoes the interpreted input.
    ///
    /// Groups without an id are assumed to be the echo; the backend always
    /// leads with one.
    pub fn is_input_echo(&self) -> bool {
        self.id.as_deref().map_or(true, |id| id.starts_with("Input"))
    }
}

/// One entry inside a group (a "subpod").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubResult {
    pub plaintext: Option<String>,
    pub images: Vec<ImageRef>,
}

/// Result of a backend query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The backend understood nothing it could answer.
    NoResult,
    /// Ordered result groups, first group first.
    Groups(Vec<ResultGroup>),
}

/// Common interface for computation backends.
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Backend name for logging and error messages.
    fn name(&self) -> &str;

    /// Run `input` with the backend's own scan budget set to `scan_timeout`.
    async fn query(&self, input: &str, scan_timeout: Duration)
        -> Result<QueryOutcome, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Backend did not answer within {ms}ms")]
    Timeout { ms: u64 },
}
