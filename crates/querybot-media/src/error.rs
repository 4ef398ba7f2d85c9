use thiserror::Error;

/// Errors from transcription, extraction and conversion adapters.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The adapter is disabled or missing required settings.
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("{tool} not found or failed to start: {source}")]
    Spawn {
        tool: &'static str,
        source: std::io::Error,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from [`ArtifactBundler::bundle`](crate::bundle::ArtifactBundler::bundle).
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("nothing to bundle")]
    Empty,

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        source: reqwest::Error,
    },

    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
