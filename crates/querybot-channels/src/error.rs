use thiserror::Error;

/// Errors raised by a chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A message could not be delivered to the remote endpoint.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// A message could not be deleted.
    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// Inbound media could not be fetched.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Inbound media exceeds the configured size limit.
    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// Local I/O while writing or reading a transferred file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
