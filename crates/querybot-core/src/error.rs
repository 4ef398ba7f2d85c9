use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuerybotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing or invalid credentials: {0}")]
    Credentials(String),
}

pub type Result<T> = std::result::Result<T, QuerybotError>;
