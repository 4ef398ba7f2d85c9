use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{QuerybotError, Result};

/// Telegram's hard limit for a single text message.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;
pub const DEFAULT_BACKEND_URL: &str = "https://api.wolframalpha.com";
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5000;
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 500;
pub const DEFAULT_INDICATOR_TEXT: &str = "Processing…";

/// Top-level config (querybot.toml + QUERYBOT_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerybotConfig {
    pub credentials: Credentials,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Secrets loaded once at startup and never mutated afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Telegram Bot API token.
    pub telegram_token: String,
    /// Computation backend client identifier (Wolfram|Alpha AppID).
    pub app_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("telegram_token", &"<redacted>")
            .field("app_id", &"<redacted>")
            .finish()
    }
}

/// Shape of the legacy `credentials.json` file: `{"TOKEN": "...", "Client": "..."}`.
#[derive(Debug, Deserialize)]
struct LegacyCredentials {
    #[serde(rename = "TOKEN")]
    token: String,
    #[serde(rename = "Client")]
    client: String,
}

impl From<LegacyCredentials> for Credentials {
    fn from(legacy: LegacyCredentials) -> Self {
        Self {
            telegram_token: legacy.token,
            app_id: legacy.client,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Forwarded to the backend as its scan timeout.
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,
    /// Extra client-side wait on top of the scan timeout before giving up.
    #[serde(default = "default_request_grace_secs")]
    pub request_grace_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
            request_grace_secs: default_request_grace_secs(),
        }
    }
}

impl BackendConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Period of the global session flush.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
        }
    }
}

impl SessionConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum characters per outbound text message.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    /// Pause between consecutive chunks of one reply.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
    #[serde(default = "default_indicator_text")]
    pub indicator_text: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_message_len: TELEGRAM_MAX_MESSAGE_LEN,
            chunk_delay_ms: DEFAULT_CHUNK_DELAY_MS,
            indicator_text: default_indicator_text(),
        }
    }
}

impl DeliveryConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

/// Speech-to-text backend selection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionMode {
    /// Voice messages are always reported as unrecognized.
    #[default]
    None,
    /// OpenAI Whisper HTTP API.
    WhisperApi,
    /// Local whisper.cpp subprocess.
    WhisperCpp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory for downloads, transcoded audio and archives.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Tesseract language codes passed as OCR hints.
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: Vec<String>,
    #[serde(default)]
    pub transcription: TranscriptionMode,
    /// whisper.cpp model file (required for `whisper_cpp`).
    pub whisper_model: Option<String>,
    /// Falls back to the OPENAI_API_KEY env var when unset.
    pub openai_api_key: Option<String>,
    /// Inbound media larger than this is refused.
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            ocr_languages: default_ocr_languages(),
            transcription: TranscriptionMode::default(),
            whisper_model: None,
            openai_api_key: None,
            max_download_bytes: default_max_download_bytes(),
        }
    }
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}
fn default_scan_timeout_secs() -> u64 {
    DEFAULT_SCAN_TIMEOUT_SECS
}
fn default_request_grace_secs() -> u64 {
    5
}
fn default_flush_interval_secs() -> u64 {
    DEFAULT_FLUSH_INTERVAL_SECS
}
fn default_max_message_len() -> usize {
    TELEGRAM_MAX_MESSAGE_LEN
}
fn default_chunk_delay_ms() -> u64 {
    DEFAULT_CHUNK_DELAY_MS
}
fn default_indicator_text() -> String {
    DEFAULT_INDICATOR_TEXT.to_string()
}
fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("querybot")
}
fn default_ocr_languages() -> Vec<String> {
    vec!["eng".to_string(), "ita".to_string(), "deu".to_string()]
}
fn default_max_download_bytes() -> u64 {
    20 * 1024 * 1024
}

impl QuerybotConfig {
    /// Load config from a TOML file with QUERYBOT_* env var overrides.
    ///
    /// Config path, in order:
    ///   1. Explicit path argument
    ///   2. ~/.querybot/querybot.toml
    ///
    /// Credentials come from the `[credentials]` table and
    /// `QUERYBOT_CREDENTIALS__*` env vars, layered over the legacy
    /// `credentials.json` when `credentials_path` is given.
    pub fn load(config_path: Option<&str>, credentials_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let base = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("QUERYBOT_").split("__"));

        let mut creds = Figment::new();
        if let Some(legacy_path) = credentials_path {
            let legacy: LegacyCredentials = Figment::from(Json::file(legacy_path))
                .extract()
                .map_err(|e| QuerybotError::Config(format!("{legacy_path}: {e}")))?;
            creds = creds.merge(Serialized::defaults(Credentials::from(legacy)));
        }
        let credentials: Credentials = creds
            .merge(base.focus("credentials"))
            .extract()
            .map_err(|e| QuerybotError::Credentials(e.to_string()))?;

        let config: QuerybotConfig = base
            .merge(Serialized::default("credentials", &credentials))
            .extract()
            .map_err(|e| QuerybotError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.querybot/querybot.toml", home)
}
