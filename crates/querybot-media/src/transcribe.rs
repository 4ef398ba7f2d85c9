//! Voice transcription backends.
//!
//! Selected via `media.transcription`:
//! - `"none"`: disabled (default)
//! - `"whisper_api"`: OpenAI Whisper API (requires an API key)
//! - `"whisper_cpp"`: local whisper.cpp subprocess (requires `whisper-cli` in PATH)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use querybot_core::config::{MediaConfig, TranscriptionMode};

use crate::convert;
use crate::error::MediaError;
use crate::tool;

/// Outcome of a transcription attempt.
///
/// Unintelligible audio is an expected, frequent outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcription {
    Recognized(String),
    Unrecognized,
}

impl Transcription {
    /// Classify raw engine output; blank or marker-only output is `Unrecognized`.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        let blank = text.is_empty()
            || text.eq_ignore_ascii_case("[BLANK_AUDIO]")
            || !text.chars().any(char::is_alphanumeric);
        if blank {
            Transcription::Unrecognized
        } else {
            Transcription::Recognized(text.to_string())
        }
    }
}

/// Speech-to-text adapter.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    async fn transcribe(&self, audio: &Path) -> Result<Transcription, MediaError>;
}

/// Build the transcriber selected in config.
pub fn from_config(config: &MediaConfig) -> Result<Box<dyn Transcriber>, MediaError> {
    match config.transcription {
        TranscriptionMode::None => Ok(Box::new(DisabledTranscriber)),
        TranscriptionMode::WhisperApi => {
            let api_key = config
                .openai_api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .ok_or_else(|| {
                    MediaError::NotConfigured(
                        "OPENAI_API_KEY not set for whisper transcription".to_string(),
                    )
                })?;
            Ok(Box::new(WhisperApi::new(api_key, None)))
        }
        TranscriptionMode::WhisperCpp => {
            let model = config.whisper_model.clone().ok_or_else(|| {
                MediaError::NotConfigured("media.whisper_model is required for whisper_cpp".into())
            })?;
            Ok(Box::new(WhisperCpp::new(None, model, config.work_dir.clone())))
        }
    }
}

/// Voice input disabled: every call fails with `NotConfigured`.
pub struct DisabledTranscriber;

#[async_trait]
impl Transcriber for DisabledTranscriber {
    fn name(&self) -> &str {
        "none"
    }

    async fn transcribe(&self, _audio: &Path) -> Result<Transcription, MediaError> {
        Err(MediaError::NotConfigured(
            "voice transcription is disabled (set media.transcription)".to_string(),
        ))
    }
}

/// OpenAI Whisper HTTP API.
pub struct WhisperApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WhisperApi {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperApi {
    fn name(&self) -> &str {
        "whisper_api"
    }

    async fn transcribe(&self, audio: &Path) -> Result<Transcription, MediaError> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.ogg".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/ogg")?;
        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .part("file", part);

        let resp = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(MediaError::Api { status, message });
        }

        let json: serde_json::Value = resp.json().await?;
        let text = json["text"].as_str().unwrap_or_default();
        Ok(Transcription::from_text(text))
    }
}

/// Local whisper.cpp subprocess; input is converted to 16 kHz WAV first.
pub struct WhisperCpp {
    binary: String,
    model: String,
    work_dir: PathBuf,
}

impl WhisperCpp {
    pub fn new(binary: Option<String>, model: String, work_dir: PathBuf) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| "whisper-cli".to_string()),
            model,
            work_dir,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperCpp {
    fn name(&self) -> &str {
        "whisper_cpp"
    }

    async fn transcribe(&self, audio: &Path) -> Result<Transcription, MediaError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let staging = tempfile::Builder::new()
            .prefix("whisper-")
            .tempdir_in(&self.work_dir)?;
        let wav = staging.path().join("audio.wav");
        convert::to_wav16k(audio, &wav).await?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-m")
            .arg(&self.model)
            .arg("-f")
            .arg(&wav)
            .args(["-l", "auto", "-nt", "-np"]);
        let stdout = tool::run("whisper.cpp", &mut cmd).await?;
        let text = String::from_utf8_lossy(&stdout);
        debug!(chars = text.len(), "whisper.cpp finished");
        Ok(Transcription::from_text(&text))
    }
}
