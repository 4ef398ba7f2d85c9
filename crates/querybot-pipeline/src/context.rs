//! Shared context interface for channel hosts.
//!
//! `BotContext` is the single trait a host (the binary's `AppState`, or a
//! test harness) implements so the pipeline stays channel-agnostic and every
//! collaborator can be swapped for a fake.

use std::path::PathBuf;
use std::time::Duration;

use querybot_backend::ComputeBackend;
use querybot_channels::Transport;
use querybot_core::config::{DeliveryConfig, QuerybotConfig};
use querybot_core::SessionStore;
use querybot_media::{ArtifactBundler, TextExtractor, Transcriber};

/// Collaborators and settings required by the event pipeline.
pub trait BotContext: Send + Sync + 'static {
    fn transport(&self) -> &dyn Transport;
    fn backend(&self) -> &dyn ComputeBackend;
    fn transcriber(&self) -> &dyn Transcriber;
    fn extractor(&self) -> &dyn TextExtractor;
    fn bundler(&self) -> &ArtifactBundler;
    fn sessions(&self) -> &SessionStore;
    fn settings(&self) -> &PipelineSettings;
}

/// Runtime knobs the pipeline reads on every event.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub delivery: DeliveryConfig,
    /// Forwarded to the backend with every query.
    pub scan_timeout: Duration,
    pub ocr_languages: Vec<String>,
    /// Parent of the per-event scratch directories.
    pub work_dir: PathBuf,
}

impl PipelineSettings {
    pub fn from_config(config: &QuerybotConfig) -> Self {
        Self {
            delivery: config.delivery.clone(),
            scan_timeout: config.backend.scan_timeout(),
            ocr_languages: config.media.ocr_languages.clone(),
            work_dir: config.media.work_dir.clone(),
        }
    }
}
