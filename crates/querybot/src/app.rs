use std::sync::Arc;
use std::time::Duration;

use querybot_backend::{ComputeBackend, WolframAlphaClient};
use querybot_channels::Transport;
use querybot_core::config::QuerybotConfig;
use querybot_core::SessionStore;
use querybot_media::{transcribe, ArtifactBundler, Tesseract, TextExtractor, Transcriber};
use querybot_pipeline::{BotContext, PipelineSettings};
use querybot_telegram::TelegramTransport;

/// Central shared state, passed as `Arc<AppState>` to every event handler.
pub struct AppState {
    pub transport: TelegramTransport,
    pub backend: WolframAlphaClient,
    pub transcriber: Box<dyn Transcriber>,
    pub extractor: Tesseract,
    pub bundler: ArtifactBundler,
    pub sessions: Arc<SessionStore>,
    pub settings: PipelineSettings,
}

impl AppState {
    pub fn new(
        config: &QuerybotConfig,
        transport: TelegramTransport,
        sessions: Arc<SessionStore>,
    ) -> anyhow::Result<Self> {
        let backend = WolframAlphaClient::new(
            Some(config.backend.base_url.clone()),
            config.credentials.app_id.clone(),
            Duration::from_secs(config.backend.request_grace_secs),
        );
        let transcriber = transcribe::from_config(&config.media)?;

        Ok(Self {
            transport,
            backend,
            transcriber,
            extractor: Tesseract::default(),
            bundler: ArtifactBundler::new(config.media.work_dir.clone()),
            sessions,
            settings: PipelineSettings::from_config(config),
        })
    }
}

impl BotContext for AppState {
    fn transport(&self) -> &dyn Transport {
        &self.transport
    }

    fn backend(&self) -> &dyn ComputeBackend {
        &self.backend
    }

    fn transcriber(&self) -> &dyn Transcriber {
        self.transcriber.as_ref()
    }

    fn extractor(&self) -> &dyn TextExtractor {
        &self.extractor
    }

    fn bundler(&self) -> &ArtifactBundler {
        &self.bundler
    }

    fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}
