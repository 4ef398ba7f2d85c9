use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use querybot_core::config::QuerybotConfig;
use querybot_core::{SessionFlusher, SessionStore};
use querybot_telegram::{TelegramAdapter, TelegramTransport};

mod app;

const LEGACY_CREDENTIALS: &str = "credentials.json";

#[derive(Debug, Parser)]
#[command(name = "querybot", version, about = "Telegram front end for Wolfram|Alpha")]
struct Cli {
    /// Config file (default: ~/.querybot/querybot.toml)
    #[arg(long)]
    config: Option<String>,

    /// Legacy credentials.json with TOKEN and Client keys
    /// (default: ./credentials.json when present)
    #[arg(long)]
    credentials: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "querybot=info,querybot_core=info,querybot_pipeline=info,\
                     querybot_telegram=info,querybot_backend=info,querybot_media=info"
                        .into()
                }),
        )
        .init();

    let cli = Cli::parse();
    let credentials = cli.credentials.or_else(|| {
        Path::new(LEGACY_CREDENTIALS)
            .exists()
            .then(|| LEGACY_CREDENTIALS.to_string())
    });
    let config = QuerybotConfig::load(cli.config.as_deref(), credentials.as_deref())?;
    info!(
        transcription = ?config.media.transcription,
        work_dir = %config.media.work_dir.display(),
        "config loaded"
    );

    std::fs::create_dir_all(&config.media.work_dir)?;

    let bot = querybot_telegram::adapter::bot(&config.credentials.telegram_token)?;
    let transport = TelegramTransport::new(bot.clone(), config.media.max_download_bytes);
    let sessions = Arc::new(SessionStore::new());
    let state = Arc::new(app::AppState::new(&config, transport, Arc::clone(&sessions))?);

    // Session flush runs until shutdown.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let flusher = SessionFlusher::new(Arc::clone(&sessions), config.session.flush_interval());
    let flush_task = tokio::spawn(flusher.run(shutdown_rx.clone()));

    let ctrl_c_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("shutdown requested");
        let _ = ctrl_c_tx.send(true);
    });

    let adapter = TelegramAdapter::new(bot, state);
    let result = adapter.run(shutdown_rx).await;

    // The adapter may also stop on its own (bad token); stop the flush either way.
    let _ = shutdown_tx.send(true);
    if let Err(e) = flush_task.await {
        warn!(error = %e, "session flush task failed");
    }
    result?;
    info!("querybot stopped");
    Ok(())
}
