//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling loop
//! until the shutdown signal flips. Updates queued while the bot was offline
//! are dropped on start.

use std::sync::Arc;

use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::sync::watch;
use tracing::{info, warn};

use querybot_pipeline::BotContext;

use crate::error::TelegramError;
use crate::handler::handle_message;

/// Build a `Bot` for `token`, rejecting an empty one up front.
pub fn bot(token: &str) -> Result<Bot, TelegramError> {
    if token.trim().is_empty() {
        return Err(TelegramError::NoToken);
    }
    Ok(Bot::new(token))
}

pub struct TelegramAdapter<C: BotContext> {
    bot: Bot,
    ctx: Arc<C>,
}

impl<C: BotContext> TelegramAdapter<C> {
    pub fn new(bot: Bot, ctx: Arc<C>) -> Self {
        Self { bot, ctx }
    }

    /// Verify the token, then poll for updates until `shutdown` turns `true`
    /// or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), TelegramError> {
        let me = self.bot.get_me().await?;
        info!(
            username = me.user.username.as_deref().unwrap_or("?"),
            "Telegram: connected"
        );

        let handler = Update::filter_message().endpoint(handle_message::<C>);
        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![Arc::clone(&self.ctx)])
            .default_handler(|_upd| async {})
            .build();

        let token = dispatcher.shutdown_token();
        tokio::spawn(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            match token.shutdown() {
                Ok(done) => {
                    info!("Telegram: stopping dispatcher");
                    done.await;
                }
                Err(e) => warn!(error = %e, "Telegram: dispatcher was not running"),
            }
        });

        let listener = Polling::builder(self.bot).drop_pending_updates().build();

        info!("Telegram: starting long-polling dispatcher");
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("Telegram: update listener error"),
            )
            .await;
        info!("Telegram: dispatcher stopped");
        Ok(())
    }
}
