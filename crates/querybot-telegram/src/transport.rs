//! `Transport` implementation over the Telegram Bot API.

use std::path::Path;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use querybot_channels::{Transport, TransportError};
use querybot_core::types::{ConversationId, MediaId, MessageRef};

pub struct TelegramTransport {
    bot: Bot,
    /// Inbound files above this size are refused before download.
    max_download_bytes: u64,
}

impl TelegramTransport {
    pub fn new(bot: Bot, max_download_bytes: u64) -> Self {
        Self {
            bot,
            max_download_bytes,
        }
    }

    fn sent(conversation: ConversationId, msg: &Message) -> MessageRef {
        MessageRef {
            conversation,
            message_id: msg.id.0,
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Result<MessageRef, TransportError> {
        let msg = self
            .bot
            .send_message(ChatId(conversation.0), text)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(Self::sent(conversation, &msg))
    }

    async fn send_document(
        &self,
        conversation: ConversationId,
        path: &Path,
    ) -> Result<MessageRef, TransportError> {
        let msg = self
            .bot
            .send_document(ChatId(conversation.0), InputFile::file(path.to_path_buf()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(Self::sent(conversation, &msg))
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(message.conversation.0), MessageId(message.message_id))
            .await
            .map_err(|e| TransportError::DeleteFailed(e.to_string()))?;
        Ok(())
    }

    async fn download_media(&self, media: &MediaId, dest: &Path) -> Result<(), TransportError> {
        let file = self
            .bot
            .get_file(media.as_str())
            .await
            .map_err(|e| TransportError::DownloadFailed(e.to_string()))?;

        let size = u64::from(file.size);
        if size > self.max_download_bytes {
            warn!(
                file_id = %media,
                size,
                limit = self.max_download_bytes,
                "Telegram: file exceeds size limit"
            );
            return Err(TransportError::TooLarge {
                size,
                max: self.max_download_bytes,
            });
        }

        let mut dst = tokio::fs::File::create(dest).await?;
        self.bot
            .download_file(&file.path, &mut dst)
            .await
            .map_err(|e| TransportError::DownloadFailed(e.to_string()))?;
        dst.flush().await?;

        debug!(file_id = %media, size, dest = %dest.display(), "Telegram: media downloaded");
        Ok(())
    }
}
