use std::path::Path;

use async_trait::async_trait;

use querybot_core::types::{ConversationId, MediaId, MessageRef};

use crate::error::TransportError;

/// Outbound side of a chat platform.
///
/// Implementations must be `Send + Sync`: one instance is shared by every
/// concurrently running event handler, so all methods take `&self`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a plain text message.
    async fn send_text(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Result<MessageRef, TransportError>;

    /// Upload a local file as a document attachment.
    async fn send_document(
        &self,
        conversation: ConversationId,
        path: &Path,
    ) -> Result<MessageRef, TransportError>;

    /// Delete a message previously sent by the bot.
    async fn delete_message(&self, message: &MessageRef) -> Result<(), TransportError>;

    /// Download inbound media to `dest`.
    ///
    /// The caller owns `dest` and is responsible for removing it.
    async fn download_media(&self, media: &MediaId, dest: &Path) -> Result<(), TransportError>;
}
