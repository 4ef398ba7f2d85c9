use querybot_core::types::{ConversationId, MediaId};

/// Who sent an inbound event.
#[derive(Debug, Clone)]
pub struct Sender {
    /// Platform-native user id.
    pub id: u64,
    /// Display name used in greetings and log lines.
    pub first_name: String,
    pub username: Option<String>,
}

/// Content of an inbound event, classified once at ingestion.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Plain text or a slash command.
    Text { text: String },
    /// Voice note (OGG/Opus on Telegram).
    Voice { media: MediaId },
    /// Photo; `media` is the highest-resolution size.
    Photo { media: MediaId },
    Sticker { emoji: Option<String> },
    /// Anything else (documents, video, locations, …).
    Unsupported { kind: String },
}

impl EventPayload {
    /// Short label for log lines.
    pub fn kind(&self) -> &str {
        match self {
            EventPayload::Text { .. } => "text",
            EventPayload::Voice { .. } => "voice",
            EventPayload::Photo { .. } => "photo",
            EventPayload::Sticker { .. } => "sticker",
            EventPayload::Unsupported { kind } => kind,
        }
    }
}

/// A message received from the chat platform.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub conversation: ConversationId,
    pub sender: Sender,
    pub payload: EventPayload,
}

impl InboundEvent {
    pub fn text(conversation: ConversationId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            conversation,
            sender,
            payload: EventPayload::Text { text: text.into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels() {
        assert_eq!(EventPayload::Text { text: "hi".into() }.kind(), "text");
        assert_eq!(
            EventPayload::Voice {
                media: MediaId::from("f1")
            }
            .kind(),
            "voice"
        );
        assert_eq!(
            EventPayload::Unsupported {
                kind: "location".into()
            }
            .kind(),
            "location"
        );
    }
}
