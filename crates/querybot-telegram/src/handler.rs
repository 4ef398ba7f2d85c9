//! Telegram message handler registered in the teloxide Dispatcher.
//!
//! Converts each `Message` into an `InboundEvent` once, here, and hands it
//! to the pipeline in its own task so slow queries never hold up polling.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::debug;

use querybot_channels::{EventPayload, InboundEvent, Sender};
use querybot_core::types::{ConversationId, MediaId};
use querybot_pipeline::{handle_event, BotContext};

pub async fn handle_message<C: BotContext>(msg: Message, ctx: Arc<C>) -> ResponseResult<()> {
    let Some(event) = to_event(&msg) else {
        return Ok(());
    };

    tokio::spawn(async move {
        let conversation = event.conversation;
        if let Err(e) = handle_event(ctx, event).await {
            debug!(%conversation, error = %e, "event finished with error reply");
        }
    });

    Ok(())
}

/// Build the channel-neutral event for a message.
///
/// Returns `None` for messages from bots, messages without a sender and
/// service messages (joins, pins, …) that carry no content.
pub fn to_event(msg: &Message) -> Option<InboundEvent> {
    let from = msg.from.as_ref()?;
    if from.is_bot {
        return None;
    }
    let payload = payload_of(msg)?;

    Some(InboundEvent {
        conversation: ConversationId(msg.chat.id.0),
        sender: Sender {
            id: from.id.0,
            first_name: from.first_name.clone(),
            username: from.username.clone(),
        },
        payload,
    })
}

fn payload_of(msg: &Message) -> Option<EventPayload> {
    if let Some(text) = msg.text() {
        if text.trim().is_empty() {
            return None;
        }
        return Some(EventPayload::Text {
            text: text.to_string(),
        });
    }

    if let Some(voice) = msg.voice() {
        return Some(EventPayload::Voice {
            media: MediaId(voice.file.id.clone()),
        });
    }

    // Highest resolution is the last size.
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return Some(EventPayload::Photo {
            media: MediaId(photo.file.id.clone()),
        });
    }

    if let Some(sticker) = msg.sticker() {
        return Some(EventPayload::Sticker {
            emoji: sticker.emoji.clone(),
        });
    }

    let kind = if msg.document().is_some() {
        "document"
    } else if msg.audio().is_some() {
        "audio"
    } else if msg.video().is_some() {
        "video"
    } else if msg.video_note().is_some() {
        "video_note"
    } else if msg.animation().is_some() {
        "animation"
    } else if msg.location().is_some() {
        "location"
    } else if msg.contact().is_some() {
        "contact"
    } else if msg.poll().is_some() {
        "poll"
    } else {
        return None;
    };

    Some(EventPayload::Unsupported {
        kind: kind.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(extra: serde_json::Value) -> Message {
        let mut base = json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Ada" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Ada",
                "username": "ada"
            }
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).expect("deserialize message")
    }

    #[test]
    fn text_message_becomes_text_event() {
        let event = to_event(&message(json!({ "text": "1GHz to Hz" }))).unwrap();
        assert_eq!(event.conversation, ConversationId(42));
        assert_eq!(event.sender.id, 1001);
        assert_eq!(event.sender.first_name, "Ada");
        assert!(matches!(event.payload, EventPayload::Text { ref text } if text == "1GHz to Hz"));
    }

    #[test]
    fn voice_message_carries_file_id() {
        let event = to_event(&message(json!({
            "voice": {
                "file_id": "voice-file-id",
                "file_unique_id": "voice-unique-id",
                "duration": 2,
                "mime_type": "audio/ogg",
                "file_size": 123
            }
        })))
        .unwrap();
        assert!(matches!(
            event.payload,
            EventPayload::Voice { ref media } if media.as_str() == "voice-file-id"
        ));
    }

    #[test]
    fn photo_uses_largest_size() {
        let event = to_event(&message(json!({
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 10 },
                { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 1280, "file_size": 900 }
            ]
        })))
        .unwrap();
        assert!(matches!(
            event.payload,
            EventPayload::Photo { ref media } if media.as_str() == "large"
        ));
    }

    #[test]
    fn document_is_unsupported() {
        let event = to_event(&message(json!({
            "document": { "file_id": "doc", "file_unique_id": "d", "file_name": "a.pdf", "file_size": 5 }
        })))
        .unwrap();
        assert!(matches!(
            event.payload,
            EventPayload::Unsupported { ref kind } if kind == "document"
        ));
    }

    #[test]
    fn bots_are_ignored() {
        let mut msg = message(json!({ "text": "hello" }));
        if let Some(from) = msg.from.as_mut() {
            from.is_bot = true;
        }
        assert!(to_event(&msg).is_none());
    }

    #[test]
    fn blank_text_is_ignored() {
        assert!(to_event(&message(json!({ "text": "   " }))).is_none());
    }
}
