//! Splits long replies into platform-sized messages and sends them in order.
//!
//! A cut is placed at the last newline inside the window that has visible
//! text before it; the newline then opens the next chunk, so joining the
//! chunks gives back the original text exactly. Otherwise the window is cut
//! hard at `max_len` characters. Chunks that are still blank (a window made
//! only of whitespace) are never sent, since the platform rejects them.

use tracing::warn;

use querybot_channels::{Transport, TransportError};
use querybot_core::config::DeliveryConfig;
use querybot_core::types::ConversationId;

/// Split `text` into chunks of at most `max_len` characters.
///
/// Lengths are counted in `char`s so a cut never lands inside a code point.
/// Empty input yields a single empty chunk.
pub fn split(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    loop {
        // Byte offset just past the first `max_len` chars, if the rest is longer.
        let Some((window_end, _)) = rest.char_indices().nth(max_len) else {
            chunks.push(rest.to_string());
            break;
        };
        let window = &rest[..window_end];
        let cut = window
            .rmatch_indices('\n')
            .map(|(pos, _)| pos)
            .find(|&pos| !window[..pos].trim().is_empty())
            .unwrap_or(window_end);
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    chunks
}

/// Send `text` as consecutive messages, pausing `chunk_delay` between them.
///
/// Whitespace-only chunks are skipped. The first failed send aborts the
/// remaining chunks. Returns the number of messages sent.
pub async fn deliver(
    transport: &dyn Transport,
    conversation: ConversationId,
    text: &str,
    delivery: &DeliveryConfig,
) -> Result<usize, TransportError> {
    let chunks: Vec<String> = split(text, delivery.max_message_len)
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .collect();
    let delay = delivery.chunk_delay();

    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = transport.send_text(conversation, chunk).await {
            warn!(
                %conversation,
                chunk_index = i,
                chunks = chunks.len(),
                error = %e,
                "chunked delivery aborted"
            );
            return Err(e);
        }
    }

    Ok(chunks.len())
}
