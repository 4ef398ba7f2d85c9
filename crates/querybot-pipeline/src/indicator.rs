//! "Processing…" indicator shown while an event is being handled.
//!
//! The handle lives in the session store under the event's [`RequestId`], so
//! concurrent events in one conversation each own their own indicator.

use tracing::{debug, warn};

use querybot_channels::Transport;
use querybot_core::types::{ConversationId, RequestId};
use querybot_core::SessionStore;

use crate::context::BotContext;

pub struct IndicatorController<'a> {
    transport: &'a dyn Transport,
    sessions: &'a SessionStore,
    text: &'a str,
}

impl<'a> IndicatorController<'a> {
    pub fn new(transport: &'a dyn Transport, sessions: &'a SessionStore, text: &'a str) -> Self {
        Self {
            transport,
            sessions,
            text,
        }
    }

    pub fn for_context<C: BotContext + ?Sized>(ctx: &'a C) -> Self {
        Self::new(
            ctx.transport(),
            ctx.sessions(),
            &ctx.settings().delivery.indicator_text,
        )
    }

    /// Send the indicator and remember its handle under a fresh request id.
    ///
    /// A failed send is logged and otherwise ignored: the request id is still
    /// returned, and closing it later is a no-op.
    pub async fn open(&self, conversation: ConversationId) -> RequestId {
        let request = RequestId::new();
        match self.transport.send_text(conversation, self.text).await {
            Ok(message) => self.sessions.put_indicator(request, message),
            Err(e) => warn!(%conversation, %request, error = %e, "failed to send indicator"),
        }
        request
    }

    /// Remove the indicator for `request`, if it is still around.
    ///
    /// Returns `false` when there was nothing to close (never opened, already
    /// closed, or evicted by the flush). Delete failures are logged only.
    pub async fn close(&self, request: RequestId) -> bool {
        let Some(message) = self.sessions.take_indicator(request) else {
            debug!(%request, "no indicator to close");
            return false;
        };
        if let Err(e) = self.transport.delete_message(&message).await {
            warn!(
                conversation = %message.conversation,
                message_id = message.message_id,
                error = %e,
                "failed to delete indicator"
            );
        }
        true
    }
}
