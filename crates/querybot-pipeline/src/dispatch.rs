//! Per-event state machine.
//!
//! [`handle_event`] is the only entry point channel adapters call. It wraps
//! [`dispatch`] with the indicator lifecycle and turns every failure into a
//! single reply, so nothing a handler does can escape to the process.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use querybot_backend::QueryOutcome;
use querybot_channels::{EventPayload, InboundEvent};
use querybot_core::types::{ConversationId, MediaId, PendingResultSet};
use querybot_media::Transcription;

use crate::chunker;
use crate::commands::Command;
use crate::context::BotContext;
use crate::error::DispatchError;
use crate::indicator::IndicatorController;
use crate::query;
use crate::replies;

/// Where an event is in its handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Indicating,
    Routing,
    Transcribing,
    Extracting,
    QueryingDirect,
    Querying,
    Responding,
}

/// What an inbound payload asks for, decided once from its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    Query(String),
    Transcribe(MediaId),
    Extract(MediaId),
    Unsupported(String),
}

impl Route {
    pub fn classify(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Text { text } => match Command::parse(text) {
                Some(cmd) => Route::Command(cmd),
                None => Route::Query(text.trim().to_string()),
            },
            EventPayload::Voice { media } => Route::Transcribe(media.clone()),
            EventPayload::Photo { media } => Route::Extract(media.clone()),
            EventPayload::Sticker { .. } => Route::Unsupported("sticker".to_string()),
            EventPayload::Unsupported { kind } => Route::Unsupported(kind.clone()),
        }
    }
}

fn enter(conversation: ConversationId, stage: Stage) {
    debug!(%conversation, ?stage, "stage");
}

/// Handle one inbound event end to end.
///
/// The indicator is opened first and closed after the dispatcher finishes,
/// whether it succeeded, failed or panicked. Failures have already been
/// answered with their user-facing reply when this returns; the error is
/// handed back for the caller's logs and tests.
pub async fn handle_event<C: BotContext>(
    ctx: Arc<C>,
    event: InboundEvent,
) -> Result<(), DispatchError> {
    let conversation = event.conversation;
    info!(
        %conversation,
        sender = %event.sender.first_name,
        sender_id = event.sender.id,
        kind = event.payload.kind(),
        "inbound event"
    );

    enter(conversation, Stage::Indicating);
    let request = IndicatorController::for_context(ctx.as_ref())
        .open(conversation)
        .await;

    let worker = Arc::clone(&ctx);
    let joined = tokio::spawn(async move {
        let result = dispatch(worker.as_ref(), &event).await;
        if let Err(e) = &result {
            report(worker.as_ref(), conversation, e).await;
        }
        result
    })
    .await;

    IndicatorController::for_context(ctx.as_ref())
        .close(request)
        .await;
    enter(conversation, Stage::Idle);

    match joined {
        Ok(result) => result,
        Err(e) => {
            error!(%conversation, %request, error = %e, "event handler panicked");
            let err = DispatchError::Panicked;
            report(ctx.as_ref(), conversation, &err).await;
            Err(err)
        }
    }
}

/// Route the event and run its stage sequence.
pub async fn dispatch<C: BotContext + ?Sized>(
    ctx: &C,
    event: &InboundEvent,
) -> Result<(), DispatchError> {
    let conversation = event.conversation;
    enter(conversation, Stage::Routing);

    match Route::classify(&event.payload) {
        Route::Command(cmd) => run_command(ctx, event, cmd).await,
        Route::Query(text) => {
            enter(conversation, Stage::QueryingDirect);
            info!(%conversation, sender = %event.sender.first_name, "query: {text}");
            run_query(ctx, conversation, &text).await
        }
        Route::Transcribe(media) => {
            enter(conversation, Stage::Transcribing);
            let scratch = scratch_dir(ctx).await?;
            let audio = scratch.path().join("voice.ogg");
            ctx.transport().download_media(&media, &audio).await?;

            match ctx.transcriber().transcribe(&audio).await? {
                Transcription::Recognized(text) => {
                    info!(%conversation, sender = %event.sender.first_name, "voice: {text}");
                    run_query(ctx, conversation, &text).await
                }
                Transcription::Unrecognized => Err(DispatchError::Unrecognized),
            }
        }
        Route::Extract(media) => {
            enter(conversation, Stage::Extracting);
            let scratch = scratch_dir(ctx).await?;
            let image = scratch.path().join("photo.jpg");
            ctx.transport().download_media(&media, &image).await?;

            let text = extract(ctx, &image).await?;
            enter(conversation, Stage::Responding);
            if text.is_empty() {
                ctx.transport()
                    .send_text(conversation, replies::NO_TEXT_IN_IMAGE)
                    .await?;
            } else {
                info!(%conversation, chars = text.len(), "image text extracted");
                deliver(ctx, conversation, &replies::extracted(&text)).await?;
            }
            Ok(())
        }
        Route::Unsupported(kind) => Err(DispatchError::Unsupported { kind }),
    }
}

async fn run_command<C: BotContext + ?Sized>(
    ctx: &C,
    event: &InboundEvent,
    cmd: Command,
) -> Result<(), DispatchError> {
    let conversation = event.conversation;
    let transport = ctx.transport();
    debug!(%conversation, command = cmd.name(), "command");

    match cmd {
        Command::Start => {
            transport
                .send_text(conversation, &replies::welcome(&event.sender.first_name))
                .await?;
            transport.send_text(conversation, replies::EXAMPLES).await?;
        }
        Command::Help => {
            deliver(ctx, conversation, replies::HELP).await?;
        }
        Command::Ping => {
            transport.send_text(conversation, replies::PONG).await?;
        }
        Command::Yes => {
            let pending = ctx
                .sessions()
                .take_pending(conversation)
                .ok_or(DispatchError::NoPendingResult)?;
            enter(conversation, Stage::Responding);
            let archive = ctx.bundler().bundle(&pending.images).await?;
            transport.send_document(conversation, &archive).await?;
            info!(%conversation, images = pending.len(), query = %pending.query, "sent result images");
            if let Err(e) = archive.close() {
                warn!(%conversation, error = %e, "failed to remove delivered archive");
            }
        }
        Command::No => {
            ctx.sessions()
                .take_pending(conversation)
                .ok_or(DispatchError::NoPendingResult)?;
            transport.send_text(conversation, replies::DISCARDED).await?;
        }
    }
    Ok(())
}

async fn run_query<C: BotContext + ?Sized>(
    ctx: &C,
    conversation: ConversationId,
    text: &str,
) -> Result<(), DispatchError> {
    enter(conversation, Stage::Querying);
    let backend = ctx.backend();
    let outcome = match backend.query(text, ctx.settings().scan_timeout).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(%conversation, backend = backend.name(), error = %e, "backend query failed");
            return Err(DispatchError::NoResult);
        }
    };

    let groups = match outcome {
        QueryOutcome::NoResult => return Err(DispatchError::NoResult),
        QueryOutcome::Groups(groups) => groups,
    };
    let answer = query::select(groups);
    if answer.text.is_empty() {
        return Err(DispatchError::NoResult);
    }

    // A fresh answer supersedes whatever an older query left for `/yes`.
    if ctx.sessions().take_pending(conversation).is_some() {
        debug!(%conversation, "dropped unconsumed pending result");
    }

    enter(conversation, Stage::Responding);
    deliver(ctx, conversation, &answer.text).await?;

    if !answer.images.is_empty() {
        let images = answer.images.len();
        ctx.sessions()
            .put_pending(conversation, PendingResultSet::new(text, answer.images));
        debug!(%conversation, images, "pending result stored");
        ctx.transport()
            .send_text(conversation, replies::ASK_IMAGES)
            .await?;
    }
    Ok(())
}

async fn extract<C: BotContext + ?Sized>(ctx: &C, image: &Path) -> Result<String, DispatchError> {
    let text = ctx
        .extractor()
        .extract_text(image, &ctx.settings().ocr_languages)
        .await?;
    Ok(text.trim().to_string())
}

async fn deliver<C: BotContext + ?Sized>(
    ctx: &C,
    conversation: ConversationId,
    text: &str,
) -> Result<(), DispatchError> {
    chunker::deliver(ctx.transport(), conversation, text, &ctx.settings().delivery).await?;
    Ok(())
}

/// Per-event scratch directory; removed when the guard drops.
async fn scratch_dir<C: BotContext + ?Sized>(ctx: &C) -> Result<TempDir, DispatchError> {
    let work_dir = &ctx.settings().work_dir;
    tokio::fs::create_dir_all(work_dir).await?;
    Ok(tempfile::Builder::new()
        .prefix("event-")
        .tempdir_in(work_dir)?)
}

/// Answer a failed event with its fixed reply.
async fn report<C: BotContext + ?Sized>(
    ctx: &C,
    conversation: ConversationId,
    err: &DispatchError,
) {
    if err.is_expected() {
        info!(%conversation, reason = %err, "event answered with fixed reply");
    } else {
        warn!(%conversation, error = %err, "event handling failed");
    }

    if let Err(e) = ctx
        .transport()
        .send_text(conversation, err.user_message())
        .await
    {
        warn!(%conversation, error = %e, "failed to deliver error reply");
    }
}

#[cfg(test)]
mod tests {
    use querybot_channels::Sender;

    use super::*;

    fn text(t: &str) -> EventPayload {
        EventPayload::Text { text: t.into() }
    }

    #[test]
    fn commands_route_before_queries() {
        assert_eq!(Route::classify(&text("/yes")), Route::Command(Command::Yes));
        assert_eq!(
            Route::classify(&text(" 1GHz to Hz ")),
            Route::Query("1GHz to Hz".into())
        );
        assert_eq!(
            Route::classify(&text("/unknown thing")),
            Route::Query("/unknown thing".into())
        );
    }

    #[test]
    fn media_routes() {
        let voice = EventPayload::Voice {
            media: MediaId::from("v1"),
        };
        assert_eq!(Route::classify(&voice), Route::Transcribe(MediaId::from("v1")));
        let photo = EventPayload::Photo {
            media: MediaId::from("p1"),
        };
        assert_eq!(Route::classify(&photo), Route::Extract(MediaId::from("p1")));
    }

    #[test]
    fn stickers_and_others_are_unsupported() {
        let sticker = EventPayload::Sticker {
            emoji: Some("🙂".into()),
        };
        assert_eq!(Route::classify(&sticker), Route::Unsupported("sticker".into()));
        let doc = EventPayload::Unsupported {
            kind: "document".into(),
        };
        assert_eq!(Route::classify(&doc), Route::Unsupported("document".into()));
    }

    #[test]
    fn sender_is_not_consulted_for_routing() {
        let event = InboundEvent::text(
            ConversationId(1),
            Sender {
                id: 1,
                first_name: "/yes".into(),
                username: None,
            },
            "2+2",
        );
        assert_eq!(Route::classify(&event.payload), Route::Query("2+2".into()));
    }
}
