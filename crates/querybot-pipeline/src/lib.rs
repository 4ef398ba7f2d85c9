//! Channel-agnostic event handling.
//!
//! Channel adapters build an `InboundEvent` and call [`handle_event`]; the
//! pipeline classifies it, runs the stage sequence, delivers the reply and
//! keeps the session store consistent.

pub mod chunker;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod indicator;
pub mod query;
pub mod replies;

pub use context::{BotContext, PipelineSettings};
pub use dispatch::{dispatch, handle_event, Route, Stage};
pub use error::DispatchError;
pub use indicator::IndicatorController;
