pub mod config;
pub mod error;
pub mod flush;
pub mod session;
pub mod types;

pub use error::QuerybotError;
pub use flush::SessionFlusher;
pub use session::{SessionEntry, SessionKey, SessionStore};
pub use types::{ConversationId, ImageRef, MediaId, MessageRef, PendingResultSet, RequestId};
