pub mod error;
pub mod transport;
pub mod types;

pub use error::TransportError;
pub use transport::Transport;
pub use types::{EventPayload, InboundEvent, Sender};
