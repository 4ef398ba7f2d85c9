pub mod adapter;
pub mod error;
pub mod handler;
pub mod transport;

pub use adapter::TelegramAdapter;
pub use error::TelegramError;
pub use transport::TelegramTransport;
