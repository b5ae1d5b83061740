//! The client side of a chat: the transcript the user sees and how a
//! streamed reply is rendered into it.

mod client;
mod decoder;
mod state;

pub use client::exchange;
pub use decoder::Utf8Decoder;
pub use state::{Event, GREETING, Phase, Session, SessionError};
