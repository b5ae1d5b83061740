//! Public types for the chat API
use crate::openai::Message;

/// The full transcript in order, ending with the newest user message.
pub type ChatRequest = Vec<Message>;

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";
