use thiserror::Error;

use super::decoder::Utf8Decoder;
use crate::openai::{Message, Role};

pub const GREETING: &str =
    "Hi! I'm the Rate My Professor support assistant. How can I help you today?";

/// Where the session is in answering the latest message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingFirstByte,
    Streaming,
    Settled,
}

impl Phase {
    /// A reply is in flight and new submissions are rejected.
    pub fn is_pending(&self) -> bool {
        matches!(self, Phase::AwaitingFirstByte | Phase::Streaming)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The user sent a message
    Submit(String),
    /// Raw bytes of the reply arrived
    ChunkReceived(Vec<u8>),
    /// The reply stream ended normally
    StreamSettled,
    /// The request or the reply stream failed
    StreamFailed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("A reply is still streaming")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("No reply is streaming")]
    NotStreaming,
}

/// The transcript as the user sees it. Every change goes through
/// `apply` which returns the next session and leaves the current one
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    transcript: Vec<Message>,
    phase: Phase,
    // The reply received so far for the in-flight turn
    accumulator: String,
    decoder: Utf8Decoder,
    error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(vec![Message::new(Role::Assistant, GREETING)])
    }
}

impl Session {
    pub fn new(transcript: Vec<Message>) -> Self {
        Self {
            transcript,
            phase: Phase::Idle,
            accumulator: String::new(),
            decoder: Utf8Decoder::default(),
            error: None,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Why the last reply failed, if it did.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The messages to send for the in-flight turn: the transcript
    /// without the assistant placeholder.
    pub fn outgoing(&self) -> &[Message] {
        if self.phase.is_pending() {
            &self.transcript[..self.transcript.len() - 1]
        } else {
            &self.transcript
        }
    }

    pub fn apply(&self, event: Event) -> Result<Session, SessionError> {
        let mut next = self.clone();

        match event {
            Event::Submit(text) => {
                if self.phase.is_pending() {
                    return Err(SessionError::Busy);
                }
                if text.trim().is_empty() {
                    return Err(SessionError::EmptyMessage);
                }
                // Both messages land in the same transition so nothing
                // ever sees the user message without its placeholder
                next.transcript.push(Message::new(Role::User, &text));
                next.transcript.push(Message::new(Role::Assistant, ""));
                next.accumulator.clear();
                next.decoder = Utf8Decoder::default();
                next.error = None;
                next.phase = Phase::AwaitingFirstByte;
            }
            Event::ChunkReceived(bytes) => {
                if !self.phase.is_pending() {
                    return Err(SessionError::NotStreaming);
                }
                let text = next.decoder.decode(&bytes);
                next.accumulator.push_str(&text);
                next.set_reply();
                next.phase = Phase::Streaming;
            }
            Event::StreamSettled => {
                if !self.phase.is_pending() {
                    return Err(SessionError::NotStreaming);
                }
                let rest = next.decoder.finish();
                next.accumulator.push_str(&rest);
                next.set_reply();
                next.phase = Phase::Settled;
            }
            Event::StreamFailed(reason) => {
                if !self.phase.is_pending() {
                    return Err(SessionError::NotStreaming);
                }
                // Keep whatever arrived before the failure
                let rest = next.decoder.finish();
                next.accumulator.push_str(&rest);
                next.set_reply();
                next.error = Some(reason);
                next.phase = Phase::Settled;
            }
        }

        Ok(next)
    }

    fn set_reply(&mut self) {
        if let Some(last) = self.transcript.last_mut() {
            last.content = self.accumulator.clone();
        }
    }
}
