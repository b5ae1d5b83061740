//! Retrieval augmented chat. One turn embeds the newest user message,
//! looks up the closest professor reviews, appends them to that
//! message and streams the model's reply.

use std::sync::Arc;

use anyhow::{Error, Result, anyhow};

use super::prompt::{SYSTEM_PROMPT, render_retrieved_reviews};
use super::services::{Completer, DeltaStream, Embedder, RetrievedItem, VectorIndex};
use crate::openai::{Message, Role};

/// Number of reviews retrieved for every turn.
pub const TOP_K: usize = 3;

/// Build the messages sent to the model:
/// `[system] + transcript[..last] + [last user message + context]`.
pub fn augmented_prompt(
    system_prompt: &str,
    transcript: &[Message],
    context: &str,
) -> Result<Vec<Message>, Error> {
    let (last, history) = transcript
        .split_last()
        .ok_or(anyhow!("Transcript is empty"))?;

    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(Message::new(Role::System, system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(Message::new(
        Role::User,
        &format!("{}{}", last.content, context),
    ));

    Ok(messages)
}

pub struct RagChat {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    completer: Arc<dyn Completer>,
    system_prompt: String,
}

impl RagChat {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        completer: Arc<dyn Completer>,
    ) -> Self {
        Self {
            embedder,
            index,
            completer,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Find the reviews closest to `query`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedItem>, Error> {
        let vector = self.embedder.embed(query).await?;
        let items = self.index.query(&vector, TOP_K, true).await?;

        tracing::debug!(
            "Retrieved {} reviews: {:?}",
            items.len(),
            items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>()
        );

        Ok(items)
    }

    /// Everything up to, but not including, the completion call.
    pub async fn prompt(&self, transcript: &[Message]) -> Result<Vec<Message>, Error> {
        let query = &transcript
            .last()
            .ok_or(anyhow!("Transcript is empty"))?
            .content;
        let items = self.retrieve(query).await?;
        let context = render_retrieved_reviews(&items)?;
        augmented_prompt(&self.system_prompt, transcript, &context)
    }

    /// Run a turn and return the reply as a stream of text deltas.
    /// Any failure before the first delta is returned as an error.
    pub async fn reply(&self, transcript: &[Message]) -> Result<DeltaStream, Error> {
        let messages = self.prompt(transcript).await?;
        self.completer.stream(&messages).await
    }
}
