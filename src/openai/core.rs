use std::time::Duration;

use anyhow::{Error, Result, anyhow, bail};
use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ai::services::{Completer, DeltaStream, Embedder};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

pub async fn embedding(
    input: &str,
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<Vec<f32>, Error> {
    let payload = json!({
        "model": model,
        "input": input,
    });
    let url = format!("{}/v1/embeddings", api_hostname.trim_end_matches("/"));
    let response: EmbeddingResponse = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or(anyhow!("Embedding response contained no data"))
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChunkChoice>,
    error: Option<Value>,
}

/// Turns the raw bytes of an OpenAI server-sent event stream into
/// content deltas. Events can be split across network frames (and
/// so can multi-byte characters) so bytes are buffered until a full
/// event is available.
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl DeltaDecoder {
    /// Feed the next frame and return any content deltas that are
    /// now complete, in order. If an event in the frame fails, the
    /// deltas decoded before it are still returned along with the
    /// error and nothing after it is decoded.
    pub fn push(&mut self, bytes: &[u8]) -> (Vec<String>, Option<Error>) {
        self.buffer.extend_from_slice(bytes);

        let mut deltas = Vec::new();
        while let Some((event_end, separator_len)) = find_event_end(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..event_end + separator_len).collect();
            match self.decode_event(&event[..event_end], &mut deltas) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => return (deltas, Some(e)),
            }
        }

        (deltas, None)
    }

    /// Whether the upstream signalled the end of the completion.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    // Returns true once the `[DONE]` terminator is seen
    fn decode_event(&mut self, event: &[u8], deltas: &mut Vec<String>) -> Result<bool, Error> {
        let event = std::str::from_utf8(event)?;

        for line in event.lines() {
            // Anything other than data lines (comments, ids) is
            // ignored
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                self.finished = true;
                return Ok(true);
            }

            let chunk = serde_json::from_str::<CompletionChunk>(data).inspect_err(|e| {
                tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
            })?;
            if let Some(err) = chunk.error {
                bail!("Completion failed mid-stream: {}", err);
            }
            let Some(choice) = chunk.choices.into_iter().next() else {
                continue;
            };
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    deltas.push(content);
                }
            }
            if choice.finish_reason.is_some() {
                self.finished = true;
            }
        }

        Ok(false)
    }
}

/// Position and length of the first blank line ending an event.
/// Servers may use either LF or CRLF line endings.
fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Start a streaming chat completion. The request is sent and its
/// status checked before returning so that setup failures surface
/// as an error here rather than inside the stream.
pub async fn completion_stream(
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<DeltaStream, Error> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 5))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?;

    let mut bytes = response.bytes_stream();

    let deltas = stream! {
        let mut decoder = DeltaDecoder::default();

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(Error::from(e));
                    return;
                }
            };
            let (deltas, error) = decoder.push(&chunk);
            for delta in deltas {
                yield Ok(delta);
            }
            if let Some(e) = error {
                yield Err(e);
                return;
            }
            if decoder.is_finished() {
                return;
            }
        }

        if !decoder.is_finished() {
            yield Err(anyhow!("Completion stream ended before the response was finished"));
        }
    };

    Ok(Box::pin(deltas))
}

/// Client for an OpenAI compatible API providing both embeddings
/// and streaming chat completions.
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    api_hostname: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
}

impl OpenAIClient {
    pub fn new(api_hostname: &str, api_key: &str, chat_model: &str, embedding_model: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAIClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        embedding(text, &self.api_hostname, &self.api_key, &self.embedding_model).await
    }
}

#[async_trait]
impl Completer for OpenAIClient {
    async fn stream(&self, messages: &[Message]) -> Result<DeltaStream, Error> {
        completion_stream(messages, &self.api_hostname, &self.api_key, &self.chat_model).await
    }
}
