//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use axum::{Router, body::Body};
use futures_util::{StreamExt, stream};
use serde_json::json;

use profrag::ai::rag::RagChat;
use profrag::ai::services::{
    Completer, DeltaStream, Embedder, IndexRecord, RetrievedItem, VectorIndex,
};
use profrag::api::AppState;
use profrag::api::app;
use profrag::core::AppConfig;
use profrag::openai::Message;

/// Config pointing both upstream services at `upstream_url`, which is
/// expected to be a mock server.
pub fn test_config(upstream_url: &str) -> AppConfig {
    AppConfig {
        openai_api_hostname: upstream_url.to_string(),
        openai_api_key: String::from("test-api-key"),
        chat_model: String::from("gpt-4"),
        embedding_model: String::from("text-embedding-ada-002"),
        pinecone_api_key: String::from("test-pinecone-key"),
        pinecone_index_host: upstream_url.to_string(),
        pinecone_namespace: String::from("ns1"),
        web_ui_path: String::from("./web-ui/src"),
    }
}

/// Creates a test application router that talks to real HTTP
/// clients pointed at `upstream_url`.
pub fn test_app(upstream_url: &str) -> Router {
    app(Arc::new(AppState::new(test_config(upstream_url))))
}

/// Creates a test application router backed by in-process fakes.
pub fn test_app_with_chat(chat: RagChat) -> Router {
    let config = test_config("http://127.0.0.1:1");
    app(Arc::new(AppState::with_chat(chat, config)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// An OpenAI style event stream for `deltas`. Leave out the final
/// event to simulate a connection that drops mid-reply.
pub fn sse_body(deltas: &[&str], finished: bool) -> String {
    let mut body = String::new();
    for (i, delta) in deltas.iter().enumerate() {
        let last = finished && i == deltas.len() - 1;
        let chunk = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1694268190,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "delta": {"content": delta},
                "finish_reason": if last { Some("stop") } else { None },
            }]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    if finished {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

pub fn query_response(professors: &[(&str, &str, f64)]) -> String {
    let matches: Vec<_> = professors
        .iter()
        .enumerate()
        .map(|(i, (id, subject, stars))| {
            json!({
                "id": id,
                "score": 0.9 - (i as f64) * 0.1,
                "values": [],
                "metadata": {
                    "review": format!("{} explains things clearly.", id),
                    "subject": subject,
                    "stars": stars,
                }
            })
        })
        .collect();
    json!({"matches": matches, "namespace": "ns1"}).to_string()
}

pub struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, Error> {
        Ok(vec![0.1, 0.2, 0.3])
    }
}

pub struct FixedIndex(pub Vec<RetrievedItem>);

#[async_trait]
impl VectorIndex for FixedIndex {
    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _include_metadata: bool,
    ) -> Result<Vec<RetrievedItem>, Error> {
        Ok(self.0.clone())
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<usize, Error> {
        Ok(records.len())
    }
}

/// Replies with `deltas` and then, if `fail` is set, breaks off with
/// an error straight after the last delta instead of finishing.
pub struct ScriptedCompleter {
    pub deltas: Vec<&'static str>,
    pub fail: bool,
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn stream(&self, _messages: &[Message]) -> Result<DeltaStream, Error> {
        let items: Vec<Result<String, Error>> =
            self.deltas.iter().map(|d| Ok(d.to_string())).collect();
        let deltas = stream::iter(items);
        if !self.fail {
            return Ok(Box::pin(deltas));
        }
        let failure = stream::once(async { Err(anyhow!("connection reset by upstream")) });
        Ok(Box::pin(deltas.chain(failure)))
    }
}

pub fn scripted_chat(deltas: Vec<&'static str>, fail: bool) -> RagChat {
    RagChat::new(
        Arc::new(FixedEmbedder),
        Arc::new(FixedIndex(Vec::new())),
        Arc::new(ScriptedCompleter { deltas, fail }),
    )
}
