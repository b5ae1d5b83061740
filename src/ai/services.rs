//! The upstream collaborators a chat turn depends on. Each one is a
//! trait so the request pipeline can be driven by the real HTTP
//! clients (`openai`, `pinecone`) or by fakes in tests.

use std::pin::Pin;

use anyhow::{Error, Result};
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::openai::Message;

/// Incremental text deltas produced by a streaming completion, in
/// emission order. An `Err` item means the upstream failed after
/// streaming started and nothing more will follow.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Metadata stored alongside each review vector.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ReviewMetadata {
    pub review: String,
    pub subject: String,
    pub stars: f64,
}

/// A nearest neighbor returned by the vector index for one request.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RetrievedItem {
    pub id: String,
    pub review: String,
    pub subject: String,
    pub stars: f64,
}

/// A vector to write into the index.
#[derive(Clone, Serialize, Debug)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ReviewMetadata,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Error>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<RetrievedItem>, Error>;

    /// Returns the number of vectors written.
    async fn upsert(&self, records: &[IndexRecord]) -> Result<usize, Error>;
}

#[async_trait]
pub trait Completer: Send + Sync {
    /// Start a streaming completion. Errors returned here happen
    /// before any delta is produced.
    async fn stream(&self, messages: &[Message]) -> Result<DeltaStream, Error>;
}
