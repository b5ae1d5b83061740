use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::ai::services::{IndexRecord, RetrievedItem, ReviewMetadata, VectorIndex};

// Pinecone caps the size of a single upsert request
const UPSERT_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ScoredVector {
    pub id: String,
    pub metadata: Option<ReviewMetadata>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

/// Find the `top_k` nearest vectors in `namespace`. Matches are
/// returned in the order the index ranks them.
pub async fn query(
    vector: &[f32],
    top_k: usize,
    include_metadata: bool,
    namespace: &str,
    index_host: &str,
    api_key: &str,
) -> Result<Vec<ScoredVector>, Error> {
    let payload = json!({
        "vector": vector,
        "topK": top_k,
        "includeMetadata": include_metadata,
        "namespace": namespace,
    });
    let url = format!("{}/query", index_host.trim_end_matches("/"));
    let response: QueryResponse = reqwest::Client::new()
        .post(url)
        .header("Api-Key", api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(30))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response.matches)
}

/// Write `records` into `namespace`, replacing any vectors with the
/// same ID.
pub async fn upsert(
    records: &[IndexRecord],
    namespace: &str,
    index_host: &str,
    api_key: &str,
) -> Result<usize, Error> {
    let url = format!("{}/vectors/upsert", index_host.trim_end_matches("/"));
    let client = reqwest::Client::new();
    let mut total = 0;

    for batch in records.chunks(UPSERT_BATCH_SIZE) {
        let payload = json!({
            "vectors": batch,
            "namespace": namespace,
        });
        let response: UpsertResponse = client
            .post(&url)
            .header("Api-Key", api_key)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::debug!("Upserted {} vectors", response.upserted_count);
        total += response.upserted_count;
    }

    Ok(total)
}

/// Client for a single Pinecone index namespace.
#[derive(Clone, Debug)]
pub struct PineconeClient {
    index_host: String,
    api_key: String,
    namespace: String,
}

impl PineconeClient {
    pub fn new(index_host: &str, api_key: &str, namespace: &str) -> Self {
        Self {
            index_host: index_host.to_string(),
            api_key: api_key.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<RetrievedItem>, Error> {
        let matches = query(
            vector,
            top_k,
            include_metadata,
            &self.namespace,
            &self.index_host,
            &self.api_key,
        )
        .await?;

        matches
            .into_iter()
            .map(|m| -> Result<RetrievedItem, Error> {
                let metadata = m
                    .metadata
                    .ok_or(anyhow!("Match {} is missing review metadata", m.id))?;
                Ok(RetrievedItem {
                    id: m.id,
                    review: metadata.review,
                    subject: metadata.subject,
                    stars: metadata.stars,
                })
            })
            .collect()
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<usize, Error> {
        upsert(records, &self.namespace, &self.index_host, &self.api_key).await
    }
}
