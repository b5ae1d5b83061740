//! Loading professor reviews into the vector index.

use std::fs;
use std::path::Path;

use anyhow::{Context, Error, Result};
use serde::{Deserialize, Serialize};

use super::services::{Embedder, IndexRecord, ReviewMetadata, VectorIndex};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub professor: String,
    pub review: String,
    pub subject: String,
    pub stars: f64,
}

#[derive(Debug, Deserialize)]
struct ReviewsFile {
    reviews: Vec<Review>,
}

/// Read a `{"reviews": [...]}` JSON file.
pub fn read_reviews(path: &Path) -> Result<Vec<Review>, Error> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read reviews from {}", path.display()))?;
    let file: ReviewsFile = serde_json::from_str(&data)
        .with_context(|| format!("Invalid reviews file {}", path.display()))?;
    Ok(file.reviews)
}

/// Embed each review and write it to the index keyed by professor
/// name. A later review for the same professor replaces an earlier
/// one. Returns the number of vectors written.
pub async fn index_reviews(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    reviews: &[Review],
) -> Result<usize, Error> {
    let mut records = Vec::with_capacity(reviews.len());
    for r in reviews {
        let values = embedder
            .embed(&r.review)
            .await
            .with_context(|| format!("Failed to embed review for {}", r.professor))?;
        records.push(IndexRecord {
            id: r.professor.clone(),
            values,
            metadata: ReviewMetadata {
                review: r.review.clone(),
                subject: r.subject.clone(),
                stars: r.stars,
            },
        });
    }

    tracing::info!("Embedded {} reviews", records.len());
    index.upsert(&records).await
}
