use std::path::Path;

use anyhow::Result;

use crate::ai::reviews::{index_reviews, read_reviews};
use crate::api::init_tracing;
use crate::core::AppConfig;
use crate::openai::OpenAIClient;
use crate::pinecone::PineconeClient;

pub async fn run(path: &str) -> Result<()> {
    init_tracing();
    let config = AppConfig::from_env()?;

    let reviews = read_reviews(Path::new(path))?;
    tracing::info!("Loaded {} reviews from {}", reviews.len(), path);

    let openai = OpenAIClient::new(
        &config.openai_api_hostname,
        &config.openai_api_key,
        &config.chat_model,
        &config.embedding_model,
    );
    let pinecone = PineconeClient::new(
        &config.pinecone_index_host,
        &config.pinecone_api_key,
        &config.pinecone_namespace,
    );
    let count = index_reviews(&openai, &pinecone, &reviews).await?;

    println!(
        "Upserted {} vectors into namespace {}",
        count, config.pinecone_namespace
    );
    Ok(())
}
