use anyhow::Result;
use serde_json::json;

use crate::api::AppState;
use crate::core::AppConfig;

pub async fn run(term: &str) -> Result<()> {
    let state = AppState::new(AppConfig::from_env()?);
    let results = state.chat.retrieve(term).await?;
    println!(
        "{}",
        json!({
            "query": term,
            "results": results,
        })
    );
    Ok(())
}
