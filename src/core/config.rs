use std::env;

use anyhow::{Result, anyhow};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub pinecone_api_key: String,
    pub pinecone_index_host: String,
    pub pinecone_namespace: String,
    pub web_ui_path: String,
}

impl AppConfig {
    /// Read the config from the process environment. Credentials for
    /// both upstream services are required, everything else has a
    /// default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup so it can be constructed
    /// without touching the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or(anyhow!("Missing env var {}", key));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or(default.to_string());

        let openai_api_key = required("OPENAI_API_KEY")?;
        let pinecone_api_key = required("PINECONE_API_KEY")?;
        let pinecone_index_host = required("PINECONE_INDEX_HOST")?;
        let openai_api_hostname = or_default("PROFRAG_OPENAI_API_HOST", "https://api.openai.com");
        let chat_model = or_default("PROFRAG_CHAT_MODEL", "gpt-4");
        let embedding_model = or_default("PROFRAG_EMBEDDING_MODEL", "text-embedding-ada-002");
        let pinecone_namespace = or_default("PINECONE_NAMESPACE", "ns1");
        let web_ui_path = or_default("PROFRAG_WEB_UI_PATH", "./web-ui/src");

        Ok(Self {
            openai_api_hostname,
            openai_api_key,
            chat_model,
            embedding_model,
            pinecone_api_key,
            pinecone_index_host,
            pinecone_namespace,
            web_ui_path,
        })
    }
}
