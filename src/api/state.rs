use std::sync::Arc;

use crate::ai::rag::RagChat;
use crate::core::AppConfig;
use crate::openai::OpenAIClient;
use crate::pinecone::PineconeClient;

pub struct AppState {
    pub chat: Arc<RagChat>,
    pub config: AppConfig,
}

impl AppState {
    /// Connect the chat pipeline to the upstream services named in
    /// `config`.
    pub fn new(config: AppConfig) -> Self {
        let openai = Arc::new(OpenAIClient::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            &config.chat_model,
            &config.embedding_model,
        ));
        let pinecone = Arc::new(PineconeClient::new(
            &config.pinecone_index_host,
            &config.pinecone_api_key,
            &config.pinecone_namespace,
        ));
        let chat = RagChat::new(openai.clone(), pinecone, openai);
        Self::with_chat(chat, config)
    }

    pub fn with_chat(chat: RagChat, config: AppConfig) -> Self {
        Self {
            chat: Arc::new(chat),
            config,
        }
    }
}
