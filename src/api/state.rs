use std::sync::Arc;

use rmp_client::{HttpTransport, ProfessorCache, Retriever, RetrieverConfig};

use crate::config::Config;
use crate::engine::LlmClient;

/// Shared state for all handlers
pub struct AppState {
    // Owns the professor cache; safe to share (internal connection pooling)
    pub retriever: Retriever<HttpTransport>,
    pub llm: LlmClient,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Arc<Self>> {
        let transport = HttpTransport::new(&config.rmp_endpoint, config.rmp_timeout())?;
        let cache = ProfessorCache::new(config.rmp_cache_capacity);
        let retriever_config = RetrieverConfig {
            rating_limit: config.rmp_rating_limit,
            school_id: rmp_types::encode_node_id(&config.rmp_school),
        };

        let llm = LlmClient::new(
            &config.openai_endpoint,
            &config.openai_key,
            config.openai_model.clone(),
            config.generation(),
        );

        Ok(Arc::new(Self {
            retriever: Retriever::new(transport, cache, retriever_config),
            llm,
        }))
    }
}
