use crate::{ChatProvider, ChatResponse, EmbedResponse, EmbeddingProvider, ProviderError};

/// Stand-in when no backend is configured. Embeddings come back empty so the
/// similarity engine keeps its token-based path; chat is unavailable.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Ok(EmbedResponse {
            vectors: vec![vec![]; texts.len()],
        })
    }
}

#[async_trait::async_trait]
impl ChatProvider for NoopProvider {
    async fn complete(&self, _system: &str, _user: &str) -> Result<ChatResponse, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
