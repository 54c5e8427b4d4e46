//! Provider abstractions for embeddings and chat completions.
//!
//! The organizer core consumes these as narrow capabilities; it must work
//! with every provider absent (the registry then hands out errors, and the
//! similarity engine falls back to its token-based path).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod noop;
pub mod openai;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns one vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError>;
}

#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatResponse, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    embeddings: HashMap<String, Arc<dyn EmbeddingProvider>>,
    chats: HashMap<String, Arc<dyn ChatProvider>>,
    pub preferred_embedding: Option<String>,
    pub preferred_chat: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embedding(mut self, name: &str, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings.insert(name.to_string(), provider);
        self
    }

    pub fn with_chat(mut self, name: &str, provider: Arc<dyn ChatProvider>) -> Self {
        self.chats.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_embedding(mut self, name: &str) -> Self {
        self.preferred_embedding = Some(name.to_string());
        self
    }

    pub fn set_preferred_chat(mut self, name: &str) -> Self {
        self.preferred_chat = Some(name.to_string());
        self
    }

    pub fn embedding(
        &self,
        name: Option<&str>,
    ) -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_embedding.clone())
            .ok_or_else(|| {
                ProviderError::UnknownProvider("no embedding provider configured".into())
            })?;
        self.embeddings
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }

    pub fn chat(&self, name: Option<&str>) -> Result<Arc<dyn ChatProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_chat.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no chat provider configured".into()))?;
        self.chats
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }
}
