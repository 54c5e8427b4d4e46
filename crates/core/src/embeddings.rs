//! Optional embedding enrichment for file signatures.
//!
//! Embeddings only sharpen the content term of the similarity score; every
//! downstream stage works without them. Provider failures are logged and the
//! affected signatures keep their token-only representation.

use crate::models::FileSignature;
use semorg_providers::ProviderRegistry;
use tracing::{debug, warn};

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Fills in `embedding` for each signature, batching requests against the
/// registry's preferred embedding provider. A missing provider or an empty
/// vector leaves the signature untouched.
pub async fn embed_signatures(
    signatures: &mut [FileSignature],
    registry: &ProviderRegistry,
    batch_size: usize,
) {
    let provider = match registry.embedding(None) {
        Ok(p) => p,
        Err(e) => {
            debug!("embeddings disabled: {e}");
            return;
        }
    };
    let batch_size = batch_size.max(1);

    let mut start = 0;
    while start < signatures.len() {
        let end = (start + batch_size).min(signatures.len());
        let texts: Vec<String> = signatures[start..end]
            .iter()
            .map(embedding_text)
            .collect();
        match provider.embed(&texts).await {
            Ok(response) => {
                for (sig, vector) in signatures[start..end]
                    .iter_mut()
                    .zip(response.vectors.into_iter())
                {
                    if !vector.is_empty() {
                        sig.embedding = Some(vector);
                    }
                }
            }
            Err(e) => {
                warn!("embedding batch failed, falling back to token similarity: {e}");
            }
        }
        start = end;
    }
}

/// One line of searchable text per file: name tokens first, then content
/// keywords, both already lowercased by extraction.
pub fn embedding_text(signature: &FileSignature) -> String {
    let mut parts: Vec<&str> = signature.name_tokens.iter().map(String::as_str).collect();
    parts.extend(signature.content_keywords.iter().map(String::as_str));
    parts.join(" ")
}
