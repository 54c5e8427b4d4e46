//! Query ranking and question answering over analyzed signatures.
//!
//! Ranking prefers embedding cosine when both the query and a signature carry
//! vectors, and falls back to token overlap otherwise, so search works with
//! no provider configured at all.

use crate::extractor;
use crate::models::{FileSignature, OrganizeError};
use crate::similarity;
use semorg_providers::ProviderRegistry;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const SNIPPET_LIMIT: usize = 1200;
const CONTEXT_FILES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub path: PathBuf,
    pub score: f32,
}

/// Ranks signatures against a free-text query, best first. Zero-score
/// signatures are dropped, ties break on path for stable output.
pub async fn rank_by_query(
    signatures: &[FileSignature],
    query: &str,
    registry: &ProviderRegistry,
    limit: usize,
) -> Vec<SearchHit> {
    let query_tokens = extractor::name_tokens(query);
    let query_embedding = match registry.embedding(None) {
        Ok(provider) => match provider.embed(&[query.to_string()]).await {
            Ok(response) => response.vectors.into_iter().next().filter(|v| !v.is_empty()),
            Err(e) => {
                debug!("query embedding failed, using token overlap: {e}");
                None
            }
        },
        Err(_) => None,
    };

    let mut hits: Vec<SearchHit> = signatures
        .iter()
        .filter_map(|sig| {
            let token_score = {
                let mut terms = sig.name_tokens.clone();
                terms.extend(sig.content_keywords.iter().cloned());
                similarity::jaccard(&query_tokens, &terms)
            };
            let score = match (&query_embedding, &sig.embedding) {
                (Some(q), Some(v)) => token_score.max(similarity::cosine(q, v).clamp(0.0, 1.0)),
                _ => token_score,
            };
            (score > 0.0).then(|| SearchHit {
                path: sig.path.clone(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    hits.truncate(limit);
    hits
}

/// Answers a question about the scanned files by handing the chat provider a
/// context built from the best-matching files.
pub async fn answer_question(
    signatures: &[FileSignature],
    question: &str,
    registry: &ProviderRegistry,
) -> Result<String, OrganizeError> {
    let chat = registry.chat(None).map_err(|_| OrganizeError::ChatUnavailable)?;

    let hits = rank_by_query(signatures, question, registry, CONTEXT_FILES).await;
    let mut context = String::new();
    for hit in &hits {
        context.push_str(&format!("File: {}\n", hit.path.display()));
        context.push_str(&snippet_for(&hit.path, signatures));
        context.push('\n');
    }
    if context.is_empty() {
        context.push_str("No matching files were found.\n");
    }

    let system = "You answer questions about the user's local files. \
                  Base your answer only on the provided file context.";
    let user = format!("Context:\n{context}\nQuestion: {question}");

    chat.complete(system, &user)
        .await
        .map(|response| response.content)
        .map_err(|_| OrganizeError::ChatUnavailable)
}

/// Plain-text files contribute their opening text; everything else
/// contributes its extracted keywords.
fn snippet_for(path: &PathBuf, signatures: &[FileSignature]) -> String {
    let is_text = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("md")
    );
    if is_text {
        if let Ok(text) = fs::read_to_string(path) {
            let mut end = SNIPPET_LIMIT.min(text.len());
            while end > 0 && !text.is_char_boundary(end) {
                end -= 1;
            }
            return text[..end].to_string();
        }
    }
    signatures
        .iter()
        .find(|s| &s.path == path)
        .map(|s| {
            let keywords: Vec<&str> = s.content_keywords.iter().map(String::as_str).collect();
            format!("Keywords: {}", keywords.join(", "))
        })
        .unwrap_or_default()
}
