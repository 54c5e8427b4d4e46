//! Per-file signature extraction.
//!
//! Content keywords and metadata come from [`KeywordExtractor`] collaborators.
//! Built-in extractors cover plain text (and PDF / EXIF behind features);
//! anything else — audio tag readers in particular — is injected by the
//! caller. An extractor never fails: unreadable input degrades to empty
//! signal, and only a vanished file is skipped entirely.

use crate::models::{FileSignature, FileType};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task;
use tracing::warn;

const STOP_WORDS: &[&str] = &[
    "and", "are", "but", "for", "from", "off", "that", "the", "these", "this", "those", "was",
    "with",
];

/// Collaborator interface for format-specific content extraction. Must not
/// fail: unreadable or corrupt files yield empty results.
pub trait KeywordExtractor: Send + Sync {
    fn supports(&self, file_type: FileType) -> bool;
    fn extract(&self, path: &Path, file_type: FileType) -> Extraction;
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub keywords: BTreeSet<String>,
    pub metadata: BTreeMap<String, String>,
}

/// Builds signatures for a batch of files. Owns the per-run extraction cache;
/// construct one per organization run.
pub struct SignatureAnalyzer {
    extractors: Vec<Arc<dyn KeywordExtractor>>,
    cache: Arc<Mutex<HashMap<PathBuf, Extraction>>>,
    max_workers: usize,
}

impl Default for SignatureAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureAnalyzer {
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut extractors: Vec<Arc<dyn KeywordExtractor>> = vec![Arc::new(TextExtractor)];
        #[cfg(feature = "pdf")]
        extractors.push(Arc::new(PdfExtractor));
        #[cfg(feature = "exif")]
        extractors.push(Arc::new(ExifExtractor));
        Self {
            extractors,
            cache: Arc::new(Mutex::new(HashMap::new())),
            max_workers: 8,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn KeywordExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Extracts signatures concurrently on blocking workers. Output preserves
    /// input order regardless of completion order; vanished files are skipped.
    pub async fn analyze(&self, paths: &[PathBuf]) -> Vec<FileSignature> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(paths.len());

        for path in paths {
            let extractors = self.extractors.clone();
            let cache = self.cache.clone();
            let semaphore = semaphore.clone();
            let path = path.clone();
            handles.push(task::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                task::spawn_blocking(move || signature_for(&extractors, &cache, &path))
                    .await
                    .ok()
                    .flatten()
            }));
        }

        let mut signatures = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(Some(sig)) = handle.await {
                signatures.push(sig);
            }
        }
        signatures
    }
}

fn signature_for(
    extractors: &[Arc<dyn KeywordExtractor>],
    cache: &Mutex<HashMap<PathBuf, Extraction>>,
    path: &Path,
) -> Option<FileSignature> {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!("skipping {}: {e}", path.display());
            return None;
        }
    };

    let modified = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let created = meta
        .created()
        .map(DateTime::<Utc>::from)
        .unwrap_or(modified);

    let file_type = FileType::from_path(path);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let extraction = cached_extraction(extractors, cache, path, file_type);

    Some(FileSignature {
        path: path.to_path_buf(),
        file_type,
        content_keywords: extraction.keywords,
        name_tokens: name_tokens(stem),
        metadata: extraction.metadata,
        created,
        modified,
        embedding: None,
    })
}

fn cached_extraction(
    extractors: &[Arc<dyn KeywordExtractor>],
    cache: &Mutex<HashMap<PathBuf, Extraction>>,
    path: &Path,
    file_type: FileType,
) -> Extraction {
    if let Ok(guard) = cache.lock() {
        if let Some(hit) = guard.get(path).cloned() {
            return hit;
        }
    }

    let mut extraction = Extraction::default();
    for extractor in extractors {
        if !extractor.supports(file_type) {
            continue;
        }
        let part = extractor.extract(path, file_type);
        extraction.keywords.extend(part.keywords);
        extraction.metadata.extend(part.metadata);
    }

    if let Ok(mut guard) = cache.lock() {
        guard.insert(path.to_path_buf(), extraction.clone());
    }
    extraction
}

/// Tokens from a filename stem: split on separators and camel-case
/// boundaries, lowercased, with stop words, short tokens, and non-alphabetic
/// tokens removed.
pub fn name_tokens(stem: &str) -> BTreeSet<String> {
    let mut spaced = String::with_capacity(stem.len() + 8);
    let mut prev_lower = false;
    for ch in stem.chars() {
        if ch.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = ch.is_lowercase();
        spaced.push(ch);
    }

    spaced
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | '.'))
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() > 2 && t.chars().all(|c| c.is_alphabetic()))
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Top keywords from a block of text: words longer than 3 chars minus stop
/// words, ranked by frequency, capped at 20.
pub fn text_keywords(text: &str) -> BTreeSet<String> {
    let mut freq: BTreeMap<String, usize> = BTreeMap::new();
    for raw in text.split(|c: char| !c.is_alphabetic()) {
        if raw.len() <= 3 {
            continue;
        }
        let word = raw.to_lowercase();
        if STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        *freq.entry(word).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
    // Stable: frequency descending, then alphabetical.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(20).map(|(w, _)| w).collect()
}

/// Reads `.txt`/`.md` documents and keywords their content.
pub struct TextExtractor;

impl KeywordExtractor for TextExtractor {
    fn supports(&self, file_type: FileType) -> bool {
        file_type == FileType::Document
    }

    fn extract(&self, path: &Path, _file_type: FileType) -> Extraction {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if ext != "txt" && ext != "md" {
            return Extraction::default();
        }
        match fs::read_to_string(path) {
            Ok(text) => Extraction {
                keywords: text_keywords(&text),
                metadata: BTreeMap::new(),
            },
            Err(_) => Extraction::default(),
        }
    }
}

#[cfg(feature = "pdf")]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl KeywordExtractor for PdfExtractor {
    fn supports(&self, file_type: FileType) -> bool {
        file_type == FileType::Document
    }

    fn extract(&self, path: &Path, _file_type: FileType) -> Extraction {
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            return Extraction::default();
        }
        match pdf_extract::extract_text(path) {
            Ok(text) => Extraction {
                keywords: text_keywords(&text),
                metadata: BTreeMap::new(),
            },
            Err(_) => Extraction::default(),
        }
    }
}

#[cfg(feature = "exif")]
pub struct ExifExtractor;

#[cfg(feature = "exif")]
impl KeywordExtractor for ExifExtractor {
    fn supports(&self, file_type: FileType) -> bool {
        file_type == FileType::Image
    }

    fn extract(&self, path: &Path, _file_type: FileType) -> Extraction {
        let mut extraction = Extraction::default();
        let Ok(file) = fs::File::open(path) else {
            return extraction;
        };
        let mut reader = std::io::BufReader::new(file);
        let Ok(data) = exif::Reader::new().read_from_container(&mut reader) else {
            return extraction;
        };
        for field in data.fields() {
            let value = field.display_value().to_string();
            if value.len() < 100 {
                extraction.keywords.extend(text_keywords(&value));
            }
            extraction
                .metadata
                .insert(format!("{}", field.tag), value);
        }
        extraction
    }
}
