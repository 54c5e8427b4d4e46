//! End-to-end orchestration: scan, analyze, cluster, plan, execute, undo.
//!
//! The [`Organizer`] is the one entry point the CLI talks to. Every stage is
//! also public on its own module for callers that want to compose them
//! differently.

use crate::cluster;
use crate::config::AppConfig;
use crate::embeddings;
use crate::executor::{self, UndoReport};
use crate::extractor::{KeywordExtractor, SignatureAnalyzer};
use crate::models::{ExecutionReport, FileSignature, ProjectStructure};
use crate::planner::Planner;
use crate::scanner;
use crate::search::{self, SearchHit};
use crate::structure::StructureBuilder;
use anyhow::Context;
use semorg_providers::noop::NoopProvider;
use semorg_providers::openai::{OpenAiConfig, OpenAiProvider};
use semorg_providers::ProviderRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_UNDO_DIR: &str = ".semorg_undo";

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub name: String,
    pub project_type: String,
    pub file_count: usize,
    pub confidence: f32,
    pub common_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub total_files: usize,
    pub by_type: BTreeMap<String, usize>,
    pub clusters: Vec<ClusterSummary>,
    pub unclustered_files: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileStatistics {
    pub by_type: BTreeMap<String, usize>,
    /// Size buckets: small < 1 MiB, medium < 100 MiB, large above.
    pub by_size: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeSummary {
    pub dry_run: bool,
    pub total_files: usize,
    pub organized_files: usize,
    pub statistics: FileStatistics,
    pub projects: Vec<ProjectStructure>,
    pub reports: Vec<ExecutionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_journal: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UndoOutcome {
    pub journal: PathBuf,
    pub report: UndoReport,
}

pub struct Organizer {
    config: AppConfig,
    analyzer: SignatureAnalyzer,
    registry: ProviderRegistry,
    undo_dir: PathBuf,
}

impl Organizer {
    pub fn new(config: AppConfig) -> Self {
        let registry = build_registry(&config);
        Self {
            config,
            analyzer: SignatureAnalyzer::new(),
            registry,
            undo_dir: PathBuf::from(DEFAULT_UNDO_DIR),
        }
    }

    /// Adds a keyword extractor, e.g. an audio tag reader.
    pub fn with_extractor(mut self, extractor: Arc<dyn KeywordExtractor>) -> Self {
        self.analyzer = self.analyzer.with_extractor(extractor);
        self
    }

    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_undo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.undo_dir = dir.into();
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Scans sources and builds embedded signatures. Empty sources produce an
    /// empty list, not an error.
    pub async fn signatures(&self, sources: &[PathBuf]) -> anyhow::Result<Vec<FileSignature>> {
        let paths = scanner::collect_files(sources, &self.config.organization.exclude)?;
        info!(files = paths.len(), "collected files for analysis");
        let mut signatures = self.analyzer.analyze(&paths).await;
        embeddings::embed_signatures(
            &mut signatures,
            &self.registry,
            self.config.embeddings.batch_size,
        )
        .await;
        Ok(signatures)
    }

    /// Reports what the organizer would group, without planning any moves.
    pub async fn analyze(&self, sources: &[PathBuf]) -> anyhow::Result<AnalysisReport> {
        let signatures = self.signatures(sources).await?;
        let total_files = signatures.len();

        let by_type = file_statistics(&signatures).by_type;

        let clusters =
            cluster::cluster_signatures(signatures, self.config.similarity_threshold());
        let clustered: usize = clusters.iter().map(|c| c.files.len()).sum();
        let summaries = clusters
            .iter()
            .map(|c| ClusterSummary {
                name: c.name.clone(),
                project_type: c.project_type.title().to_string(),
                file_count: c.files.len(),
                confidence: c.confidence,
                common_keywords: c.common_keywords.iter().cloned().collect(),
            })
            .collect();

        Ok(AnalysisReport {
            total_files,
            by_type,
            clusters: summaries,
            unclustered_files: total_files.saturating_sub(clustered),
        })
    }

    /// Full pipeline run. With `execute` false this is a dry run: plans are
    /// reported but nothing on disk changes, so it can be repeated freely.
    pub async fn organize(
        &self,
        sources: &[PathBuf],
        destination: Option<&Path>,
        threshold: Option<f32>,
        execute: bool,
    ) -> anyhow::Result<OrganizeSummary> {
        let signatures = self.signatures(sources).await?;
        let total_files = signatures.len();
        let statistics = file_statistics(&signatures);
        let threshold = threshold.unwrap_or_else(|| self.config.similarity_threshold());

        let clusters = cluster::cluster_signatures(signatures, threshold);
        if clusters.is_empty() {
            info!("no related file groups found, nothing to organize");
            return Ok(OrganizeSummary {
                dry_run: !execute,
                total_files,
                organized_files: 0,
                statistics,
                projects: Vec::new(),
                reports: Vec::new(),
                undo_journal: None,
            });
        }

        let builder = StructureBuilder::new(self.config.min_files_for_subfolder());
        let projects: Vec<ProjectStructure> =
            clusters.iter().map(|c| builder.build(c)).collect();

        let base = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.organization.base_output_dir));
        let planner = Planner::new(base);
        let plans: Vec<_> = projects.iter().map(|p| planner.plan(p)).collect();

        let undo_journal = if execute {
            let record = executor::undo_record_for(&plans);
            match semorg_storage::save_journal(&record, &self.undo_dir) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("could not save undo journal, continuing without: {e}");
                    None
                }
            }
        } else {
            None
        };

        let reports: Vec<ExecutionReport> = plans
            .iter()
            .map(|plan| executor::execute_plan(plan, !execute))
            .collect();
        let organized_files = reports.iter().map(|r| r.successful_operations).sum();

        Ok(OrganizeSummary {
            dry_run: !execute,
            total_files,
            organized_files,
            statistics,
            projects,
            reports,
            undo_journal,
        })
    }

    /// Reverts a previous run. Without an explicit journal the newest one in
    /// the undo directory is used; no journals at all yields `Ok(None)`.
    pub async fn undo(&self, journal: Option<&Path>) -> anyhow::Result<Option<UndoOutcome>> {
        let journal = match journal {
            Some(path) => path.to_path_buf(),
            None => match semorg_storage::list_journals(&self.undo_dir)?.into_iter().next() {
                Some(latest) => latest,
                None => {
                    info!("no undo journals found, nothing to revert");
                    return Ok(None);
                }
            },
        };

        let record = semorg_storage::load_journal(&journal)
            .with_context(|| format!("failed to load undo journal {}", journal.display()))?;
        let report = executor::execute_undo(&record);
        Ok(Some(UndoOutcome { journal, report }))
    }

    pub async fn search(
        &self,
        sources: &[PathBuf],
        query: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let signatures = self.signatures(sources).await?;
        Ok(search::rank_by_query(&signatures, query, &self.registry, limit).await)
    }

    pub async fn ask(&self, sources: &[PathBuf], question: &str) -> anyhow::Result<String> {
        let signatures = self.signatures(sources).await?;
        let answer = search::answer_question(&signatures, question, &self.registry).await?;
        Ok(answer)
    }
}

fn file_statistics(signatures: &[FileSignature]) -> FileStatistics {
    let mut stats = FileStatistics::default();
    for sig in signatures {
        *stats
            .by_type
            .entry(format!("{:?}", sig.file_type).to_lowercase())
            .or_insert(0) += 1;
        let bucket = match std::fs::metadata(&sig.path).map(|m| m.len()) {
            Ok(len) if len < 1024 * 1024 => "small",
            Ok(len) if len < 100 * 1024 * 1024 => "medium",
            Ok(_) => "large",
            Err(_) => continue,
        };
        *stats.by_size.entry(bucket.to_string()).or_insert(0) += 1;
    }
    stats
}

/// Wires up providers from the environment. The noop provider is always
/// registered; an OpenAI-compatible provider joins it when SEMORG_API_KEY is
/// set, with SEMORG_BASE_URL overriding the default endpoint.
pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new()
        .with_embedding("noop", Arc::new(NoopProvider))
        .set_preferred_embedding("noop");

    if let Ok(api_key) = std::env::var("SEMORG_API_KEY") {
        let base_url = std::env::var("SEMORG_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let provider = Arc::new(OpenAiProvider::new(OpenAiConfig {
            api_key,
            base_url,
            embedding_model: config.embeddings.model.clone(),
            chat_model: config.chat.model.clone(),
        }));
        registry = registry
            .with_embedding("openai", provider.clone())
            .with_chat("openai", provider)
            .set_preferred_embedding("openai")
            .set_preferred_chat("openai");
    }

    if config.embeddings.provider == "noop" {
        registry = registry.set_preferred_embedding("noop");
    }

    registry
}
