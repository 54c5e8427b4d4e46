use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse file category derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Document,
    Image,
    Audio,
    Video,
    Spreadsheet,
    Presentation,
    Archive,
    Other,
}

impl FileType {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" | "doc" | "docx" | "txt" | "md" | "rtf" => FileType::Document,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" => FileType::Image,
            "mp3" | "wav" | "flac" | "m4a" | "ogg" | "aac" => FileType::Audio,
            "mp4" | "avi" | "mov" | "mkv" | "flv" | "wmv" => FileType::Video,
            "xls" | "xlsx" | "csv" => FileType::Spreadsheet,
            "ppt" | "pptx" => FileType::Presentation,
            "zip" | "rar" | "7z" => FileType::Archive,
            _ => FileType::Other,
        }
    }
}

/// The extracted, comparable representation of one file. Immutable after
/// creation; empty keyword/token sets are the "no signal" state, never an
/// absent one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSignature {
    pub path: PathBuf,
    pub file_type: FileType,
    pub content_keywords: BTreeSet<String>,
    pub name_tokens: BTreeSet<String>,
    pub metadata: BTreeMap<String, String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Music,
    Academic,
    Work,
    Photos,
    General,
}

impl ProjectType {
    pub fn title(&self) -> &'static str {
        match self {
            ProjectType::Music => "Music",
            ProjectType::Academic => "Academic",
            ProjectType::Work => "Work",
            ProjectType::Photos => "Photos",
            ProjectType::General => "General",
        }
    }
}

/// A group of >=2 signatures judged related by the greedy threshold pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCluster {
    pub id: String,
    pub name: String,
    pub project_type: ProjectType,
    pub files: Vec<FileSignature>,
    pub common_keywords: BTreeSet<String>,
    pub confidence: f32,
    pub date_range: (DateTime<Utc>, DateTime<Utc>),
}

/// Folder tree node: a leaf holds file paths, a branch holds named children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderNode {
    Leaf(Vec<PathBuf>),
    Branch(BTreeMap<String, FolderNode>),
}

impl FolderNode {
    /// All file paths under this node, in traversal order.
    pub fn files(&self) -> Vec<&PathBuf> {
        match self {
            FolderNode::Leaf(paths) => paths.iter().collect(),
            FolderNode::Branch(children) => {
                children.values().flat_map(|node| node.files()).collect()
            }
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            FolderNode::Leaf(paths) => paths.len(),
            FolderNode::Branch(children) => children.values().map(|n| n.file_count()).sum(),
        }
    }
}

/// The target folder layout for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStructure {
    pub project_name: String,
    pub project_type: ProjectType,
    pub confidence: f32,
    pub file_count: usize,
    pub structure: BTreeMap<String, FolderNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Move,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperation {
    pub kind: OperationKind,
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub source: PathBuf,
    pub target: PathBuf,
    pub resolution: String,
}

/// Ordered filesystem operations realizing one project structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPlan {
    pub project_name: String,
    pub base_destination: PathBuf,
    pub operations: Vec<FileOperation>,
    pub conflicts: Vec<Conflict>,
}

/// Per-plan outcome; produced even under partial failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub project_name: String,
    pub dry_run: bool,
    pub total_operations: usize,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub conflicts_resolved: usize,
    pub errors: Vec<String>,
}

/// Fatal conditions surfaced before any file is touched.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("source path does not exist: {0}")]
    MissingSource(PathBuf),
    #[error("no chat provider configured (set SEMORG_API_KEY and SEMORG_BASE_URL)")]
    ChatUnavailable,
}
