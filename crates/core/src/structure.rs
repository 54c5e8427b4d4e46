//! Derives the folder tree for one project cluster.
//!
//! Depth is bounded at two levels below the project root: a type folder, an
//! optional subcategory folder, then files. The flattening rule collapses a
//! subcategory layer made entirely of singletons back into a flat file list.

use crate::models::{FileSignature, FileType, FolderNode, ProjectCluster, ProjectStructure, ProjectType};
use std::collections::BTreeMap;
use std::path::PathBuf;

const DRAFT_WORDS: &[&str] = &["draft", "rough", "outline"];
const FINAL_WORDS: &[&str] = &["final", "submission", "complete"];
const RESEARCH_WORDS: &[&str] = &["research", "source", "reference"];
const NOTE_WORDS: &[&str] = &["note", "notes", "memo"];
const REPORT_WORDS: &[&str] = &["report", "analysis", "summary"];

const SCREENSHOT_WORDS: &[&str] = &["screenshot", "screen", "capture"];
const PHOTO_WORDS: &[&str] = &["photo", "pic", "picture"];
const GRAPHIC_WORDS: &[&str] = &["art", "design", "graphic"];

pub struct StructureBuilder {
    min_files_for_subfolder: usize,
}

impl StructureBuilder {
    pub fn new(min_files_for_subfolder: usize) -> Self {
        Self {
            min_files_for_subfolder,
        }
    }

    pub fn build(&self, cluster: &ProjectCluster) -> ProjectStructure {
        let mut by_type: BTreeMap<FileType, Vec<&FileSignature>> = BTreeMap::new();
        for file in &cluster.files {
            by_type.entry(file.file_type).or_default().push(file);
        }

        let mut structure = BTreeMap::new();
        for (file_type, files) in by_type {
            let folder = type_folder_name(file_type, cluster.project_type);
            let node = if files.len() == 1 {
                FolderNode::Leaf(vec![files[0].path.clone()])
            } else {
                self.subcategorize(&files, cluster.project_type)
            };
            structure.insert(folder, node);
        }

        ProjectStructure {
            project_name: cluster.name.clone(),
            project_type: cluster.project_type,
            confidence: cluster.confidence,
            file_count: cluster.files.len(),
            structure,
        }
    }

    fn subcategorize(&self, files: &[&FileSignature], project_type: ProjectType) -> FolderNode {
        if files.len() < self.min_files_for_subfolder {
            return FolderNode::Leaf(files.iter().map(|f| f.path.clone()).collect());
        }

        let node = match (project_type, files[0].file_type) {
            (ProjectType::Music, FileType::Audio) => audio_subcategories(files),
            (ProjectType::Academic, FileType::Document) => document_subcategories(files),
            (ProjectType::Photos, FileType::Image) => image_subcategories(files),
            _ => generic_subcategories(files),
        };

        flatten_singletons(node)
    }
}

fn type_folder_name(file_type: FileType, project_type: ProjectType) -> String {
    let overridden = match (project_type, file_type) {
        (ProjectType::Music, FileType::Audio) => Some("Songs"),
        (ProjectType::Music, FileType::Image) => Some("Album_Art"),
        (ProjectType::Music, FileType::Document) => Some("Lyrics_Notes"),
        (ProjectType::Academic, FileType::Document) => Some("Papers_Documents"),
        (ProjectType::Academic, FileType::Image) => Some("Figures_Images"),
        (ProjectType::Photos, FileType::Image) => Some("Photos"),
        (ProjectType::Photos, FileType::Video) => Some("Videos"),
        _ => None,
    };
    if let Some(name) = overridden {
        return name.to_string();
    }
    match file_type {
        FileType::Audio => "Audio",
        FileType::Image => "Images",
        FileType::Video => "Videos",
        FileType::Document => "Documents",
        FileType::Spreadsheet => "Spreadsheets",
        FileType::Presentation => "Presentations",
        FileType::Archive => "Archives",
        FileType::Other => "Other",
    }
    .to_string()
}

/// Audio grouped by artist when more than one is present, otherwise by album
/// with a creation-month fallback.
fn audio_subcategories(files: &[&FileSignature]) -> FolderNode {
    let mut artists: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let artist = file
            .metadata
            .get("artist")
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .unwrap_or("Unknown_Artist");
        artists
            .entry(artist.to_string())
            .or_default()
            .push(file.path.clone());
    }

    if artists.len() > 1 {
        let children: BTreeMap<String, FolderNode> = artists
            .into_iter()
            .map(|(artist, paths)| {
                (sanitize_folder_name(&artist), FolderNode::Leaf(paths))
            })
            .collect();
        let mut by_artist = BTreeMap::new();
        by_artist.insert("By_Artist".to_string(), FolderNode::Branch(children));
        return FolderNode::Branch(by_artist);
    }

    let mut albums: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let key = match file
            .metadata
            .get("album")
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
        {
            Some(album) => sanitize_folder_name(album),
            None => format!("Created_{}", file.created.format("%Y_%m")),
        };
        albums.entry(key).or_default().push(file.path.clone());
    }
    FolderNode::Branch(
        albums
            .into_iter()
            .map(|(name, paths)| (name, FolderNode::Leaf(paths)))
            .collect(),
    )
}

fn document_subcategories(files: &[&FileSignature]) -> FolderNode {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        categories
            .entry(document_category(file).to_string())
            .or_default()
            .push(file.path.clone());
    }
    FolderNode::Branch(
        categories
            .into_iter()
            .map(|(name, paths)| (name, FolderNode::Leaf(paths)))
            .collect(),
    )
}

/// First matching indicator list wins.
fn document_category(file: &FileSignature) -> &'static str {
    let has = |words: &[&str]| {
        words
            .iter()
            .any(|w| file.content_keywords.contains(*w) || file.name_tokens.contains(*w))
    };
    if has(DRAFT_WORDS) {
        "Drafts"
    } else if has(FINAL_WORDS) {
        "Final_Documents"
    } else if has(RESEARCH_WORDS) {
        "Research_Materials"
    } else if has(NOTE_WORDS) {
        "Notes"
    } else if has(REPORT_WORDS) {
        "Reports"
    } else {
        "Documents"
    }
}

fn image_subcategories(files: &[&FileSignature]) -> FolderNode {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let has = |words: &[&str]| {
            words
                .iter()
                .any(|w| file.content_keywords.contains(*w) || file.name_tokens.contains(*w))
        };
        let key = if has(SCREENSHOT_WORDS) {
            "Screenshots".to_string()
        } else if has(PHOTO_WORDS) {
            format!("Photos_{}", file.created.format("%Y_%m_%d"))
        } else if has(GRAPHIC_WORDS) {
            "Graphics".to_string()
        } else {
            "Images".to_string()
        };
        categories.entry(key).or_default().push(file.path.clone());
    }
    FolderNode::Branch(
        categories
            .into_iter()
            .map(|(name, paths)| (name, FolderNode::Leaf(paths)))
            .collect(),
    )
}

fn generic_subcategories(files: &[&FileSignature]) -> FolderNode {
    if files.len() <= 3 {
        let mut children = BTreeMap::new();
        children.insert(
            "Files".to_string(),
            FolderNode::Leaf(files.iter().map(|f| f.path.clone()).collect()),
        );
        return FolderNode::Branch(children);
    }
    let mut by_month: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        by_month
            .entry(format!("Created_{}", file.created.format("%Y_%m")))
            .or_default()
            .push(file.path.clone());
    }
    FolderNode::Branch(
        by_month
            .into_iter()
            .map(|(name, paths)| (name, FolderNode::Leaf(paths)))
            .collect(),
    )
}

/// When every bottom-level leaf holds exactly one file, the subcategory layer
/// only adds depth; replace the whole branch with a flat list.
fn flatten_singletons(node: FolderNode) -> FolderNode {
    match &node {
        FolderNode::Leaf(_) => node,
        FolderNode::Branch(_) => {
            let files = node.files();
            if !files.is_empty() && files.len() == count_leaves(&node) {
                FolderNode::Leaf(files.into_iter().cloned().collect())
            } else {
                node
            }
        }
    }
}

fn count_leaves(node: &FolderNode) -> usize {
    match node {
        FolderNode::Leaf(_) => 1,
        FolderNode::Branch(children) => children.values().map(count_leaves).sum(),
    }
}

/// Sanitizes a single path segment: forbidden characters replaced, repeated
/// underscores collapsed, trimmed, capped at `max_len`, never empty.
pub fn sanitize_name(name: &str, max_len: usize, placeholder: &str) -> String {
    let mut safe = String::with_capacity(name.len());
    let mut last_underscore = false;
    for ch in name.chars() {
        let mapped = match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        };
        if mapped == '_' {
            if !last_underscore {
                safe.push('_');
            }
            last_underscore = true;
        } else {
            safe.push(mapped);
            last_underscore = false;
        }
    }

    let mut safe = safe.trim_matches(|c| c == '_' || c == ' ').to_string();
    if safe.len() > max_len {
        let mut end = max_len;
        while end > 0 && !safe.is_char_boundary(end) {
            end -= 1;
        }
        safe.truncate(end);
        safe = safe.trim_end_matches('_').to_string();
    }
    if safe.is_empty() {
        return placeholder.to_string();
    }
    safe
}

pub fn sanitize_folder_name(name: &str) -> String {
    sanitize_name(name, 50, "Untitled")
}

pub fn sanitize_project_name(name: &str) -> String {
    sanitize_name(name, 100, "Unnamed")
}
