//! Greedy threshold grouping of signatures into project clusters.
//!
//! The pass is anchor-dependent and deliberately non-transitive: each
//! unvisited signature anchors a cluster and pulls in every remaining
//! signature similar enough *to the anchor*. A file similar to a non-anchor
//! member but not to the anchor stays out. Upgrading this to transitive or
//! agglomerative clustering changes observable behavior and is off the table.

use crate::models::{FileSignature, FileType, ProjectCluster, ProjectType};
use crate::similarity::similarity_matrix;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

const MUSIC_INDICATORS: &[&str] = &["song", "music", "band", "album", "track", "recording", "audio"];
const ACADEMIC_INDICATORS: &[&str] =
    &["research", "paper", "study", "assignment", "thesis", "essay", "report"];
const WORK_INDICATORS: &[&str] =
    &["project", "meeting", "presentation", "business", "client", "proposal"];
const PHOTO_INDICATORS: &[&str] = &["photo", "picture", "image", "vacation", "trip", "event"];

/// Groups signatures into clusters of two or more files. Runs on one logical
/// thread: the shared `visited` set makes the pass strictly sequential, and
/// anchor order must follow input order exactly.
pub fn cluster_signatures(signatures: Vec<FileSignature>, threshold: f32) -> Vec<ProjectCluster> {
    if signatures.len() < 2 {
        return Vec::new();
    }

    let matrix = similarity_matrix(&signatures);
    let n = signatures.len();
    let mut visited = vec![false; n];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut group = vec![i];
        visited[i] = true;
        for j in 0..n {
            if !visited[j] && matrix[i][j] >= threshold {
                group.push(j);
                visited[j] = true;
            }
        }
        groups.push(group);
    }

    let mut clusters = Vec::new();
    for (index, group) in groups.iter().enumerate() {
        if group.len() < 2 {
            continue;
        }
        let files: Vec<FileSignature> = group.iter().map(|&i| signatures[i].clone()).collect();
        clusters.push(build_cluster(files, format!("project_{index}")));
    }

    debug!(
        clusters = clusters.len(),
        files = n,
        "greedy clustering complete"
    );
    clusters
}

fn build_cluster(files: Vec<FileSignature>, id: String) -> ProjectCluster {
    let common_keywords = common_keywords(&files);
    let file_types: BTreeSet<FileType> = files.iter().map(|f| f.file_type).collect();
    let project_type = determine_project_type(&file_types, &common_keywords);
    let name = project_name(&files, &common_keywords, project_type);
    let confidence =
        (common_keywords.len() as f32 / 5.0 + files.len() as f32 / 10.0).min(1.0);
    let date_range = date_range(&files);

    ProjectCluster {
        id,
        name,
        project_type,
        files,
        common_keywords,
        confidence,
        date_range,
    }
}

/// Intersection of the non-empty content-keyword sets, falling back to the
/// intersection of non-empty name-token sets.
fn common_keywords(files: &[FileSignature]) -> BTreeSet<String> {
    let content = intersect_non_empty(files.iter().map(|f| &f.content_keywords));
    if !content.is_empty() {
        return content;
    }
    intersect_non_empty(files.iter().map(|f| &f.name_tokens))
}

fn intersect_non_empty<'a, I>(sets: I) -> BTreeSet<String>
where
    I: Iterator<Item = &'a BTreeSet<String>>,
{
    let mut result: Option<BTreeSet<String>> = None;
    for set in sets.filter(|s| !s.is_empty()) {
        result = Some(match result {
            None => set.clone(),
            Some(acc) => acc.intersection(set).cloned().collect(),
        });
    }
    result.unwrap_or_default()
}

/// Fixed priority order; first match wins.
fn determine_project_type(
    file_types: &BTreeSet<FileType>,
    keywords: &BTreeSet<String>,
) -> ProjectType {
    let has_any = |indicators: &[&str]| indicators.iter().any(|k| keywords.contains(*k));

    if file_types.contains(&FileType::Audio) && has_any(MUSIC_INDICATORS) {
        ProjectType::Music
    } else if file_types.contains(&FileType::Document) && has_any(ACADEMIC_INDICATORS) {
        ProjectType::Academic
    } else if has_any(WORK_INDICATORS) {
        ProjectType::Work
    } else if file_types.contains(&FileType::Image) && has_any(PHOTO_INDICATORS) {
        ProjectType::Photos
    } else {
        ProjectType::General
    }
}

fn project_name(
    files: &[FileSignature],
    keywords: &BTreeSet<String>,
    project_type: ProjectType,
) -> String {
    if let Some(keyword) = keywords.iter().next() {
        // Alphabetically first keyword, for naming stability across runs.
        return format!("{}_Project_{}", project_type.title(), title_case(keyword));
    }
    let earliest = files
        .iter()
        .map(|f| f.created)
        .min()
        .unwrap_or_else(Utc::now);
    format!(
        "{}_Project_{}",
        project_type.title(),
        earliest.format("%Y_%m")
    )
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn date_range(files: &[FileSignature]) -> (DateTime<Utc>, DateTime<Utc>) {
    let mut dates: Vec<DateTime<Utc>> = files
        .iter()
        .flat_map(|f| [f.created, f.modified])
        .collect();
    dates.sort();
    match (dates.first(), dates.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => {
            let now = Utc::now();
            (now, now)
        }
    }
}
