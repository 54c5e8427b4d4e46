//! Enumerates the files an organization run will consider.

use crate::models::OrganizeError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects regular files under the given source paths. A source that is a
/// plain file contributes itself; directories are walked recursively with
/// hidden entries and exclude globs skipped. A missing source path is fatal:
/// it is reported before any other work happens.
pub fn collect_files(sources: &[PathBuf], excludes: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let exclude_set = build_globset(excludes)?;
    let mut files = Vec::new();

    for source in sources {
        if !source.exists() {
            return Err(OrganizeError::MissingSource(source.clone()).into());
        }
        if source.is_file() {
            files.push(source.clone());
            continue;
        }
        for entry in WalkDir::new(source)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = entry.path();
            if path.is_dir() || is_hidden(path) || exclude_set.is_match(path) {
                continue;
            }
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
