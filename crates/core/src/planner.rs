//! Turns a project structure into an ordered list of filesystem operations.

use crate::models::{
    Conflict, FileOperation, FolderNode, OperationKind, OrganizationPlan, ProjectStructure,
};
use crate::structure::{sanitize_folder_name, sanitize_project_name};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Planner {
    base_output_dir: PathBuf,
}

impl Planner {
    pub fn new(base_output_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_output_dir: base_output_dir.into(),
        }
    }

    /// Walks the folder tree depth-first and emits one move per leaf file.
    /// A target that already exists on disk, or that an earlier operation in
    /// this plan already claimed, is recorded as a conflict and rewritten to
    /// a unique sibling name; all targets in the finished plan are pairwise
    /// distinct. Sources that vanished since analysis are dropped.
    pub fn plan(&self, project: &ProjectStructure) -> OrganizationPlan {
        let base = self
            .base_output_dir
            .join(sanitize_project_name(&project.project_name));

        let mut operations = Vec::new();
        let mut conflicts = Vec::new();
        let mut claimed = BTreeSet::new();

        for (folder, node) in &project.structure {
            self.walk(
                node,
                &base.join(sanitize_folder_name(folder)),
                &mut operations,
                &mut conflicts,
                &mut claimed,
            );
        }

        debug!(
            project = %project.project_name,
            operations = operations.len(),
            conflicts = conflicts.len(),
            "plan created"
        );

        OrganizationPlan {
            project_name: project.project_name.clone(),
            base_destination: base,
            operations,
            conflicts,
        }
    }

    fn walk(
        &self,
        node: &FolderNode,
        current: &Path,
        operations: &mut Vec<FileOperation>,
        conflicts: &mut Vec<Conflict>,
        claimed: &mut BTreeSet<PathBuf>,
    ) {
        match node {
            FolderNode::Leaf(paths) => {
                for source in paths {
                    if !source.exists() {
                        continue;
                    }
                    let file_name = match source.file_name() {
                        Some(name) => name,
                        None => continue,
                    };
                    let mut target = current.join(file_name);
                    if target.exists() || claimed.contains(&target) {
                        let unique = unique_target(&target, claimed);
                        conflicts.push(Conflict {
                            source: source.clone(),
                            target: target.clone(),
                            resolution: "rename".to_string(),
                        });
                        target = unique;
                    }
                    claimed.insert(target.clone());
                    operations.push(FileOperation {
                        kind: OperationKind::Move,
                        source: source.clone(),
                        target,
                    });
                }
            }
            FolderNode::Branch(children) => {
                for (name, child) in children {
                    self.walk(
                        child,
                        &current.join(sanitize_folder_name(name)),
                        operations,
                        conflicts,
                        claimed,
                    );
                }
            }
        }
    }
}

/// Appends `_1`, `_2`, ... before the extension until the name is free both
/// on disk and within the plan.
fn unique_target(target: &Path, claimed: &BTreeSet<PathBuf>) -> PathBuf {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string();
    let ext = target
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_string());
    let parent = target.parent().unwrap_or_else(|| Path::new("."));

    let mut counter = 1;
    loop {
        let name = match &ext {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let candidate = parent.join(name);
        if !candidate.exists() && !claimed.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectType;
    use std::collections::BTreeMap;
    use std::fs;

    fn structure_with(files: Vec<(&str, Vec<PathBuf>)>) -> ProjectStructure {
        let structure: BTreeMap<String, FolderNode> = files
            .into_iter()
            .map(|(folder, paths)| (folder.to_string(), FolderNode::Leaf(paths)))
            .collect();
        ProjectStructure {
            project_name: "Work_Project_Demo".to_string(),
            project_type: ProjectType::Work,
            confidence: 0.8,
            file_count: structure.values().map(|n| n.file_count()).sum(),
            structure,
        }
    }

    #[test]
    fn colliding_targets_become_pairwise_distinct() {
        let temp = tempfile::tempdir().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        fs::create_dir_all(&dir_a).unwrap();
        fs::create_dir_all(&dir_b).unwrap();
        fs::write(dir_a.join("report.txt"), "one").unwrap();
        fs::write(dir_b.join("report.txt"), "two").unwrap();

        let project = structure_with(vec![(
            "Documents",
            vec![dir_a.join("report.txt"), dir_b.join("report.txt")],
        )]);
        let plan = Planner::new(temp.path().join("out")).plan(&project);

        assert_eq!(plan.operations.len(), 2);
        assert_eq!(plan.conflicts.len(), 1);
        let targets: BTreeSet<_> = plan.operations.iter().map(|o| &o.target).collect();
        assert_eq!(targets.len(), 2);
        // Exactly one keeps the unsuffixed name.
        assert!(plan
            .operations
            .iter()
            .any(|o| o.target.file_name().unwrap() == "report.txt"));
        assert!(plan
            .operations
            .iter()
            .any(|o| o.target.file_name().unwrap() == "report_1.txt"));
    }

    #[test]
    fn existing_on_disk_target_is_a_conflict() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("notes.txt"), "n").unwrap();

        let out = temp.path().join("out");
        let occupied = out.join("Work_Project_Demo").join("Documents");
        fs::create_dir_all(&occupied).unwrap();
        fs::write(occupied.join("notes.txt"), "old").unwrap();

        let project = structure_with(vec![("Documents", vec![src.join("notes.txt")])]);
        let plan = Planner::new(&out).plan(&project);

        assert_eq!(plan.conflicts.len(), 1);
        assert!(plan.operations[0].target.ends_with("notes_1.txt"));
    }

    #[test]
    fn vanished_sources_are_dropped_from_the_plan() {
        let temp = tempfile::tempdir().unwrap();
        let project = structure_with(vec![(
            "Documents",
            vec![temp.path().join("never_existed.txt")],
        )]);
        let plan = Planner::new(temp.path().join("out")).plan(&project);
        assert!(plan.operations.is_empty());
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn nested_branches_build_nested_target_paths() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("song.mp3");
        fs::write(&src, "audio").unwrap();

        let mut artists = BTreeMap::new();
        artists.insert("DemoBand".to_string(), FolderNode::Leaf(vec![src.clone()]));
        let mut songs = BTreeMap::new();
        songs.insert("By_Artist".to_string(), FolderNode::Branch(artists));
        let mut structure = BTreeMap::new();
        structure.insert("Songs".to_string(), FolderNode::Branch(songs));

        let project = ProjectStructure {
            project_name: "Music_Project_Demo".to_string(),
            project_type: ProjectType::Music,
            confidence: 0.9,
            file_count: 1,
            structure,
        };
        let plan = Planner::new(temp.path().join("out")).plan(&project);
        assert_eq!(plan.operations.len(), 1);
        let target = &plan.operations[0].target;
        assert!(target.ends_with("Music_Project_Demo/Songs/By_Artist/DemoBand/song.mp3"));
    }
}
