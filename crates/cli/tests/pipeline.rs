//! End-to-end pipeline tests: scan, cluster, plan, execute, undo on a real
//! temporary directory.

use semorg_core::config::AppConfig;
use semorg_core::extractor::{Extraction, KeywordExtractor};
use semorg_core::models::{FileType, FolderNode};
use semorg_core::pipeline::Organizer;
use semorg_providers::ProviderRegistry;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Reads "tags" straight from the filename, standing in for a real audio tag
/// reader.
struct FakeTagReader;

impl KeywordExtractor for FakeTagReader {
    fn supports(&self, file_type: FileType) -> bool {
        file_type == FileType::Audio
    }

    fn extract(&self, path: &Path, _file_type: FileType) -> Extraction {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let mut extraction = Extraction::default();
        let artist = if name.contains("01") || name.contains("02") {
            "Alpha"
        } else {
            "Beta"
        };
        extraction
            .metadata
            .insert("artist".to_string(), artist.to_string());
        extraction
            .metadata
            .insert("album".to_string(), "Demo".to_string());
        extraction
    }
}

fn organizer(temp: &TempDir) -> Organizer {
    Organizer::new(AppConfig::default())
        .with_registry(ProviderRegistry::new())
        .with_undo_dir(temp.path().join("undo"))
}

fn write_mixed_sources(src: &Path) {
    fs::create_dir_all(src).unwrap();
    fs::write(src.join("band_song_lyrics.txt"), "band song lyrics").unwrap();
    fs::write(src.join("band_song_one.mp3"), b"audio").unwrap();
    fs::write(src.join("band_song_two.mp3"), b"audio").unwrap();
    fs::write(src.join("vacation_beach_photo.jpg"), b"jpeg").unwrap();
    fs::write(src.join("vacation_sunset_photo.jpg"), b"jpeg").unwrap();
}

#[tokio::test]
async fn analyze_groups_music_and_photos_separately() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    write_mixed_sources(&src);

    let report = organizer(&temp).analyze(&[src]).await.unwrap();
    assert_eq!(report.total_files, 5);
    assert_eq!(report.by_type.get("audio"), Some(&2));
    assert_eq!(report.clusters.len(), 2);

    let names: Vec<&str> = report.clusters.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"Music_Project_Band"));
    assert!(names.contains(&"Photos_Project_Photo"));
    let music = report
        .clusters
        .iter()
        .find(|c| c.name == "Music_Project_Band")
        .unwrap();
    assert_eq!(music.project_type, "Music");
    assert_eq!(music.file_count, 3);
}

#[tokio::test]
async fn dry_run_is_repeatable_and_touches_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    write_mixed_sources(&src);
    let out = temp.path().join("out");
    let org = organizer(&temp);

    let first = org
        .organize(&[src.clone()], Some(&out), None, false)
        .await
        .unwrap();
    let second = org
        .organize(&[src.clone()], Some(&out), None, false)
        .await
        .unwrap();

    assert!(first.dry_run);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
    assert!(!out.exists());
    assert!(src.join("band_song_one.mp3").exists());
    assert!(first.undo_journal.is_none());
}

#[tokio::test]
async fn execute_moves_files_and_undo_restores_them() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    write_mixed_sources(&src);
    let out = temp.path().join("out");
    let org = organizer(&temp);

    let summary = org
        .organize(&[src.clone()], Some(&out), None, true)
        .await
        .unwrap();
    assert!(!summary.dry_run);
    assert_eq!(summary.organized_files, 5);
    assert!(summary.undo_journal.is_some());

    let music = out.join("Music_Project_Band");
    assert!(music.join("Songs").join("band_song_one.mp3").exists());
    assert!(music.join("Songs").join("band_song_two.mp3").exists());
    assert!(music
        .join("Lyrics_Notes")
        .join("band_song_lyrics.txt")
        .exists());
    let photos = out.join("Photos_Project_Photo");
    assert!(photos
        .join("Photos")
        .join("vacation_beach_photo.jpg")
        .exists());
    assert!(!src.join("band_song_one.mp3").exists());

    let outcome = org.undo(None).await.unwrap().unwrap();
    assert_eq!(outcome.report.successful_operations, 5);
    assert_eq!(outcome.report.failed_operations, 0);

    assert_eq!(
        fs::read_to_string(src.join("band_song_lyrics.txt")).unwrap(),
        "band song lyrics"
    );
    assert!(src.join("band_song_one.mp3").exists());
    assert!(src.join("vacation_sunset_photo.jpg").exists());
    assert!(!music.exists());
    assert!(!photos.exists());
}

#[tokio::test]
async fn audio_tags_drive_by_artist_grouping() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    for name in [
        "band_track_01.mp3",
        "band_track_02.mp3",
        "band_track_03.mp3",
        "band_track_04.mp3",
    ] {
        fs::write(src.join(name), b"audio").unwrap();
    }

    let org = organizer(&temp).with_extractor(Arc::new(FakeTagReader));
    let summary = org
        .organize(&[src], Some(&temp.path().join("out")), None, false)
        .await
        .unwrap();

    assert_eq!(summary.projects.len(), 1);
    let project = &summary.projects[0];
    assert_eq!(project.project_name, "Music_Project_Band");

    let songs = project.structure.get("Songs").unwrap();
    let FolderNode::Branch(children) = songs else {
        panic!("expected a branch under Songs, got {songs:?}");
    };
    let FolderNode::Branch(artists) = children.get("By_Artist").unwrap() else {
        panic!("expected artist branch");
    };
    assert_eq!(
        artists.keys().cloned().collect::<Vec<_>>(),
        vec!["Alpha".to_string(), "Beta".to_string()]
    );
    assert_eq!(artists.get("Alpha").unwrap().file_count(), 2);
}

/// Mixed seven-file scenario at a low threshold: album art, two tracks by one
/// artist, a lyrics sheet, and two tracks by another artist all join a single
/// music project, and the audio subfolder splits by artist.
#[test]
fn mixed_media_scenario_builds_one_music_project() {
    use chrono::{TimeZone, Utc};
    use semorg_core::cluster::cluster_signatures;
    use semorg_core::models::{FileSignature, ProjectType};
    use semorg_core::structure::StructureBuilder;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    let sig = |name: &str, file_type: FileType, keywords: &[&str], artist: &str| {
        let mut metadata = BTreeMap::new();
        if !artist.is_empty() {
            metadata.insert("artist".to_string(), artist.to_string());
        }
        FileSignature {
            path: PathBuf::from(format!("/media/{name}")),
            file_type,
            content_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            name_tokens: BTreeSet::new(),
            metadata,
            created: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            modified: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            embedding: None,
        }
    };

    let files = vec![
        sig("cover_front.jpg", FileType::Image, &[], ""),
        sig("cover_back.jpg", FileType::Image, &[], ""),
        sig("take_one.mp3", FileType::Audio, &[], "DemoBand"),
        sig("take_two.mp3", FileType::Audio, &[], "DemoBand"),
        sig("lyrics.txt", FileType::Document, &["lyrics", "song"], ""),
        sig("session_one.mp3", FileType::Audio, &[], "OtherActs"),
        sig("session_two.mp3", FileType::Audio, &[], "OtherActs"),
    ];

    let clusters = cluster_signatures(files, 0.2);
    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert!(cluster.files.len() >= 5);
    assert_eq!(cluster.project_type, ProjectType::Music);

    let project = StructureBuilder::new(3).build(cluster);
    let FolderNode::Branch(songs) = project.structure.get("Songs").unwrap() else {
        panic!("expected artist subfolders under Songs");
    };
    let FolderNode::Branch(artists) = songs.get("By_Artist").unwrap() else {
        panic!("expected artist branch");
    };
    assert_eq!(
        artists.keys().cloned().collect::<Vec<_>>(),
        vec!["DemoBand".to_string(), "OtherActs".to_string()]
    );
    assert!(project.structure.contains_key("Album_Art"));
    assert!(project.structure.contains_key("Lyrics_Notes"));
}

#[tokio::test]
async fn search_ranks_matching_documents_first() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("budget_report.txt"), "budget numbers for the year").unwrap();
    fs::write(src.join("holiday_snap.jpg"), b"jpeg").unwrap();

    let hits = organizer(&temp)
        .search(&[src.clone()], "budget report", 5)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, src.join("budget_report.txt"));
}
