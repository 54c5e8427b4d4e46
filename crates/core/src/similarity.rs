//! Pairwise signature similarity: a fixed weighted sum of independent
//! sub-scores, each in [0, 1].

use crate::models::{FileSignature, FileType};
use std::collections::BTreeSet;

pub const NAME_WEIGHT: f32 = 0.3;
pub const CONTENT_WEIGHT: f32 = 0.4;
pub const TEMPORAL_WEIGHT: f32 = 0.2;
pub const METADATA_WEIGHT: f32 = 0.1;

const MAX_TIME_DIFF_SECS: f32 = 30.0 * 24.0 * 3600.0;

pub fn similarity(a: &FileSignature, b: &FileSignature) -> f32 {
    let name = jaccard(&a.name_tokens, &b.name_tokens);
    let content = content_score(a, b);
    let temporal = temporal_proximity(a, b);
    let metadata = audio_metadata_bonus(a, b);

    name * NAME_WEIGHT
        + content * CONTENT_WEIGHT
        + temporal * TEMPORAL_WEIGHT
        + metadata * METADATA_WEIGHT
}

/// Full pairwise matrix. Each pair is independent; the diagonal is zero
/// because a signature is never clustered against itself.
pub fn similarity_matrix(signatures: &[FileSignature]) -> Vec<Vec<f32>> {
    let n = signatures.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let score = similarity(&signatures[i], &signatures[j]);
            matrix[i][j] = score;
            matrix[j][i] = score;
        }
    }
    matrix
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

/// Keyword Jaccard, lifted by embedding cosine when both sides carry a
/// vector. The lift is monotone in semantic closeness and never lowers the
/// token-based score, so the non-embedding path stays the floor.
fn content_score(a: &FileSignature, b: &FileSignature) -> f32 {
    let token_score = jaccard(&a.content_keywords, &b.content_keywords);
    match (&a.embedding, &b.embedding) {
        (Some(ea), Some(eb)) => token_score.max(cosine(ea, eb).clamp(0.0, 1.0)),
        _ => token_score,
    }
}

fn temporal_proximity(a: &FileSignature, b: &FileSignature) -> f32 {
    let diff = (a.created - b.created).num_seconds().unsigned_abs() as f32;
    (1.0 - diff / MAX_TIME_DIFF_SECS).max(0.0)
}

/// Audio-only metadata bonus: 0.5 for an artist match, raised (not added) to
/// 0.8 for an album match. An album match alone still yields 0.8; album wins
/// over artist-only by construction.
fn audio_metadata_bonus(a: &FileSignature, b: &FileSignature) -> f32 {
    if a.file_type != b.file_type || a.file_type != FileType::Audio {
        return 0.0;
    }
    let mut score: f32 = 0.0;
    if field_matches(a, b, "artist") {
        score = 0.5;
    }
    if field_matches(a, b, "album") {
        score = score.max(0.8);
    }
    score
}

fn field_matches(a: &FileSignature, b: &FileSignature, key: &str) -> bool {
    match (a.metadata.get(key), b.metadata.get(key)) {
        (Some(x), Some(y)) => !x.is_empty() && x == y,
        _ => false,
    }
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    fn sig(name: &str, keywords: &[&str], file_type: FileType) -> FileSignature {
        FileSignature {
            path: PathBuf::from(format!("/files/{name}")),
            file_type,
            content_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            name_tokens: BTreeSet::new(),
            metadata: BTreeMap::new(),
            created: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            modified: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            embedding: None,
        }
    }

    #[test]
    fn identical_keywords_and_dates_score_content_plus_temporal() {
        let a = sig("a.txt", &["report", "quarterly"], FileType::Document);
        let b = sig("b.txt", &["report", "quarterly"], FileType::Document);
        // content 1.0 * 0.4 + temporal 1.0 * 0.2
        assert!((similarity(&a, &b) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn temporal_term_decays_to_zero_past_thirty_days() {
        let a = sig("a.txt", &[], FileType::Document);
        let mut b = sig("b.txt", &[], FileType::Document);
        b.created = a.created + Duration::days(45);
        assert_eq!(similarity(&a, &b), 0.0);

        let mut c = sig("c.txt", &[], FileType::Document);
        c.created = a.created + Duration::days(15);
        // temporal 0.5 * 0.2
        assert!((similarity(&a, &c) - 0.1).abs() < 1e-3);
    }

    #[test]
    fn artist_match_scores_half_album_match_wins_at_point_eight() {
        let mut a = sig("one.mp3", &[], FileType::Audio);
        let mut b = sig("two.mp3", &[], FileType::Audio);
        a.metadata.insert("artist".into(), "DemoBand".into());
        b.metadata.insert("artist".into(), "DemoBand".into());
        // artist bonus 0.5 * 0.1 on top of temporal 0.2
        assert!((similarity(&a, &b) - 0.25).abs() < 1e-6);

        a.metadata.insert("album".into(), "First".into());
        b.metadata.insert("album".into(), "First".into());
        // album raises the bonus to 0.8, not 0.5 + 0.8
        assert!((similarity(&a, &b) - 0.28).abs() < 1e-6);
    }

    #[test]
    fn album_match_without_artist_still_scores_point_eight() {
        let mut a = sig("one.mp3", &[], FileType::Audio);
        let mut b = sig("two.mp3", &[], FileType::Audio);
        a.metadata.insert("album".into(), "First".into());
        b.metadata.insert("album".into(), "First".into());
        assert!((similarity(&a, &b) - 0.28).abs() < 1e-6);
    }

    #[test]
    fn metadata_bonus_ignores_non_audio_and_empty_fields() {
        let mut a = sig("a.txt", &[], FileType::Document);
        let mut b = sig("b.txt", &[], FileType::Document);
        a.metadata.insert("artist".into(), "X".into());
        b.metadata.insert("artist".into(), "X".into());
        assert!((similarity(&a, &b) - 0.2).abs() < 1e-6);

        let mut c = sig("c.mp3", &[], FileType::Audio);
        let mut d = sig("d.mp3", &[], FileType::Audio);
        c.metadata.insert("artist".into(), "".into());
        d.metadata.insert("artist".into(), "".into());
        assert!((similarity(&c, &d) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn embeddings_lift_but_never_lower_the_content_term() {
        let mut a = sig("a.txt", &["shared"], FileType::Document);
        let mut b = sig("b.txt", &["shared"], FileType::Document);
        let jaccard_only = similarity(&a, &b);

        // Orthogonal embeddings: cosine 0, token score keeps the floor.
        a.embedding = Some(vec![1.0, 0.0]);
        b.embedding = Some(vec![0.0, 1.0]);
        assert!((similarity(&a, &b) - jaccard_only).abs() < 1e-6);

        // Parallel embeddings with disjoint tokens: cosine carries the term.
        let mut c = sig("c.txt", &["alpha"], FileType::Document);
        let mut d = sig("d.txt", &["beta"], FileType::Document);
        c.embedding = Some(vec![0.6, 0.8]);
        d.embedding = Some(vec![0.6, 0.8]);
        assert!((similarity(&c, &d) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn matrix_is_symmetric_with_zero_diagonal() {
        let sigs = vec![
            sig("a.txt", &["x", "y"], FileType::Document),
            sig("b.txt", &["y", "z"], FileType::Document),
            sig("c.txt", &["q"], FileType::Document),
        ];
        let m = similarity_matrix(&sigs);
        for i in 0..3 {
            assert_eq!(m[i][i], 0.0);
            for j in 0..3 {
                assert_eq!(m[i][j], m[j][i]);
            }
        }
    }
}
