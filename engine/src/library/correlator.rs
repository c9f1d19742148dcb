//! Liked tracks against streaming history.
//!
//! The join is on lower-cased track name only. Library and history URIs use
//! different formats, and the artist is ignored, so two different songs sharing
//! a title are counted together.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::aggregate::{percent, AggregationEngine};
use crate::models::{
    AggregationKey, CorrelationResult, LibraryCollection, Metric, NormalizedDataset,
};

/// Streamed vs never streamed over the whole library
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub library_size: usize,
    pub streamed: usize,
    pub never_streamed: usize,
    pub streamed_percent: f64,
    pub never_streamed_percent: f64,
}

/// Every liked track with its play count, plus the summary and top list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    /// Library order
    pub results: Vec<CorrelationResult>,
    pub summary: CorrelationSummary,
    /// Most played liked tracks, ties by track name
    pub top: Vec<CorrelationResult>,
}

/// Play counts by lower-cased track name. Names differing only by case sum up.
fn play_counts(engine: &AggregationEngine, dataset: &NormalizedDataset) -> HashMap<String, u64> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    let groups =
        engine.group_and_rank(dataset, AggregationKey::Track, Metric::PlayCount, usize::MAX);
    for group in groups {
        *counts.entry(group.label().to_lowercase()).or_insert(0) += group.total;
    }
    counts
}

/// Join `library` against `dataset` and keep the `limit` most played liked tracks.
pub fn correlate(
    engine: &AggregationEngine,
    library: &LibraryCollection,
    dataset: &NormalizedDataset,
    limit: usize,
) -> CorrelationReport {
    let counts = play_counts(engine, dataset);

    let results: Vec<CorrelationResult> = library
        .entries()
        .iter()
        .map(|entry| {
            let matched_play_count = if entry.track.is_empty() {
                0
            } else {
                counts.get(&entry.track.to_lowercase()).copied().unwrap_or(0)
            };
            CorrelationResult {
                entry: entry.clone(),
                matched_play_count,
                ever_streamed: matched_play_count > 0,
            }
        })
        .collect();

    let streamed = results.iter().filter(|r| r.ever_streamed).count();
    let never_streamed = results.len() - streamed;
    let summary = CorrelationSummary {
        library_size: results.len(),
        streamed,
        never_streamed,
        streamed_percent: percent(streamed as u64, results.len() as u64),
        never_streamed_percent: percent(never_streamed as u64, results.len() as u64),
    };

    let mut top = results.clone();
    top.sort_by(|a, b| {
        Reverse(a.matched_play_count)
            .cmp(&Reverse(b.matched_play_count))
            .then_with(|| a.entry.track.cmp(&b.entry.track))
    });
    top.truncate(limit);

    CorrelationReport {
        results,
        summary,
        top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_support::dataset;
    use crate::models::LibraryEntry;

    fn liked(artist: &str, track: &str) -> LibraryEntry {
        LibraryEntry {
            artist: artist.into(),
            track: track.into(),
            ..LibraryEntry::default()
        }
    }

    fn engine() -> AggregationEngine {
        AggregationEngine::new(chrono_tz::UTC)
    }

    #[test]
    fn test_echo_and_solo() {
        let history = dataset(&[
            ("Echo", "Wave", "2024-01-01 10:00", 200_000),
            ("Echo", "Wave", "2024-01-02 10:00", 200_000),
            ("Echo", "Wave", "2024-01-03 10:00", 200_000),
            ("Other", "Band", "2024-01-03 11:00", 200_000),
        ]);
        let library = LibraryCollection::new(vec![liked("Wave", "Echo"), liked("Nobody", "Solo")]);

        let report = correlate(&engine(), &library, &history, 1);
        assert_eq!(report.results[0].matched_play_count, 3);
        assert!(report.results[0].ever_streamed);
        assert_eq!(report.results[1].matched_play_count, 0);
        assert!(!report.results[1].ever_streamed);

        assert_eq!(report.summary.streamed, 1);
        assert_eq!(report.summary.never_streamed, 1);
        assert!((report.summary.streamed_percent - 50.0).abs() < 1e-9);
        assert!((report.summary.never_streamed_percent - 50.0).abs() < 1e-9);

        assert_eq!(report.top.len(), 1);
        assert_eq!(report.top[0].entry.track, "Echo");
        assert_eq!(report.top[0].matched_play_count, 3);
    }

    #[test]
    fn test_case_insensitive_and_artist_ignored() {
        let history = dataset(&[
            ("HELLO", "Someone", "2024-01-01 10:00", 1),
            ("hello", "Someone Else", "2024-01-01 11:00", 1),
        ]);
        let library = LibraryCollection::new(vec![liked("Adele", "Hello")]);
        let report = correlate(&engine(), &library, &history, 10);
        assert_eq!(report.results[0].matched_play_count, 2);
    }

    #[test]
    fn test_empty_track_name_never_matches() {
        let history = dataset(&[("", "", "2024-01-01 10:00", 1)]);
        let library = LibraryCollection::new(vec![liked("A", "")]);
        let report = correlate(&engine(), &library, &history, 10);
        assert_eq!(report.results[0].matched_play_count, 0);
    }

    #[test]
    fn test_top_tie_break_by_track() {
        let history = dataset(&[
            ("b", "x", "2024-01-01 10:00", 1),
            ("a", "x", "2024-01-01 11:00", 1),
        ]);
        let library =
            LibraryCollection::new(vec![liked("x", "b"), liked("x", "a"), liked("x", "c")]);
        let report = correlate(&engine(), &library, &history, 10);
        let order: Vec<&str> = report.top.iter().map(|r| r.entry.track.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_library() {
        let report =
            correlate(&engine(), &LibraryCollection::default(), &NormalizedDataset::empty(), 5);
        assert!(report.results.is_empty());
        assert_eq!(report.summary.streamed_percent, 0.0);
        assert_eq!(report.summary.never_streamed_percent, 0.0);
        assert!(report.top.is_empty());
    }
}
