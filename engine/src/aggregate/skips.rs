//! Skip classification.
//!
//! A play is a skip when `duration_played_ms < threshold_ms`. A play lasting
//! exactly the threshold counts as played.

use serde::Serialize;

use super::{percent, rank_totals, AggregationEngine};
use crate::models::{AggregationKey, Metric, NormalizedDataset, RankedGroup, StreamingEvent};

/// Played vs skipped counts for one threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkipSummary {
    pub threshold_ms: u64,
    pub played_count: u64,
    pub skipped_count: u64,
    /// Share of skips, 0–100
    pub skip_rate_percent: f64,
}

/// Strictly shorter than the threshold.
pub fn is_skip(event: &StreamingEvent, threshold_ms: u64) -> bool {
    event.duration_played_ms() < threshold_ms
}

impl AggregationEngine {
    /// Count plays and skips.
    pub fn skip_classify(&self, dataset: &NormalizedDataset, threshold_ms: u64) -> SkipSummary {
        let skipped_count = dataset.iter().filter(|e| is_skip(e, threshold_ms)).count() as u64;
        let played_count = dataset.len() as u64 - skipped_count;
        SkipSummary {
            threshold_ms,
            played_count,
            skipped_count,
            skip_rate_percent: percent(skipped_count, dataset.len() as u64),
        }
    }

    /// Tracks ranked by number of skips, same ordering as
    /// [`AggregationEngine::group_and_rank`].
    pub fn most_skipped(
        &self,
        dataset: &NormalizedDataset,
        threshold_ms: u64,
        limit: usize,
    ) -> Vec<RankedGroup> {
        if limit == 0 {
            return Vec::new();
        }
        let skipped = dataset.iter().filter(|e| is_skip(e, threshold_ms));
        rank_totals(
            self.group_totals(skipped, AggregationKey::Track, Metric::PlayCount),
            limit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::dataset;
    use super::*;

    fn engine() -> AggregationEngine {
        AggregationEngine::new(chrono_tz::UTC)
    }

    #[test]
    fn test_threshold_boundary() {
        let data = dataset(&[
            ("exact", "a", "2024-01-01 10:00", 30_000),
            ("one-less", "a", "2024-01-01 10:01", 29_999),
        ]);
        let summary = engine().skip_classify(&data, 30_000);
        assert_eq!(summary.played_count, 1);
        assert_eq!(summary.skipped_count, 1);
        assert!((summary.skip_rate_percent - 50.0).abs() < f64::EPSILON);

        let skipped = engine().most_skipped(&data, 30_000, 10);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].label(), "one-less");
    }

    #[test]
    fn test_most_skipped_ranking() {
        let data = dataset(&[
            ("Intro", "a", "2024-01-01 10:00", 1_000),
            ("Intro", "a", "2024-01-02 10:00", 2_000),
            ("Bside", "b", "2024-01-03 10:00", 500),
            ("Anthem", "c", "2024-01-04 10:00", 900),
            ("Anthem", "c", "2024-01-05 10:00", 240_000),
        ]);
        let ranked = engine().most_skipped(&data, 30_000, 10);
        let rows: Vec<(String, u64)> = ranked.iter().map(|g| (g.label(), g.total)).collect();
        assert_eq!(
            rows,
            vec![("Intro".into(), 2), ("Anthem".into(), 1), ("Bside".into(), 1)]
        );
        assert_eq!(engine().most_skipped(&data, 30_000, 1).len(), 1);
        assert!(engine().most_skipped(&data, 30_000, 0).is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let summary = engine().skip_classify(&NormalizedDataset::empty(), 30_000);
        assert_eq!(summary.played_count, 0);
        assert_eq!(summary.skipped_count, 0);
        assert_eq!(summary.skip_rate_percent, 0.0);
        assert!(engine().most_skipped(&NormalizedDataset::empty(), 30_000, 5).is_empty());
    }
}
