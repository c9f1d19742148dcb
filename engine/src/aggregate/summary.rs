//! Whole-history summaries built on the grouping primitives.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::{percent, rank_totals, AggregationEngine};
use crate::error::{QueryError, QueryResult};
use crate::models::{AggregationKey, Metric, NormalizedDataset, RankedGroup, StreamingEvent};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Headline numbers for a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListeningSummary {
    pub total_plays: u64,
    pub total_ms: u64,
    pub total_hours: f64,
    pub distinct_tracks: usize,
    pub distinct_artists: usize,
    pub first_play: Option<DateTime<Utc>>,
    pub last_play: Option<DateTime<Utc>>,
    /// Local calendar days with at least one play
    pub active_days: usize,
    pub mean_plays_per_active_day: f64,
}

/// Distinct names against all named plays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueRatio {
    pub key: AggregationKey,
    pub distinct: usize,
    pub total: usize,
    pub distinct_percent: f64,
}

/// A top artist and how many different tracks of theirs were played
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistDepth {
    pub artist: String,
    pub total: u64,
    pub distinct_tracks: usize,
}

/// Busiest local calendar days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub metric: Metric,
    pub busiest: Vec<RankedGroup>,
    pub active_days: usize,
    pub mean_per_active_day: f64,
}

impl AggregationEngine {
    pub fn listening_summary(&self, dataset: &NormalizedDataset) -> ListeningSummary {
        let total_plays = dataset.total(Metric::PlayCount);
        let total_ms = dataset.total(Metric::DurationPlayedMs);
        let active_days = self
            .group_totals(dataset.iter(), AggregationKey::CalendarDate, Metric::PlayCount)
            .len();

        ListeningSummary {
            total_plays,
            total_ms,
            total_hours: total_ms as f64 / MS_PER_HOUR,
            distinct_tracks: distinct_names(dataset, AggregationKey::Track),
            distinct_artists: distinct_names(dataset, AggregationKey::Artist),
            first_play: dataset.iter().map(|e| e.timestamp()).min(),
            last_play: dataset.iter().map(|e| e.timestamp()).max(),
            active_days,
            mean_plays_per_active_day: mean(total_plays, active_days),
        }
    }

    /// Distinct track or artist names against plays carrying a name.
    ///
    /// Only [`AggregationKey::Track`] and [`AggregationKey::Artist`] are
    /// accepted. Plays with an empty name are left out of both counts.
    pub fn unique_ratio(
        &self,
        dataset: &NormalizedDataset,
        key: AggregationKey,
    ) -> QueryResult<UniqueRatio> {
        if key.is_time_bucket() {
            return Err(QueryError::InvalidAggregationRequest(format!(
                "unique ratio needs a name key, got '{}'",
                key
            )));
        }
        let total = dataset.iter().filter(|e| !name_of(e, key).is_empty()).count();
        let distinct = distinct_names(dataset, key);
        Ok(UniqueRatio {
            key,
            distinct,
            total,
            distinct_percent: percent(distinct as u64, total as u64),
        })
    }

    /// Top `limit` artists by `metric`, each with its distinct track count.
    pub fn unique_tracks_per_top_artist(
        &self,
        dataset: &NormalizedDataset,
        metric: Metric,
        limit: usize,
    ) -> Vec<ArtistDepth> {
        let mut tracks_by_artist: HashMap<&str, HashSet<&str>> = HashMap::new();
        for event in dataset {
            tracks_by_artist
                .entry(event.artist_name())
                .or_default()
                .insert(event.track_name());
        }

        self.group_and_rank(dataset, AggregationKey::Artist, metric, limit)
            .into_iter()
            .map(|group| {
                let artist = group.label();
                let distinct_tracks = tracks_by_artist
                    .get(artist.as_str())
                    .map(HashSet::len)
                    .unwrap_or(0);
                ArtistDepth {
                    artist,
                    total: group.total,
                    distinct_tracks,
                }
            })
            .collect()
    }

    /// Top `limit` local days by `metric`, plus the mean over active days.
    pub fn daily_totals(
        &self,
        dataset: &NormalizedDataset,
        metric: Metric,
        limit: usize,
    ) -> DailyTotals {
        let totals = self.group_totals(dataset.iter(), AggregationKey::CalendarDate, metric);
        let active_days = totals.len();
        let busiest = if limit == 0 { Vec::new() } else { rank_totals(totals, limit) };
        DailyTotals {
            metric,
            busiest,
            active_days,
            mean_per_active_day: mean(dataset.total(metric), active_days),
        }
    }
}

fn name_of(event: &StreamingEvent, key: AggregationKey) -> &str {
    match key {
        AggregationKey::Artist => event.artist_name(),
        _ => event.track_name(),
    }
}

fn distinct_names(dataset: &NormalizedDataset, key: AggregationKey) -> usize {
    dataset
        .iter()
        .map(|e| name_of(e, key))
        .filter(|n| !n.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
