//! Grouping, ranking and time bucketing over a [`NormalizedDataset`].
//!
//! Every query view is built from one primitive: group events by an
//! [`AggregationKey`], sum a [`Metric`] per group, then either rank the groups
//! ([`AggregationEngine::group_and_rank`]) or lay them out in natural key order
//! ([`AggregationEngine::distribution`]).
//!
//! # Ranking
//!
//! ```text
//! totals desc ──► ties: key string asc ──► truncate(limit)
//! ("Zed", 5) ("Abba", 5) ("Moby", 9)   =>   Moby 9, Abba 5, Zed 5
//! ```
//!
//! Time keys are computed in the engine's presentation zone, never in UTC.
//!
//! - [`skips`] - skip classification
//! - [`summary`] - listening summary, unique ratios, busiest days

pub mod skips;
pub mod summary;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::error::ConfigResult;
use crate::models::{
    AggregationKey, DayType, GroupKey, Metric, NormalizedDataset, RankedGroup, StreamingEvent,
};

pub use skips::SkipSummary;
pub use summary::{ArtistDepth, DailyTotals, ListeningSummary, UniqueRatio};

/// Monday-first week.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// =============================================================================
// Result Types
// =============================================================================

/// Running total after each event, in timestamp order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativePoint {
    pub timestamp: DateTime<Utc>,
    pub total: u64,
}

/// Metric split between weekdays and weekends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WeekSplit {
    pub weekday_total: u64,
    pub weekend_total: u64,
}

/// Day-of-week × hour-of-day grid. Row 0 is Monday, column 0 is midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub metric: Metric,
    pub cells: [[u64; 24]; 7],
}

impl Heatmap {
    pub fn cell(&self, day: Weekday, hour: u32) -> u64 {
        self.cells[day.num_days_from_monday() as usize][hour as usize % 24]
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Query engine bound to one presentation zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationEngine {
    zone: Tz,
}

impl AggregationEngine {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn from_config(config: &AnalysisConfig) -> ConfigResult<Self> {
        Ok(Self::new(config.zone()?))
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Top `limit` groups by summed `metric`, descending.
    ///
    /// Equal totals are ordered by ascending key string. `limit == 0` gives an
    /// empty list; a limit above the group count gives every group.
    pub fn group_and_rank(
        &self,
        dataset: &NormalizedDataset,
        key: AggregationKey,
        metric: Metric,
        limit: usize,
    ) -> Vec<RankedGroup> {
        if limit == 0 {
            return Vec::new();
        }
        rank_totals(self.group_totals(dataset.iter(), key, metric), limit)
    }

    /// Every group in natural key order.
    ///
    /// Hours (00–23), weekdays (Monday–Sunday), months (01–12) and day types
    /// are listed in full with zero totals where nothing was played. Years and
    /// dates are ascending, names lexical. An empty dataset gives an empty list.
    pub fn distribution(
        &self,
        dataset: &NormalizedDataset,
        key: AggregationKey,
        metric: Metric,
    ) -> Vec<RankedGroup> {
        if dataset.is_empty() {
            return Vec::new();
        }

        let totals = self.group_totals(dataset.iter(), key, metric);
        let keys: Vec<GroupKey> = match key {
            AggregationKey::HourOfDay => (0..24).map(GroupKey::Hour).collect(),
            AggregationKey::DayOfWeek => WEEK.iter().map(|d| GroupKey::Weekday(*d)).collect(),
            AggregationKey::Month => (1..=12).map(GroupKey::Month).collect(),
            AggregationKey::DayType => vec![
                GroupKey::DayType(DayType::Weekday),
                GroupKey::DayType(DayType::Weekend),
            ],
            _ => {
                let mut keys: Vec<GroupKey> = totals.keys().cloned().collect();
                keys.sort_by(natural_cmp);
                keys
            }
        };

        keys.into_iter()
            .map(|k| {
                let total = totals.get(&k).copied().unwrap_or(0);
                RankedGroup::new(k, total)
            })
            .collect()
    }

    /// Day-of-week × hour grid of `metric`.
    pub fn heatmap(&self, dataset: &NormalizedDataset, metric: Metric) -> Heatmap {
        let mut cells = [[0u64; 24]; 7];
        for (event, local) in dataset.in_zone(&self.zone) {
            let day = local.weekday().num_days_from_monday() as usize;
            cells[day][local.hour() as usize] += metric.value(event);
        }
        Heatmap { metric, cells }
    }

    /// Running totals of `metric` over events sorted by timestamp.
    ///
    /// The sort is stable: events sharing a timestamp keep dataset order.
    pub fn cumulative(&self, dataset: &NormalizedDataset, metric: Metric) -> Vec<CumulativePoint> {
        let mut ordered: Vec<&StreamingEvent> = dataset.iter().collect();
        ordered.sort_by_key(|e| e.timestamp());

        let mut running = 0u64;
        ordered
            .into_iter()
            .map(|e| {
                running += metric.value(e);
                CumulativePoint {
                    timestamp: e.timestamp(),
                    total: running,
                }
            })
            .collect()
    }

    /// Saturday and Sunday (local) against the rest of the week.
    pub fn weekday_vs_weekend(&self, dataset: &NormalizedDataset, metric: Metric) -> WeekSplit {
        let totals = self.group_totals(dataset.iter(), AggregationKey::DayType, metric);
        let get = |t: DayType| totals.get(&GroupKey::DayType(t)).copied().unwrap_or(0);
        WeekSplit {
            weekday_total: get(DayType::Weekday),
            weekend_total: get(DayType::Weekend),
        }
    }

    /// Summed `metric` per group, unordered.
    pub(crate) fn group_totals<'a, I>(
        &self,
        events: I,
        key: AggregationKey,
        metric: Metric,
    ) -> HashMap<GroupKey, u64>
    where
        I: IntoIterator<Item = &'a StreamingEvent>,
    {
        let mut totals: HashMap<GroupKey, u64> = HashMap::new();
        for event in events {
            *totals.entry(key.group_of(event, &self.zone)).or_insert(0) += metric.value(event);
        }
        totals
    }
}

// =============================================================================
// Ranking Helpers
// =============================================================================

/// Sort descending by total, ties by ascending key string.
pub fn rank_groups(groups: &mut [RankedGroup]) {
    groups.sort_by_cached_key(|g| (Reverse(g.total), g.key.to_string()));
}

/// Rank a totals map and keep the first `limit` groups.
pub(crate) fn rank_totals(totals: HashMap<GroupKey, u64>, limit: usize) -> Vec<RankedGroup> {
    let mut groups: Vec<RankedGroup> = totals
        .into_iter()
        .map(|(key, total)| RankedGroup::new(key, total))
        .collect();
    rank_groups(&mut groups);
    groups.truncate(limit);
    groups
}

/// Natural order of keys of the same kind.
fn natural_cmp(a: &GroupKey, b: &GroupKey) -> Ordering {
    match (a, b) {
        (GroupKey::Hour(x), GroupKey::Hour(y)) => x.cmp(y),
        (GroupKey::Month(x), GroupKey::Month(y)) => x.cmp(y),
        (GroupKey::Year(x), GroupKey::Year(y)) => x.cmp(y),
        (GroupKey::Date(x), GroupKey::Date(y)) => x.cmp(y),
        (GroupKey::Weekday(x), GroupKey::Weekday(y)) => {
            x.num_days_from_monday().cmp(&y.num_days_from_monday())
        }
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// `part` as a percentage of `whole`; 0 when `whole` is 0.
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
