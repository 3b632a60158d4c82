use crate::github::RawTrafficRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    Views,
    Clones,
}

impl MetricFamily {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Clones => "clones",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSample {
    pub count: u64,
    pub uniques: u64,
}

/// Per-family daily samples keyed by UTC calendar date. An empty table is the
/// "family has no data" case; lookups on it still succeed with zero samples,
/// so downstream code never branches on missing columns.
#[derive(Debug, Clone)]
pub struct MetricTable {
    family: MetricFamily,
    by_date: BTreeMap<NaiveDate, MetricSample>,
}

impl MetricTable {
    pub fn empty(family: MetricFamily) -> Self {
        Self {
            family,
            by_date: BTreeMap::new(),
        }
    }

    pub fn family(&self) -> MetricFamily {
        self.family
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next().copied()
    }

    /// Sample for a calendar date; dates the upstream never reported read as zero.
    pub fn sample(&self, date: NaiveDate) -> MetricSample {
        self.by_date.get(&date).copied().unwrap_or_default()
    }
}

/// Collapse raw API records onto UTC calendar dates. The timestamp's offset is
/// resolved here, once; all later stages operate on calendar dates only.
/// Should the payload ever carry two records for the same day, the later one
/// in iteration order replaces the earlier.
pub fn normalize(family: MetricFamily, records: &[RawTrafficRecord]) -> MetricTable {
    let mut by_date = BTreeMap::new();
    for record in records {
        by_date.insert(
            record.timestamp.date_naive(),
            MetricSample {
                count: record.count,
                uniques: record.uniques,
            },
        );
    }
    MetricTable { family, by_date }
}

/// One reconciled day of traffic. The date stays typed until the CSV/chart
/// boundary, where it serializes as `YYYY-MM-DD` under the `timestamp` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTrafficRow {
    #[serde(rename = "timestamp")]
    pub date: NaiveDate,
    pub views_count: u64,
    pub views_uniques: u64,
    pub clones_count: u64,
    pub clones_uniques: u64,
}

/// Merge the two fetched families and the previously persisted history onto a
/// complete daily calendar.
///
/// The calendar runs from the earliest fetched date through `today`, one row
/// per day, so days the API reported nothing become explicit zero rows rather
/// than holes in the series. When both families are empty the span degrades to
/// the single day `today`, which still yields a valid zero row. History rows
/// are folded in first, so on a date collision the already-persisted values
/// win over the freshly fetched ones. The result is strictly ascending by
/// date with no duplicates.
pub fn reconcile(
    views: &MetricTable,
    clones: &MetricTable,
    history: &[DailyTrafficRow],
    today: NaiveDate,
) -> Vec<DailyTrafficRow> {
    let start = match (views.earliest_date(), clones.earliest_date()) {
        (Some(views_start), Some(clones_start)) => views_start.min(clones_start),
        (Some(views_start), None) => views_start,
        (None, Some(clones_start)) => clones_start,
        (None, None) => today,
    };

    let mut merged: BTreeMap<NaiveDate, DailyTrafficRow> = BTreeMap::new();
    for row in history {
        merged.entry(row.date).or_insert_with(|| row.clone());
    }

    let mut date = start;
    while date <= today {
        let views_sample = views.sample(date);
        let clones_sample = clones.sample(date);
        merged.entry(date).or_insert(DailyTrafficRow {
            date,
            views_count: views_sample.count,
            views_uniques: views_sample.uniques,
            clones_count: clones_sample.count,
            clones_uniques: clones_sample.uniques,
        });
        let Some(next) = date.succ_opt() else {
            break;
        };
        date = next;
    }

    merged.into_values().collect()
}
