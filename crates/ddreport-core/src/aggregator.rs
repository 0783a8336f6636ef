//! Temporal aggregation of completion records into daily and monthly series.
//!
//! Both series are built from a zero-filled skeleton so every bucket of the
//! timeline is present, then filled from the finished records.

use crate::{CompletionRecord, Field, MonthKey, ReportError, Result, Timeline};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Per-category accumulator inside one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub count: u64,
    pub points: u64,
    /// Names of the maps finished in this bucket, kept sorted.
    pub maps: Vec<String>,
}

impl CategoryTotals {
    pub fn value(&self, field: Field) -> u64 {
        match field {
            Field::Count => self.count,
            Field::Points => self.points,
        }
    }

    fn add_record(&mut self, record: &CompletionRecord) {
        self.count = self.count.saturating_add(1);
        self.points = self.points.saturating_add(record.points);
        let position = self
            .maps
            .binary_search(&record.map)
            .unwrap_or_else(|index| index);
        self.maps.insert(position, record.map.clone());
    }
}

/// Accumulators for one bucket, keyed by category name.
pub type BucketTotals = BTreeMap<String, CategoryTotals>;

/// Chronologically ordered mapping from bucket key to per-category totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Series<K: Ord> {
    buckets: BTreeMap<K, BucketTotals>,
}

pub type DailySeries = Series<NaiveDate>;
pub type MonthlySeries = Series<MonthKey>;

impl<K: Ord + Copy> Series<K> {
    fn skeleton(keys: &[K], categories: &[String]) -> Self {
        let empty: BucketTotals = categories
            .iter()
            .map(|category| (category.clone(), CategoryTotals::default()))
            .collect();
        Self {
            buckets: keys.iter().map(|key| (*key, empty.clone())).collect(),
        }
    }

    fn add_record(&mut self, key: K, record: &CompletionRecord) {
        // Keys and categories were checked against the skeleton beforehand.
        if let Some(totals) = self
            .buckets
            .get_mut(&key)
            .and_then(|bucket| bucket.get_mut(&record.category))
        {
            totals.add_record(record);
        }
    }
}

impl<K: Ord> Series<K> {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.buckets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &BucketTotals)> {
        self.buckets.iter()
    }

    pub fn get(&self, key: &K) -> Option<&BucketTotals> {
        self.buckets.get(key)
    }
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub daily: DailySeries,
    pub monthly: MonthlySeries,
}

/// Calendar day of an epoch timestamp in the given offset.
pub fn local_date(timestamp: i64, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// Aggregate finished records into daily and monthly series over `timeline`.
///
/// Records without a first finish are skipped. Every finished record is
/// checked (date inside the timeline, category known) before any bucket is
/// touched, so a failure leaves nothing half-built.
pub fn aggregate(
    records: &[CompletionRecord],
    timeline: &Timeline,
    categories: &[String],
    offset: FixedOffset,
) -> Result<Aggregation> {
    let known: HashSet<&str> = categories.iter().map(String::as_str).collect();

    let mut placed: Vec<(NaiveDate, &CompletionRecord)> = Vec::with_capacity(records.len());
    for record in records {
        let Some(timestamp) = record.first_finish else {
            continue;
        };
        let day = local_date(timestamp, offset).ok_or_else(|| {
            ReportError::malformed(format!("unrepresentable finish time for `{}`", record.map))
        })?;
        if !timeline.contains(day) {
            return Err(ReportError::malformed(format!(
                "map `{}` finished on {} outside the activity range {}..{}",
                record.map,
                day,
                timeline.first_day(),
                timeline.last_day()
            )));
        }
        if !known.contains(record.category.as_str()) {
            return Err(ReportError::malformed(format!(
                "map `{}` belongs to unknown category `{}`",
                record.map, record.category
            )));
        }
        placed.push((day, record));
    }

    let mut daily = Series::skeleton(timeline.days(), categories);
    let mut monthly = Series::skeleton(timeline.months(), categories);

    for (day, record) in &placed {
        daily.add_record(*day, record);
        monthly.add_record(MonthKey::from_date(*day), record);
    }

    debug!(
        finished = placed.len(),
        skipped = records.len() - placed.len(),
        days = daily.len(),
        months = monthly.len(),
        "aggregated completion records"
    );

    Ok(Aggregation { daily, monthly })
}

/// Per-bucket totals summed across all categories.
pub fn bucket_totals<K: Ord>(series: &Series<K>, field: Field) -> Vec<u64> {
    series
        .iter()
        .map(|(_, bucket)| {
            bucket
                .values()
                .fold(0u64, |acc, totals| acc.saturating_add(totals.value(field)))
        })
        .collect()
}

/// Running total of [`bucket_totals`]; the last element is the grand total.
pub fn cumulative<K: Ord>(series: &Series<K>, field: Field) -> Vec<u64> {
    bucket_totals(series, field)
        .into_iter()
        .scan(0u64, |running, value| {
            *running = running.saturating_add(value);
            Some(*running)
        })
        .collect()
}

/// One category's value in every bucket, zero where the category is absent.
pub fn category_values<K: Ord>(series: &Series<K>, category: &str, field: Field) -> Vec<u64> {
    series
        .iter()
        .map(|(_, bucket)| bucket.get(category).map_or(0, |totals| totals.value(field)))
        .collect()
}
