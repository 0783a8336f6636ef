use crate::{
    aggregate, cumulative, expand_range, local_date, DailySeries, Field, MonthlySeries,
    PlayerDocument, ReportError, Result,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Offset used to turn finish timestamps into calendar days.
    pub offset: FixedOffset,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            offset: utc_offset(),
        }
    }
}

impl ReportOptions {
    /// Options for a whole-hour offset from UTC; `None` when out of range.
    pub fn with_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours.checked_mul(3600)?).map(|offset| Self { offset })
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Everything the renderers need: both series, grand totals, and the player.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerReport {
    pub player: String,
    pub generated_at: DateTime<Utc>,
    pub reported_points: Option<u64>,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub categories: Vec<String>,
    pub total_finished: u64,
    pub total_points: u64,
    pub unfinished_maps: u64,
    pub processing_time_ms: u32,
    pub monthly: MonthlySeries,
    pub daily: DailySeries,
}

/// Expand the activity range, aggregate, and compute grand totals.
pub fn build_report(document: &PlayerDocument, options: &ReportOptions) -> Result<PlayerReport> {
    let start = Instant::now();

    let first_day = activity_day(document.first_activity, options.offset, "first_finish")?;
    let last_day = activity_day(document.last_activity, options.offset, "last_finishes[0]")?;
    let timeline = expand_range(first_day, last_day)?;
    debug!(
        %first_day,
        %last_day,
        days = timeline.days().len(),
        months = timeline.months().len(),
        "expanded activity range"
    );

    let aggregation = aggregate(
        &document.records,
        &timeline,
        &document.categories,
        options.offset,
    )?;

    let total_finished = cumulative(&aggregation.daily, Field::Count)
        .last()
        .copied()
        .unwrap_or(0);
    let total_points = cumulative(&aggregation.daily, Field::Points)
        .last()
        .copied()
        .unwrap_or(0);
    let unfinished_maps = (document.records.len() - document.finished_count()) as u64;

    Ok(PlayerReport {
        player: document.player.clone(),
        generated_at: Utc::now(),
        reported_points: document.reported_points,
        first_day,
        last_day,
        categories: document.categories.clone(),
        total_finished,
        total_points,
        unfinished_maps,
        processing_time_ms: elapsed_ms(start.elapsed()),
        monthly: aggregation.monthly,
        daily: aggregation.daily,
    })
}

/// Milliseconds, saturating at `u32::MAX`.
fn elapsed_ms(elapsed: Duration) -> u32 {
    u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX)
}

fn activity_day(timestamp: i64, offset: FixedOffset, field: &str) -> Result<NaiveDate> {
    local_date(timestamp, offset)
        .ok_or_else(|| ReportError::malformed(format!("unrepresentable `{field}` timestamp")))
}
