//! Player statistics document: raw schema and validation.

use crate::{CompletionRecord, ReportError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

const MAX_FUTURE_SECS: i64 = 366 * 24 * 60 * 60;

// Structs for the `players/?json2=<name>` response. Every field is optional
// at the serde level so that absence is reported with the field path.

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    player: Option<String>,
    #[serde(default)]
    points: Option<RawPoints>,
    #[serde(default)]
    first_finish: Option<RawTimestamp>,
    #[serde(default)]
    last_finishes: Option<Vec<RawTimestamp>>,
    #[serde(default)]
    types: Option<BTreeMap<String, RawCategory>>,
}

#[derive(Deserialize)]
struct RawPoints {
    #[serde(default)]
    points: Option<u64>,
}

#[derive(Deserialize)]
struct RawTimestamp {
    #[serde(default)]
    timestamp: Option<f64>,
}

#[derive(Deserialize)]
struct RawCategory {
    #[serde(default)]
    maps: Option<BTreeMap<String, RawMap>>,
}

#[derive(Deserialize)]
struct RawMap {
    #[serde(default)]
    points: Option<u64>,
    #[serde(default)]
    first_finish: Option<f64>,
}

/// A validated player document, ready for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDocument {
    pub player: String,
    /// Total points as reported by the server, if present.
    pub reported_points: Option<u64>,
    /// Epoch seconds of the player's first finish.
    pub first_activity: i64,
    /// Epoch seconds of the most recent finish (`last_finishes[0]`).
    pub last_activity: i64,
    pub categories: Vec<String>,
    pub records: Vec<CompletionRecord>,
}

impl PlayerDocument {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawDocument = serde_json::from_value(value)
            .map_err(|e| ReportError::malformed(format!("unexpected document shape: {e}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDocument) -> Result<Self> {
        let types = raw
            .types
            .ok_or_else(|| ReportError::malformed("missing `types`"))?;

        let mut categories = Vec::with_capacity(types.len());
        let mut records = Vec::new();

        for (category, entry) in types {
            let maps = entry
                .maps
                .ok_or_else(|| ReportError::malformed(format!("missing `types.{category}.maps`")))?;

            for (map, info) in maps {
                let points = info.points.ok_or_else(|| {
                    ReportError::malformed(format!(
                        "missing `points` for map `{map}` in `{category}`"
                    ))
                })?;
                let first_finish = match info.first_finish {
                    Some(secs) => Some(to_epoch_seconds(secs).ok_or_else(|| {
                        ReportError::malformed(format!(
                            "invalid `first_finish` for map `{map}` in `{category}`"
                        ))
                    })?),
                    None => None,
                };

                records.push(CompletionRecord {
                    category: category.clone(),
                    map,
                    first_finish,
                    points,
                });
            }

            categories.push(category);
        }

        let latest = Utc::now().timestamp().saturating_add(MAX_FUTURE_SECS);
        let first_activity = activity_timestamp(
            raw.first_finish.and_then(|ts| ts.timestamp),
            "first_finish.timestamp",
            latest,
        )?;
        let last_activity = activity_timestamp(
            raw.last_finishes
                .and_then(|finishes| finishes.into_iter().next())
                .and_then(|ts| ts.timestamp),
            "last_finishes[0].timestamp",
            latest,
        )?;

        debug!(
            categories = categories.len(),
            records = records.len(),
            "validated player document"
        );

        Ok(Self {
            player: raw.player.unwrap_or_default(),
            reported_points: raw.points.and_then(|p| p.points),
            first_activity,
            last_activity,
            categories,
            records,
        })
    }

    pub fn finished_records(&self) -> impl Iterator<Item = &CompletionRecord> {
        self.records.iter().filter(|r| r.is_finished())
    }

    pub fn finished_count(&self) -> usize {
        self.finished_records().count()
    }
}

/// Parse and validate a player document from its JSON text.
pub fn parse_document(json: &str) -> Result<PlayerDocument> {
    let raw: RawDocument = serde_json::from_str(json)
        .map_err(|e| ReportError::malformed(format!("invalid JSON document: {e}")))?;
    PlayerDocument::from_raw(raw)
}

/// Truncate fractional epoch seconds; rejects values chrono cannot represent.
/// Activity bounds the whole report is bucketed over. Anything before the
/// epoch or more than a year ahead (millisecond timestamps, for one) would
/// expand into millions of empty days.
fn activity_timestamp(secs: Option<f64>, field: &str, latest: i64) -> Result<i64> {
    let secs = secs.ok_or_else(|| ReportError::malformed(format!("missing `{field}`")))?;
    let whole =
        to_epoch_seconds(secs).ok_or_else(|| ReportError::malformed(format!("invalid `{field}`")))?;
    if !(0..=latest).contains(&whole) {
        return Err(ReportError::malformed(format!(
            "`{field}` is out of range: {whole}"
        )));
    }
    Ok(whole)
}

fn to_epoch_seconds(secs: f64) -> Option<i64> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let whole = whole as i64;
    DateTime::<Utc>::from_timestamp(whole, 0).map(|_| whole)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "player": "Randomium",
            "points": { "total": 30000, "points": 9, "rank": 1200 },
            "first_finish": { "timestamp": 1614556800.0, "map": "Kobra" },
            "last_finishes": [
                { "timestamp": 1614729600.0, "map": "Tutorial" },
                { "timestamp": 1614643200.0, "map": "Kobra" }
            ],
            "types": {
                "Novice": {
                    "points": { "total": 100, "points": 9 },
                    "maps": {
                        "Kobra": { "points": 4, "total_finishes": 10, "first_finish": 1614643200.5 },
                        "Tutorial": { "points": 5, "first_finish": 1614729600 },
                        "Sunny Side Up": { "points": 2, "total_finishes": 0 }
                    }
                },
                "Brutal": { "maps": {} }
            }
        })
    }

    #[test]
    fn test_from_value_extracts_everything() {
        let doc = PlayerDocument::from_value(sample()).unwrap();
        assert_eq!(doc.player, "Randomium");
        assert_eq!(doc.reported_points, Some(9));
        assert_eq!(doc.first_activity, 1614556800);
        assert_eq!(doc.last_activity, 1614729600);
        assert_eq!(doc.categories, vec!["Brutal", "Novice"]);
        assert_eq!(doc.records.len(), 3);
        assert_eq!(doc.finished_count(), 2);
    }

    #[test]
    fn test_fractional_timestamp_is_truncated() {
        let doc = PlayerDocument::from_value(sample()).unwrap();
        let kobra = doc.records.iter().find(|r| r.map == "Kobra").unwrap();
        assert_eq!(kobra.first_finish, Some(1614643200));
        assert_eq!(kobra.points, 4);
    }

    #[test]
    fn test_unfinished_map_is_kept_without_timestamp() {
        let doc = PlayerDocument::from_value(sample()).unwrap();
        let unfinished = doc
            .records
            .iter()
            .find(|r| r.map == "Sunny Side Up")
            .unwrap();
        assert!(!unfinished.is_finished());
    }

    #[test]
    fn test_missing_types_is_malformed() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("types");
        let err = PlayerDocument::from_value(value).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(ref m) if m.contains("types")));
    }

    #[test]
    fn test_missing_first_finish_is_malformed() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("first_finish");
        let err = PlayerDocument::from_value(value).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(ref m) if m.contains("first_finish")));
    }

    #[test]
    fn test_empty_last_finishes_is_malformed() {
        let mut value = sample();
        value["last_finishes"] = json!([]);
        let err = PlayerDocument::from_value(value).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(ref m) if m.contains("last_finishes")));
    }

    #[test]
    fn test_map_without_points_is_malformed() {
        let mut value = sample();
        value["types"]["Novice"]["maps"]["Kobra"]
            .as_object_mut()
            .unwrap()
            .remove("points");
        let err = PlayerDocument::from_value(value).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(ref m) if m.contains("Kobra")));
    }

    #[test]
    fn test_category_without_maps_is_malformed() {
        let mut value = sample();
        value["types"]["Brutal"] = json!({ "points": {} });
        assert!(matches!(
            PlayerDocument::from_value(value),
            Err(ReportError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_unknown_player_response_is_malformed() {
        // The API answers `{}` for players it does not know.
        assert!(matches!(
            parse_document("{}"),
            Err(ReportError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(matches!(
            parse_document("<html>502</html>"),
            Err(ReportError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let mut value = sample();
        value["types"] = json!(5);
        assert!(matches!(
            PlayerDocument::from_value(value),
            Err(ReportError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_missing_player_and_points_are_tolerated() {
        let mut value = sample();
        let obj = value.as_object_mut().unwrap();
        obj.remove("player");
        obj.remove("points");
        let doc = PlayerDocument::from_value(value).unwrap();
        assert!(doc.player.is_empty());
        assert_eq!(doc.reported_points, None);
    }

    #[test]
    fn test_millisecond_activity_timestamp_is_malformed() {
        let mut value = sample();
        value["last_finishes"][0]["timestamp"] = json!(1614729600000.0);
        let err = PlayerDocument::from_value(value).unwrap_err();
        assert!(
            matches!(err, ReportError::MalformedInput(ref m) if m.contains("last_finishes[0]"))
        );
    }

    #[test]
    fn test_calendar_end_activity_timestamp_is_malformed() {
        let mut value = sample();
        value["first_finish"]["timestamp"] = json!(8210266833600.0_f64);
        value["last_finishes"][0]["timestamp"] = json!(8210266833600.0_f64);
        let err = PlayerDocument::from_value(value).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(ref m) if m.contains("first_finish")));
    }

    #[test]
    fn test_negative_activity_timestamp_is_malformed() {
        let mut value = sample();
        value["first_finish"]["timestamp"] = json!(-86400);
        let err = PlayerDocument::from_value(value).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(ref m) if m.contains("out of range")));
    }

    #[test]
    fn test_to_epoch_seconds_rejects_non_finite() {
        assert_eq!(to_epoch_seconds(f64::NAN), None);
        assert_eq!(to_epoch_seconds(f64::INFINITY), None);
        assert_eq!(to_epoch_seconds(1e300), None);
        assert_eq!(to_epoch_seconds(42.9), Some(42));
    }
}
