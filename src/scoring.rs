//! Criticality scoring.
//!
//! Turns raw query rows into [`ScoredRecord`]s. The score multiplies a
//! weighted dependency term by a weighted age term and scales the product
//! down by 10, in integer arithmetic:
//!
//! ```text
//! score = ((dependencies * w_dep) * (days * w_age)) / 10
//! ```
//!
//! The operation order matters because every step truncates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const MIN_WEIGHT: i64 = 0;
pub const MAX_WEIGHT: i64 = 10;

/// Divisor applied to the weighted product.
const SCORE_SCALE: i64 = 10;

/// Relative importance of asset age and dependency count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weights {
    pub age_in_days: i64,
    pub dependencies: i64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            age_in_days: 10,
            dependencies: 10,
        }
    }
}

impl Weights {
    /// Both weights must lie in `[0, 10]`.
    pub fn is_valid(&self) -> bool {
        let range = MIN_WEIGHT..=MAX_WEIGHT;
        range.contains(&self.age_in_days) && range.contains(&self.dependencies)
    }
}

/// Absent weights are never valid.
pub fn weights_are_valid(weights: Option<&Weights>) -> bool {
    weights.is_some_and(Weights::is_valid)
}

/// Graph class of an asset. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetClass {
    Single(String),
    Many(Vec<String>),
    Other(Value),
}

impl Default for AssetClass {
    fn default() -> Self {
        AssetClass::Other(Value::Null)
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Single(class) => write!(f, "{class}"),
            AssetClass::Many(classes) => write!(f, "{}", classes.join(", ")),
            AssetClass::Other(Value::Null) => write!(f, "-"),
            AssetClass::Other(value) => write!(f, "{value}"),
        }
    }
}

/// One row of the per-asset-type query, keyed by the query's return clause.
///
/// `null` and missing fields take their zero value; type mismatches fail.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResultRow {
    #[serde(rename = "asset._id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(
        rename = "asset.displayName",
        default,
        deserialize_with = "null_as_default"
    )]
    pub display_name: String,
    #[serde(rename = "asset._class", default)]
    pub class: AssetClass,
    #[serde(
        rename = "asset._createdOn",
        default,
        deserialize_with = "null_as_default"
    )]
    pub created_on: String,
    #[serde(rename = "deps", default, deserialize_with = "null_as_default")]
    pub dependency_count: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A row that passed validation, with its derived age and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "assetName")]
    pub display_name: String,
    #[serde(rename = "assetClass")]
    pub class: AssetClass,
    #[serde(rename = "dependencies")]
    pub dependency_count: i64,
    #[serde(rename = "ageInDays")]
    pub age_in_days: i64,
    #[serde(rename = "criticalityScore")]
    pub criticality_score: i64,
}

/// Why a raw row was left out of the results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("row does not decode: {0}")]
    Decode(String),

    #[error("row has no identifier")]
    MissingId,

    #[error("unparseable creation timestamp {0:?}")]
    BadTimestamp(String),
}

/// Whole days elapsed since `created_on`, truncated. Future timestamps count as 0.
pub fn days_since(created_on: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - created_on).num_hours() / 24).max(0)
}

pub fn criticality_score(dependency_count: i64, days_since: i64, weights: &Weights) -> i64 {
    let dependency_term = dependency_count.saturating_mul(weights.dependencies);
    let age_term = days_since.saturating_mul(weights.age_in_days);
    dependency_term.saturating_mul(age_term) / SCORE_SCALE
}

fn parse_created_on(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decodes, validates and scores one raw query row.
pub fn score_row(
    raw: &Value,
    weights: &Weights,
    now: DateTime<Utc>,
) -> Result<ScoredRecord, RowRejection> {
    let row =
        QueryResultRow::deserialize(raw).map_err(|e| RowRejection::Decode(e.to_string()))?;

    // Without an id the score cannot be written back.
    if row.id.is_empty() {
        return Err(RowRejection::MissingId);
    }

    let created_on = parse_created_on(&row.created_on)
        .ok_or_else(|| RowRejection::BadTimestamp(row.created_on.clone()))?;
    let age_in_days = days_since(created_on, now);

    Ok(ScoredRecord {
        criticality_score: criticality_score(row.dependency_count, age_in_days, weights),
        id: row.id,
        display_name: row.display_name,
        class: row.class,
        dependency_count: row.dependency_count,
        age_in_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn weights(age_in_days: i64, dependencies: i64) -> Weights {
        Weights {
            age_in_days,
            dependencies,
        }
    }

    #[test]
    fn weights_boundaries() {
        assert!(weights(0, 0).is_valid());
        assert!(weights(10, 10).is_valid());
        assert!(weights(0, 10).is_valid());
        assert!(!weights(-1, 5).is_valid());
        assert!(!weights(5, -1).is_valid());
        assert!(!weights(11, 5).is_valid());
        assert!(!weights(5, 11).is_valid());
    }

    #[test]
    fn every_in_range_pair_is_valid() {
        for age in MIN_WEIGHT..=MAX_WEIGHT {
            for deps in MIN_WEIGHT..=MAX_WEIGHT {
                assert!(weights_are_valid(Some(&weights(age, deps))));
            }
        }
    }

    #[test]
    fn absent_weights_are_invalid() {
        assert!(!weights_are_valid(None));
    }

    #[test]
    fn score_example_from_documentation() {
        assert_eq!(criticality_score(4, 30, &weights(10, 10)), 1200);
    }

    #[test]
    fn zero_weight_zeroes_score() {
        for (deps, days) in [(0, 0), (1, 1), (50, 365), (1000, 9000)] {
            assert_eq!(criticality_score(deps, days, &weights(0, 10)), 0);
            assert_eq!(criticality_score(deps, days, &weights(10, 0)), 0);
        }
    }

    #[test]
    fn score_truncates_after_full_product() {
        // (3*3) * (1*1) = 9, 9 / 10 truncates to 0.
        assert_eq!(criticality_score(3, 1, &weights(1, 3)), 0);
        // (7*1) * (3*1) = 21 -> 2; scaling each term first would give 0.
        assert_eq!(criticality_score(7, 3, &weights(1, 1)), 2);
    }

    #[test]
    fn score_saturates_instead_of_wrapping() {
        assert_eq!(
            criticality_score(i64::MAX, i64::MAX, &weights(10, 10)),
            i64::MAX / 10
        );
    }

    #[test]
    fn days_since_truncates_partial_days() {
        let created = now() - Duration::hours(47);
        assert_eq!(days_since(created, now()), 1);
        let created = now() - Duration::hours(48);
        assert_eq!(days_since(created, now()), 2);
    }

    #[test]
    fn days_since_future_timestamp_is_zero() {
        let created = now() + Duration::days(3);
        assert_eq!(days_since(created, now()), 0);
    }

    #[test]
    fn score_row_happy_path() {
        let raw = json!({
            "asset._id": "dev-1",
            "asset.displayName": "laptop",
            "asset._class": "Device",
            "asset._createdOn": "2024-05-02T12:00:00Z",
            "deps": 4
        });
        let record = score_row(&raw, &weights(10, 10), now()).unwrap();
        assert_eq!(record.id, "dev-1");
        assert_eq!(record.display_name, "laptop");
        assert_eq!(record.class, AssetClass::Single("Device".into()));
        assert_eq!(record.age_in_days, 30);
        assert_eq!(record.dependency_count, 4);
        assert_eq!(record.criticality_score, 1200);
    }

    #[test]
    fn score_row_accepts_offsets_and_fractional_seconds() {
        let raw = json!({
            "asset._id": "dev-2",
            "asset._createdOn": "2024-05-31T13:00:00.123+02:00",
            "deps": 1
        });
        let record = score_row(&raw, &weights(10, 10), now()).unwrap();
        assert_eq!(record.age_in_days, 1);
    }

    #[test]
    fn score_row_drops_missing_id() {
        let raw = json!({
            "asset.displayName": "orphan",
            "asset._createdOn": "2024-05-02T12:00:00Z",
            "deps": 4
        });
        assert_eq!(
            score_row(&raw, &weights(10, 10), now()),
            Err(RowRejection::MissingId)
        );

        let raw = json!({"asset._id": null, "asset._createdOn": "2024-05-02T12:00:00Z"});
        assert_eq!(
            score_row(&raw, &weights(10, 10), now()),
            Err(RowRejection::MissingId)
        );
    }

    #[test]
    fn score_row_drops_bad_timestamp() {
        let raw = json!({"asset._id": "x", "asset._createdOn": "yesterday", "deps": 1});
        assert_eq!(
            score_row(&raw, &weights(10, 10), now()),
            Err(RowRejection::BadTimestamp("yesterday".into()))
        );
    }

    #[test]
    fn score_row_drops_type_mismatch() {
        let raw = json!({"asset._id": "x", "asset._createdOn": "2024-05-02T12:00:00Z", "deps": "many"});
        assert!(matches!(
            score_row(&raw, &weights(10, 10), now()),
            Err(RowRejection::Decode(_))
        ));

        let raw = json!("not an object");
        assert!(matches!(
            score_row(&raw, &weights(10, 10), now()),
            Err(RowRejection::Decode(_))
        ));
    }

    #[test]
    fn asset_class_shapes_pass_through() {
        let many: AssetClass = serde_json::from_value(json!(["Device", "Host"])).unwrap();
        assert_eq!(many, AssetClass::Many(vec!["Device".into(), "Host".into()]));
        assert_eq!(many.to_string(), "Device, Host");

        let odd: AssetClass = serde_json::from_value(json!({"k": 1})).unwrap();
        assert_eq!(serde_json::to_value(&odd).unwrap(), json!({"k": 1}));
    }

    #[test]
    fn scored_record_serializes_with_output_names() {
        let record = ScoredRecord {
            id: "a".into(),
            display_name: "b".into(),
            class: AssetClass::Single("CodeRepo".into()),
            dependency_count: 2,
            age_in_days: 3,
            criticality_score: 1,
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "_id": "a",
                "assetName": "b",
                "assetClass": "CodeRepo",
                "dependencies": 2,
                "ageInDays": 3,
                "criticalityScore": 1
            })
        );
    }
}
