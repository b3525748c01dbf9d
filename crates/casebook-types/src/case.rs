//! Business case types

use crate::Patch;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Case lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Active,
    #[default]
    Planning,
    Review,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 3] = [CaseStatus::Active, CaseStatus::Planning, CaseStatus::Review];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Planning => "Planning",
            Self::Review => "Review",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(Self::Active),
            "Planning" => Some(Self::Planning),
            "Review" => Some(Self::Review),
            _ => None,
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting cadence of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBasis {
    Monthly,
    Quarterly,
}

impl TimeBasis {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "Monthly" => Some(Self::Monthly),
            "Quarterly" => Some(Self::Quarterly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Months,
    Quarters,
}

impl DurationUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Months => "months",
            Self::Quarters => "quarters",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "months" => Some(Self::Months),
            "quarters" => Some(Self::Quarters),
            _ => None,
        }
    }
}

/// Business case, enriched with its client's name and tag names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCase {
    pub id: String,
    pub client_id: String,
    pub client_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: CaseStatus,
    pub category: Option<String>,
    pub time_basis: Option<TimeBasis>,
    /// Written as a JSON number, kept exact
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub duration_value: Option<Decimal>,
    pub duration_unit: Option<DurationUnit>,
    pub currency_code: Option<String>,
    /// Sorted by name
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry in the shared tag registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Case creation request, before validation.
///
/// Enumerated fields arrive as plain strings so that bad values produce a
/// validation message instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewCaseInput {
    pub client_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub time_basis: Option<String>,
    pub duration_value: Option<Decimal>,
    pub duration_unit: Option<String>,
    pub currency_code: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Validated case ready for storage. `tags` is already normalized.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub client_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: CaseStatus,
    pub category: Option<String>,
    pub time_basis: Option<TimeBasis>,
    pub duration_value: Option<Decimal>,
    pub duration_unit: Option<DurationUnit>,
    pub currency_code: Option<String>,
    pub tags: Vec<String>,
}

/// Case update request, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaseUpdateInput {
    pub client_id: Patch<String>,
    pub title: Patch<String>,
    pub description: Patch<Option<String>>,
    pub status: Patch<String>,
    pub category: Patch<Option<String>>,
    pub time_basis: Patch<Option<String>>,
    pub duration_value: Patch<Option<Decimal>>,
    pub duration_unit: Patch<Option<String>>,
    pub currency_code: Patch<Option<String>>,
    pub tags: Patch<Vec<String>>,
}

/// Validated partial case update. A set `tags` replaces every link.
#[derive(Debug, Clone, Default)]
pub struct CasePatch {
    pub client_id: Patch<String>,
    pub title: Patch<String>,
    pub description: Patch<Option<String>>,
    pub status: Patch<CaseStatus>,
    pub category: Patch<Option<String>>,
    pub time_basis: Patch<Option<TimeBasis>>,
    pub duration_value: Patch<Option<Decimal>>,
    pub duration_unit: Patch<Option<DurationUnit>>,
    pub currency_code: Patch<Option<String>>,
    pub tags: Patch<Vec<String>>,
}

impl CasePatch {
    pub fn is_empty(&self) -> bool {
        !(self.client_id.is_set()
            || self.title.is_set()
            || self.description.is_set()
            || self.status.is_set()
            || self.category.is_set()
            || self.time_basis.is_set()
            || self.duration_value.is_set()
            || self.duration_unit.is_set()
            || self.currency_code.is_set()
            || self.tags.is_set())
    }

    /// Apply the column fields to a stored record and hand back the tag
    /// replacement, which lives in a separate relation.
    pub fn apply_columns(self, case: &mut BusinessCase) -> Patch<Vec<String>> {
        self.client_id.apply(&mut case.client_id);
        self.title.apply(&mut case.title);
        self.description.apply(&mut case.description);
        self.status.apply(&mut case.status);
        self.category.apply(&mut case.category);
        self.time_basis.apply(&mut case.time_basis);
        self.duration_value.apply(&mut case.duration_value);
        self.duration_unit.apply(&mut case.duration_unit);
        self.currency_code.apply(&mut case.currency_code);
        self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in CaseStatus::ALL {
            assert_eq!(CaseStatus::from_db_value(status.as_str()), Some(status));
        }
        assert_eq!(CaseStatus::from_db_value("Done"), None);
        assert_eq!(CaseStatus::default(), CaseStatus::Planning);
    }

    #[test]
    fn test_update_input_keeps_absent_fields_unchanged() {
        let input: CaseUpdateInput =
            serde_json::from_str(r#"{"status": "Review", "category": null, "tags": []}"#).unwrap();
        assert_eq!(input.status, Patch::Set("Review".to_string()));
        assert_eq!(input.category, Patch::Set(None));
        assert_eq!(input.tags, Patch::Set(vec![]));
        assert_eq!(input.title, Patch::Unchanged);
        assert_eq!(input.description, Patch::Unchanged);
    }

    #[test]
    fn test_duration_value_accepts_fractions() {
        let input: NewCaseInput =
            serde_json::from_str(r#"{"client_id": "c1", "title": "Pilot", "duration_value": 1.5}"#)
                .unwrap();
        assert_eq!(input.duration_value, Some(Decimal::new(15, 1)));

        let update: CaseUpdateInput =
            serde_json::from_str(r#"{"duration_value": 2.25}"#).unwrap();
        assert_eq!(update.duration_value, Patch::Set(Some(Decimal::new(225, 2))));

        let cleared: CaseUpdateInput = serde_json::from_str(r#"{"duration_value": null}"#).unwrap();
        assert_eq!(cleared.duration_value, Patch::Set(None));
    }

    #[test]
    fn test_duration_value_serializes_as_number() {
        let now = Utc::now();
        let mut case = BusinessCase {
            id: "b1".to_string(),
            client_id: "c1".to_string(),
            client_name: Some("Acme".to_string()),
            title: "Pilot".to_string(),
            description: None,
            status: CaseStatus::Planning,
            category: None,
            time_basis: Some(TimeBasis::Monthly),
            duration_value: Some(Decimal::new(15, 1)),
            duration_unit: Some(DurationUnit::Months),
            currency_code: None,
            tags: vec![],
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&case).unwrap();
        assert_eq!(value["duration_value"], serde_json::json!(1.5));

        case.duration_value = None;
        let value = serde_json::to_value(&case).unwrap();
        assert_eq!(value["duration_value"], serde_json::Value::Null);
    }

    #[test]
    fn test_duration_unit_serializes_lowercase() {
        let json = serde_json::to_string(&DurationUnit::Quarters).unwrap();
        assert_eq!(json, r#""quarters""#);
    }
}
