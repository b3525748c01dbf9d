//! Timing schedules attached to line items

use crate::{ItemKind, Patch};
use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Optional schedule for a single cost or revenue item.
///
/// Serializes the parent reference under `cost_item_id` or
/// `revenue_item_id` depending on `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    pub id: String,
    pub kind: ItemKind,
    pub item_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub recurrence_interval_months: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Serialize for Timing {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(8))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry(self.kind.parent_key(), &self.item_id)?;
        map.serialize_entry("start_date", &self.start_date)?;
        map.serialize_entry("end_date", &self.end_date)?;
        map.serialize_entry("recurrence_interval_months", &self.recurrence_interval_months)?;
        map.serialize_entry("notes", &self.notes)?;
        map.serialize_entry("created_at", &self.created_at)?;
        map.serialize_entry("updated_at", &self.updated_at)?;
        map.end()
    }
}

/// Schedule fields shared by create requests of both kinds
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingSchedule {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub recurrence_interval_months: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTiming {
    pub item_id: String,
    pub schedule: TimingSchedule,
}

/// Partial timing update. The parent item cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimingPatch {
    pub start_date: Patch<Option<NaiveDate>>,
    pub end_date: Patch<Option<NaiveDate>>,
    pub recurrence_interval_months: Patch<Option<i64>>,
    pub notes: Patch<Option<String>>,
}

impl TimingPatch {
    pub fn is_empty(&self) -> bool {
        !(self.start_date.is_set()
            || self.end_date.is_set()
            || self.recurrence_interval_months.is_set()
            || self.notes.is_set())
    }

    pub fn apply_to(self, timing: &mut Timing) -> bool {
        let mut changed = self.start_date.apply(&mut timing.start_date);
        changed |= self.end_date.apply(&mut timing.end_date);
        changed |= self
            .recurrence_interval_months
            .apply(&mut timing.recurrence_interval_months);
        changed |= self.notes.apply(&mut timing.notes);
        changed
    }
}
