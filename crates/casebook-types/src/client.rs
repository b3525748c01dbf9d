//! Client types

use crate::Patch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organisation that owns business cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client creation request, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewClientInput {
    pub name: Option<String>,
    pub notes: Option<String>,
}

/// Validated client ready for storage
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub notes: Option<String>,
}

/// Partial client update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientPatch {
    pub name: Patch<String>,
    pub notes: Patch<Option<String>>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        !self.name.is_set() && !self.notes.is_set()
    }

    /// Apply to a stored record. Returns whether any field was written.
    pub fn apply_to(self, client: &mut Client) -> bool {
        let mut changed = self.name.apply(&mut client.name);
        changed |= self.notes.apply(&mut client.notes);
        changed
    }
}
