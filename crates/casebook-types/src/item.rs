//! Cost and revenue line items
//!
//! Both kinds share one record shape; `ItemKind` says which collection a
//! record belongs to.

use crate::Patch;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Cost,
    Revenue,
}

impl ItemKind {
    /// JSON key a timing record uses to point at its parent item
    pub fn parent_key(self) -> &'static str {
        match self {
            Self::Cost => "cost_item_id",
            Self::Revenue => "revenue_item_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cost => "cost item",
            Self::Revenue => "revenue item",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Monetary line entry belonging to a case.
///
/// `amount` serializes as a decimal string ("19.99"), never a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub case_id: String,
    pub name: String,
    pub category: Option<String>,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub type CostItem = LineItem;
pub type RevenueItem = LineItem;

/// Item creation request, before validation.
///
/// `amount` accepts a JSON number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewLineItemInput {
    pub case_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub case_id: String,
    pub name: String,
    pub category: Option<String>,
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// Partial item update. Setting `case_id` moves the item to another case.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineItemPatch {
    pub case_id: Patch<String>,
    pub name: Patch<String>,
    pub category: Patch<Option<String>>,
    pub amount: Patch<Decimal>,
    pub notes: Patch<Option<String>>,
}

impl LineItemPatch {
    pub fn is_empty(&self) -> bool {
        !(self.case_id.is_set()
            || self.name.is_set()
            || self.category.is_set()
            || self.amount.is_set()
            || self.notes.is_set())
    }

    pub fn apply_to(self, item: &mut LineItem) -> bool {
        let mut changed = self.case_id.apply(&mut item.case_id);
        changed |= self.name.apply(&mut item.name);
        changed |= self.category.apply(&mut item.category);
        changed |= self.amount.apply(&mut item.amount);
        changed |= self.notes.apply(&mut item.notes);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_amount_accepts_number_and_string() {
        let input: NewLineItemInput =
            serde_json::from_str(r#"{"case_id": "c1", "name": "Licences", "amount": 19.99}"#)
                .unwrap();
        assert_eq!(input.amount, Some(Decimal::from_str("19.99").unwrap()));

        let input: NewLineItemInput =
            serde_json::from_str(r#"{"amount": "1250.50"}"#).unwrap();
        assert_eq!(input.amount.map(|a| a.to_string()), Some("1250.50".to_string()));
    }

    #[test]
    fn test_long_amount_number_is_not_rounded() {
        let input: NewLineItemInput =
            serde_json::from_str(r#"{"case_id": "c1", "name": "Fleet", "amount": 1234567890123.4567}"#)
                .unwrap();
        assert_eq!(
            input.amount.map(|a| a.to_string()).as_deref(),
            Some("1234567890123.4567")
        );

        let patch: LineItemPatch =
            serde_json::from_str(r#"{"amount": 9876543210987.6543}"#).unwrap();
        assert_eq!(
            patch.amount.map(|a| a.to_string()),
            Patch::Set("9876543210987.6543".to_string())
        );
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let now = Utc::now();
        let item = LineItem {
            id: "i1".to_string(),
            case_id: "c1".to_string(),
            name: "Licences".to_string(),
            category: None,
            amount: Decimal::from_str("19.99").unwrap(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["amount"], serde_json::json!("19.99"));
    }
}
