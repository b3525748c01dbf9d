//! Input validation
//!
//! Turns raw request inputs into the validated shapes the storage traits
//! accept. Everything here runs before any storage access.

use crate::{CasebookError, Result};
use casebook_types::{
    CasePatch, CaseStatus, CaseUpdateInput, ClientPatch, Decimal, DurationUnit, ItemKind,
    LineItemPatch,
    NewCase, NewCaseInput, NewClient, NewClientInput, NewLineItem, NewLineItemInput, NewTiming,
    Patch, TimeBasis, TimingPatch, TimingSchedule,
};
use chrono::NaiveDate;

fn non_blank(field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(CasebookError::Validation(format!("{} must not be empty", field)));
    }
    Ok(value)
}

/// Trim names, drop empty ones and remove duplicates, keeping first-seen order
pub fn normalize_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || out.iter().any(|t| t == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

pub fn parse_status(value: &str) -> Result<CaseStatus> {
    CaseStatus::from_db_value(value).ok_or_else(|| {
        CasebookError::Validation(format!(
            "invalid status '{}': expected one of Active, Planning, Review",
            value
        ))
    })
}

pub fn parse_time_basis(value: &str) -> Result<TimeBasis> {
    TimeBasis::from_db_value(value).ok_or_else(|| {
        CasebookError::Validation(format!(
            "invalid time_basis '{}': expected Monthly or Quarterly",
            value
        ))
    })
}

pub fn parse_duration_unit(value: &str) -> Result<DurationUnit> {
    DurationUnit::from_db_value(value).ok_or_else(|| {
        CasebookError::Validation(format!(
            "invalid duration_unit '{}': expected months or quarters",
            value
        ))
    })
}

fn check_duration_value(value: Option<Decimal>) -> Result<Option<Decimal>> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(CasebookError::Validation(
            "duration_value must not be negative".to_string(),
        )),
        other => Ok(other),
    }
}

fn check_recurrence(value: Option<i64>) -> Result<Option<i64>> {
    match value {
        Some(v) if v <= 0 => Err(CasebookError::Validation(
            "recurrence_interval_months must be a positive integer".to_string(),
        )),
        other => Ok(other),
    }
}

/// Reject a schedule whose start falls after its end. Either side may be open.
pub fn check_date_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(CasebookError::Validation(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
    }
    Ok(())
}

pub fn new_client(input: NewClientInput) -> Result<NewClient> {
    match input.name {
        Some(name) if !name.trim().is_empty() => Ok(NewClient {
            name,
            notes: input.notes,
        }),
        _ => Err(CasebookError::Validation("name is required".to_string())),
    }
}

pub fn client_patch(patch: ClientPatch) -> Result<ClientPatch> {
    Ok(ClientPatch {
        name: patch.name.try_map(|n| non_blank("name", n))?,
        notes: patch.notes,
    })
}

pub fn new_case(input: NewCaseInput) -> Result<NewCase> {
    let (client_id, title) = match (input.client_id, input.title) {
        (Some(client_id), Some(title))
            if !client_id.trim().is_empty() && !title.trim().is_empty() =>
        {
            (client_id, title)
        }
        _ => {
            return Err(CasebookError::Validation(
                "client_id and title are required".to_string(),
            ))
        }
    };

    Ok(NewCase {
        client_id,
        title,
        description: input.description,
        status: input
            .status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default(),
        category: input.category,
        time_basis: input.time_basis.as_deref().map(parse_time_basis).transpose()?,
        duration_value: check_duration_value(input.duration_value)?,
        duration_unit: input
            .duration_unit
            .as_deref()
            .map(parse_duration_unit)
            .transpose()?,
        currency_code: input.currency_code,
        tags: normalize_tags(input.tags.unwrap_or_default()),
    })
}

pub fn case_patch(input: CaseUpdateInput) -> Result<CasePatch> {
    Ok(CasePatch {
        client_id: input.client_id.try_map(|id| non_blank("client_id", id))?,
        title: input.title.try_map(|t| non_blank("title", t))?,
        description: input.description,
        status: input.status.try_map(|s| parse_status(&s))?,
        category: input.category,
        time_basis: input
            .time_basis
            .try_map(|tb| tb.as_deref().map(parse_time_basis).transpose())?,
        duration_value: input.duration_value.try_map(check_duration_value)?,
        duration_unit: input
            .duration_unit
            .try_map(|du| du.as_deref().map(parse_duration_unit).transpose())?,
        currency_code: input.currency_code,
        tags: input.tags.map(normalize_tags),
    })
}

pub fn new_item(input: NewLineItemInput) -> Result<NewLineItem> {
    match (input.case_id, input.name, input.amount) {
        (Some(case_id), Some(name), Some(amount))
            if !case_id.trim().is_empty() && !name.trim().is_empty() =>
        {
            Ok(NewLineItem {
                case_id,
                name,
                category: input.category,
                amount,
                notes: input.notes,
            })
        }
        _ => Err(CasebookError::Validation(
            "case_id, name, and amount are required".to_string(),
        )),
    }
}

pub fn item_patch(patch: LineItemPatch) -> Result<LineItemPatch> {
    Ok(LineItemPatch {
        case_id: patch.case_id.try_map(|id| non_blank("case_id", id))?,
        name: patch.name.try_map(|n| non_blank("name", n))?,
        category: patch.category,
        amount: patch.amount,
        notes: patch.notes,
    })
}

pub fn new_timing(
    kind: ItemKind,
    item_id: Option<String>,
    schedule: TimingSchedule,
) -> Result<NewTiming> {
    let item_id = match item_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            return Err(CasebookError::Validation(format!(
                "{} is required",
                kind.parent_key()
            )))
        }
    };
    check_recurrence(schedule.recurrence_interval_months)?;
    check_date_order(schedule.start_date, schedule.end_date)?;
    Ok(NewTiming { item_id, schedule })
}

/// Checks what can be judged without the stored record. The date order of
/// the merged result is checked by the store.
pub fn timing_patch(patch: TimingPatch) -> Result<TimingPatch> {
    if let Patch::Set(value) = &patch.recurrence_interval_months {
        check_recurrence(*value)?;
    }
    if let (Patch::Set(start), Patch::Set(end)) = (&patch.start_date, &patch.end_date) {
        check_date_order(*start, *end)?;
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn validation_message<T: std::fmt::Debug>(result: Result<T>) -> String {
        match result {
            Err(CasebookError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_tags_trims_and_dedups() {
        let tags = normalize_tags(vec![
            "a".to_string(),
            "a".to_string(),
            " b ".to_string(),
            "   ".to_string(),
            "B".to_string(),
        ]);
        assert_eq!(tags, vec!["a", "b", "B"]);
    }

    #[test]
    fn test_new_case_requires_client_and_title() {
        let msg = validation_message(new_case(NewCaseInput {
            title: Some("Migration".to_string()),
            ..Default::default()
        }));
        assert_eq!(msg, "client_id and title are required");
    }

    #[test]
    fn test_new_case_defaults_to_planning() {
        let case = new_case(NewCaseInput {
            client_id: Some("c1".to_string()),
            title: Some("Migration".to_string()),
            tags: Some(vec!["infra".to_string(), " infra".to_string()]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(case.status, CaseStatus::Planning);
        assert_eq!(case.tags, vec!["infra"]);
    }

    #[test]
    fn test_invalid_enums_rejected() {
        let msg = validation_message(case_patch(CaseUpdateInput {
            status: Patch::Set("Done".to_string()),
            ..Default::default()
        }));
        assert!(msg.contains("Done"));

        assert_err!(new_case(NewCaseInput {
            client_id: Some("c1".to_string()),
            title: Some("t".to_string()),
            duration_unit: Some("weeks".to_string()),
            ..Default::default()
        }));

        let patch = case_patch(CaseUpdateInput {
            time_basis: Patch::Set(None),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.time_basis, Patch::Set(None));
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert_err!(new_case(NewCaseInput {
            client_id: Some("c1".to_string()),
            title: Some("t".to_string()),
            duration_value: Some(Decimal::NEGATIVE_ONE),
            ..Default::default()
        }));
        assert_err!(case_patch(CaseUpdateInput {
            duration_value: Patch::Set(Some(Decimal::new(-5, 1))),
            ..Default::default()
        }));
    }

    #[test]
    fn test_fractional_and_zero_duration_accepted() {
        let case = assert_ok!(new_case(NewCaseInput {
            client_id: Some("c1".to_string()),
            title: Some("t".to_string()),
            duration_value: Some(Decimal::new(15, 1)),
            ..Default::default()
        }));
        assert_eq!(case.duration_value, Some(Decimal::new(15, 1)));

        let patch = assert_ok!(case_patch(CaseUpdateInput {
            duration_value: Patch::Set(Some(Decimal::ZERO)),
            ..Default::default()
        }));
        assert_eq!(patch.duration_value, Patch::Set(Some(Decimal::ZERO)));
    }

    #[test]
    fn test_new_item_requires_fields() {
        let msg = validation_message(new_item(NewLineItemInput {
            case_id: Some("c1".to_string()),
            name: Some("Licences".to_string()),
            ..Default::default()
        }));
        assert_eq!(msg, "case_id, name, and amount are required");

        let item = new_item(NewLineItemInput {
            case_id: Some("c1".to_string()),
            name: Some("Licences".to_string()),
            amount: Some(Decimal::new(1999, 2)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(item.amount.to_string(), "19.99");
    }

    #[test]
    fn test_timing_validation() {
        let msg = validation_message(new_timing(ItemKind::Revenue, None, TimingSchedule::default()));
        assert_eq!(msg, "revenue_item_id is required");

        let reversed = TimingSchedule {
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        assert_err!(new_timing(ItemKind::Cost, Some("i1".to_string()), reversed));

        let zero = TimingSchedule {
            recurrence_interval_months: Some(0),
            ..Default::default()
        };
        assert_err!(new_timing(ItemKind::Cost, Some("i1".to_string()), zero));

        let open_ended = TimingSchedule {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        assert_ok!(new_timing(ItemKind::Cost, Some("i1".to_string()), open_ended));
    }
}
