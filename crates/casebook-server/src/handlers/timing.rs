//! Cost and revenue timing handlers
//!
//! The parent reference is named after the kind: `cost_item_id` on the cost
//! routes, `revenue_item_id` on the revenue routes, both in the list query
//! and in the create body.

use super::{data, DataResponse};
use crate::error::{ApiError, ApiResult, OrNotFound};
use crate::extractors::ApiJson;
use crate::services::TimingService;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use casebook_core::{ItemKind, Timing, TimingPatch, TimingSchedule};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

type Service = State<Arc<TimingService>>;

pub fn routes<S>(service: Arc<TimingService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete))
        .with_state(service)
}

/// Schedule fields are listed inline. With arbitrary-precision numbers a
/// flattened struct cannot read `recurrence_interval_months`.
#[derive(Debug, Deserialize)]
pub struct CreateTimingRequest {
    cost_item_id: Option<String>,
    revenue_item_id: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    recurrence_interval_months: Option<i64>,
    notes: Option<String>,
}

impl CreateTimingRequest {
    fn parent(self, kind: ItemKind) -> (Option<String>, TimingSchedule) {
        let item_id = match kind {
            ItemKind::Cost => self.cost_item_id,
            ItemKind::Revenue => self.revenue_item_id,
        };
        let schedule = TimingSchedule {
            start_date: self.start_date,
            end_date: self.end_date,
            recurrence_interval_months: self.recurrence_interval_months,
            notes: self.notes,
        };
        (item_id, schedule)
    }
}

pub async fn list(
    State(service): Service,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<DataResponse<Vec<Timing>>>> {
    let item_id = query.get(service.kind().parent_key()).map(String::as_str);
    Ok(data(service.list(item_id).await?))
}

pub async fn get_one(
    State(service): Service,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Timing>>> {
    Ok(data(service.get(&id).await?.or_not_found()?))
}

pub async fn create(
    State(service): Service,
    ApiJson(request): ApiJson<CreateTimingRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Timing>>)> {
    let (item_id, schedule) = request.parent(service.kind());
    let timing = service.create(item_id, schedule).await?;
    Ok((StatusCode::CREATED, data(timing)))
}

pub async fn update(
    State(service): Service,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TimingPatch>,
) -> ApiResult<Json<DataResponse<Timing>>> {
    Ok(data(service.update(&id, patch).await?.or_not_found()?))
}

pub async fn delete(State(service): Service, Path(id): Path<String>) -> ApiResult<StatusCode> {
    if service.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_picks_parent_by_kind() {
        let request: CreateTimingRequest = serde_json::from_str(
            r#"{"cost_item_id": "i1", "start_date": "2025-01-01", "recurrence_interval_months": 3}"#,
        )
        .unwrap();
        let (item_id, schedule) = request.parent(ItemKind::Cost);
        assert_eq!(item_id.as_deref(), Some("i1"));
        assert_eq!(schedule.recurrence_interval_months, Some(3));
        assert_eq!(schedule.start_date.map(|d| d.to_string()).as_deref(), Some("2025-01-01"));

        let request: CreateTimingRequest =
            serde_json::from_str(r#"{"cost_item_id": "i1"}"#).unwrap();
        let (item_id, _) = request.parent(ItemKind::Revenue);
        assert_eq!(item_id, None);
    }

    #[test]
    fn test_create_request_reads_every_schedule_field() {
        let request: CreateTimingRequest = serde_json::from_str(
            r#"{"revenue_item_id": "r1", "start_date": "2025-01-01", "end_date": "2025-12-31",
                "recurrence_interval_months": 12, "notes": "annual"}"#,
        )
        .unwrap();
        let (item_id, schedule) = request.parent(ItemKind::Revenue);
        assert_eq!(item_id.as_deref(), Some("r1"));
        assert_eq!(schedule.recurrence_interval_months, Some(12));
        assert_eq!(schedule.end_date.map(|d| d.to_string()).as_deref(), Some("2025-12-31"));
        assert_eq!(schedule.notes.as_deref(), Some("annual"));
    }
}
