//! Cost and revenue item handlers
//!
//! One set of handlers serves both kinds; each kind's router carries its own
//! `ItemService` as state.

use super::{data, DataResponse};
use crate::error::{ApiError, ApiResult, OrNotFound};
use crate::extractors::ApiJson;
use crate::services::ItemService;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use casebook_core::{LineItem, LineItemPatch, NewLineItemInput};
use serde::Deserialize;
use std::sync::Arc;

type Service = State<Arc<ItemService>>;

/// `/` and `/:id` for one item kind
pub fn routes<S>(service: Arc<ItemService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    case_id: Option<String>,
}

pub async fn list(
    State(service): Service,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Json<DataResponse<Vec<LineItem>>>> {
    Ok(data(service.list(query.case_id.as_deref()).await?))
}

pub async fn get_one(
    State(service): Service,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<LineItem>>> {
    Ok(data(service.get(&id).await?.or_not_found()?))
}

pub async fn create(
    State(service): Service,
    ApiJson(input): ApiJson<NewLineItemInput>,
) -> ApiResult<(StatusCode, Json<DataResponse<LineItem>>)> {
    let item = service.create(input).await?;
    Ok((StatusCode::CREATED, data(item)))
}

pub async fn update(
    State(service): Service,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<LineItemPatch>,
) -> ApiResult<Json<DataResponse<LineItem>>> {
    Ok(data(service.update(&id, patch).await?.or_not_found()?))
}

pub async fn delete(State(service): Service, Path(id): Path<String>) -> ApiResult<StatusCode> {
    if service.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
