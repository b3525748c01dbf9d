//! Business case handlers

use super::{data, DataResponse};
use crate::error::{ApiError, ApiResult, OrNotFound};
use crate::extractors::ApiJson;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use casebook_core::{BusinessCase, CaseUpdateInput, NewCaseInput};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CaseListQuery {
    client_id: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CaseListQuery>,
) -> ApiResult<Json<DataResponse<Vec<BusinessCase>>>> {
    Ok(data(state.cases.list(query.client_id.as_deref()).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<BusinessCase>>> {
    Ok(data(state.cases.get(&id).await?.or_not_found()?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCaseInput>,
) -> ApiResult<(StatusCode, Json<DataResponse<BusinessCase>>)> {
    let case = state.cases.create(input).await?;
    Ok((StatusCode::CREATED, data(case)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CaseUpdateInput>,
) -> ApiResult<Json<DataResponse<BusinessCase>>> {
    Ok(data(state.cases.update(&id, input).await?.or_not_found()?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.cases.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
