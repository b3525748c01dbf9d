//! Client handlers

use super::{data, DataResponse};
use crate::error::{ApiError, ApiResult, OrNotFound};
use crate::extractors::ApiJson;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use casebook_core::{Client, ClientPatch, NewClientInput};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<DataResponse<Vec<Client>>>> {
    Ok(data(state.clients.list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Client>>> {
    Ok(data(state.clients.get(&id).await?.or_not_found()?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewClientInput>,
) -> ApiResult<(StatusCode, Json<DataResponse<Client>>)> {
    let client = state.clients.create(input).await?;
    Ok((StatusCode::CREATED, data(client)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ClientPatch>,
) -> ApiResult<Json<DataResponse<Client>>> {
    Ok(data(state.clients.update(&id, patch).await?.or_not_found()?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.clients.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
