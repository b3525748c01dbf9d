//! HTTP handlers

pub mod cases;
pub mod clients;
pub mod health;
pub mod items;
pub mod timing;

pub use health::health;

use axum::Json;
use serde::Serialize;

/// Success envelope: `{ "data": ... }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

pub fn data<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse { data })
}
