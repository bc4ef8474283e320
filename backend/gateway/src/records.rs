//! REST access to the aggregate records.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use shelfcount_core::{AggregateRecord, Observation, RecordUpdate, ShelfError};
use shelfcount_store::TallyStore;

use crate::error::{ApiError, ApiResult};
use crate::server::GatewayState;

fn record_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

fn body<T>(json: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    json.map(|Json(v)| v)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// `GET /api/records`
pub async fn list_records(State(state): State<GatewayState>) -> ApiResult<Json<Vec<AggregateRecord>>> {
    let records = state.pipeline.store().get_all().await.map_err(ShelfError::from)?;
    Ok(Json(records))
}

/// `POST /api/records`: merge a manual observation, same as an upload would.
pub async fn create_record(
    State(state): State<GatewayState>,
    json: Result<Json<Observation>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AggregateRecord>)> {
    let observation = body(json)?;
    let record = state.pipeline.observe(&observation).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/records/:id`
pub async fn get_record(
    State(state): State<GatewayState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<AggregateRecord>> {
    let id = record_id(path)?;
    let record = state.pipeline.store().get(id).await.map_err(ShelfError::from)?;
    Ok(Json(record))
}

/// `PUT /api/records/:id`: overwrite count and/or name.
pub async fn update_record(
    State(state): State<GatewayState>,
    path: Result<Path<i64>, PathRejection>,
    json: Result<Json<RecordUpdate>, JsonRejection>,
) -> ApiResult<Json<AggregateRecord>> {
    let id = record_id(path)?;
    let update = body(json)?;
    let record = state
        .pipeline
        .store()
        .update(id, update)
        .await
        .map_err(ShelfError::from)?;
    Ok(Json(record))
}

/// `DELETE /api/records/:id`
pub async fn delete_record(
    State(state): State<GatewayState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = record_id(path)?;
    state.pipeline.store().delete(id).await.map_err(ShelfError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
