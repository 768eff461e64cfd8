//! 读数查询
//!
//! - GET /readings?limit=N（默认 100，最大 1000，按插入顺序倒序）
//! - GET /readings/latest

use crate::AppState;
use crate::middleware::require_user_context;
use crate::utils::response::{bad_request_error, reading_to_dto, storage_error};
use api_contract::{ApiResponse, ReadingDto, ReadingsQuery};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use vitals_storage::MAX_LIST_LIMIT;

const DEFAULT_READINGS_LIMIT: i64 = 100;

pub async fn list_readings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReadingsQuery>,
) -> Response {
    if let Err(response) = require_user_context(&state, &headers) {
        return response;
    }
    let limit = query.limit.unwrap_or(DEFAULT_READINGS_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return bad_request_error(format!("limit must be between 1 and {MAX_LIST_LIMIT}"));
    }
    match state.reading_store.recent_readings(limit).await {
        Ok(items) => {
            let data: Vec<ReadingDto> = items.into_iter().map(reading_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 最新读数；尚无读数时 data 为 null。
pub async fn get_latest_reading(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user_context(&state, &headers) {
        return response;
    }
    match state.reading_store.latest_reading().await {
        Ok(item) => (
            StatusCode::OK,
            Json(ApiResponse::success(item.map(reading_to_dto))),
        )
            .into_response(),
        Err(err) => storage_error(err),
    }
}
