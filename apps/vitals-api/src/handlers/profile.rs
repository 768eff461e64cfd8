//! 用户资料
//!
//! - GET /profile

use crate::AppState;
use crate::middleware::require_user_context;
use crate::utils::response::{not_found_error, profile_to_dto, storage_error};
use api_contract::ApiResponse;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

pub async fn get_profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.user_store.find_by_id(ctx.user_id).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ApiResponse::success(profile_to_dto(user))),
        )
            .into_response(),
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}
