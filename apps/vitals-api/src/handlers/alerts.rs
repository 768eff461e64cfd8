//! 告警规则管理
//!
//! - GET /alerts
//! - POST /alerts {time: "HH:MM", message}
//! - DELETE /alerts/:id
//!
//! 规则只触发一次；`triggered` 由调度器翻转，接口不提供修改。

use crate::AppState;
use crate::middleware::require_user_context;
use crate::utils::response::{
    alert_rule_to_dto, bad_request_error, not_found_error, storage_error,
};
use crate::utils::validation::normalize_required;
use api_contract::{AlertRuleDto, ApiResponse, CreateAlertRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;
use vitals_alerting::parse_alert_time;

pub async fn list_alerts(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user_context(&state, &headers) {
        return response;
    }
    match state.alert_store.list_alert_rules().await {
        Ok(items) => {
            let data: Vec<AlertRuleDto> = items.into_iter().map(alert_rule_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

pub async fn create_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAlertRequest>,
) -> Response {
    if let Err(response) = require_user_context(&state, &headers) {
        return response;
    }
    let Ok(time) = parse_alert_time(&req.time) else {
        return bad_request_error("time must be HH:MM");
    };
    let message = match normalize_required(req.message, "message") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.alert_store.insert_alert_rule(&time, &message).await {
        Ok(record) => {
            info!(target: "vitals.alerting", rule_id = record.id, time = %record.time, "alert_rule_created");
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(alert_rule_to_dto(record))),
            )
                .into_response()
        }
        Err(err) => storage_error(err),
    }
}

pub async fn delete_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = require_user_context(&state, &headers) {
        return response;
    }
    match state.alert_store.delete_alert_rule(id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "deleted": id }))),
        )
            .into_response(),
        Ok(false) => not_found_error(),
        Err(err) => storage_error(err),
    }
}
