//! 采集与告警计数快照
//!
//! - GET /metrics

use api_contract::{ApiResponse, MetricsDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use vitals_telemetry::metrics;

use crate::{AppState, middleware::require_user_context};

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user_context(&state, &headers) {
        return response;
    }

    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsDto {
            messages_received: snapshot.messages_received,
            messages_ignored: snapshot.messages_ignored,
            readings_flushed: snapshot.readings_flushed,
            flush_failures: snapshot.flush_failures,
            alerts_fired: snapshot.alerts_fired,
            alerts_published: snapshot.alerts_published,
            alert_publish_failures: snapshot.alert_publish_failures,
            outbox_replayed: snapshot.outbox_replayed,
        })),
    )
        .into_response()
}
