//! 仪表盘数据
//!
//! - GET /dashboard-data
//!
//! 返回最新一条读数，并结合用户资料调用风险评分。评分进程失败或尚无读数时
//! 返回不带评分结果的数据，而不是整体报错。

use crate::AppState;
use crate::middleware::require_user_context;
use crate::utils::response::{not_found_error, storage_error};
use api_contract::{ApiResponse, DashboardDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;
use vitals_scoring::RiskFeatures;

pub async fn get_dashboard_data(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let user = match state.user_store.find_by_id(ctx.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return not_found_error(),
        Err(err) => return storage_error(err),
    };
    let latest = match state.reading_store.latest_reading().await {
        Ok(latest) => latest,
        Err(err) => return storage_error(err),
    };

    let mut dto = DashboardDto {
        heartsensor: None,
        bp: None,
        chol: (user.cholesterol != 0).then_some(user.cholesterol),
        alert_prediction: None,
        advisory: None,
    };
    if let Some(reading) = latest {
        let features = RiskFeatures::new(
            user.age,
            &user.gender,
            user.cholesterol,
            user.chest_pain_type.as_deref(),
            reading.bp.as_deref().unwrap_or_default(),
            reading.heartsensor.as_deref().unwrap_or_default(),
        );
        match state.scorer.score(&features).await {
            Ok(prediction) => {
                dto.alert_prediction = Some(prediction.alert_prediction);
                dto.advisory = prediction.advisory().map(str::to_string);
            }
            Err(err) => {
                warn!(target: "vitals.scoring", user_id = ctx.user_id, error = %err, "scorer_failed");
            }
        }
        dto.heartsensor = reading.heartsensor;
        dto.bp = reading.bp;
    }
    (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
}
