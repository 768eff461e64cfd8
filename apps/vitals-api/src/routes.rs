//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 健康检查：/health
//! - 认证接口：/signup, /login, /refresh-token, /logout
//! - 用户：/profile, /pairing
//! - 数据：/dashboard-data, /readings, /readings/latest
//! - 告警：/alerts, /alerts/:id
//! - 运行指标：/metrics

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .route("/profile", get(get_profile))
        .route("/pairing", post(pair_bridge))
        .route("/dashboard-data", get(get_dashboard_data))
        .route("/readings", get(list_readings))
        .route("/readings/latest", get(get_latest_reading))
        .route("/alerts", get(list_alerts).post(create_alert))
        .route("/alerts/:id", delete(delete_alert))
        .route("/metrics", get(get_metrics))
}
