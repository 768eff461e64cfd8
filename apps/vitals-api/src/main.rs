//! 家庭体征监测后端：HTTP API + MQTT 采集 + 分钟级告警调度。

mod handlers;
mod ingest;
mod middleware;
mod routes;
mod utils;

#[cfg(test)]
mod tests;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use vitals_auth::{AuthService, JwtManager};
use vitals_config::AppConfig;
use vitals_scoring::{ProcessRiskScorer, ProcessScorerConfig, RiskScorer};
use vitals_storage::{
    AlertRuleStore, ReadingStore, SqliteAlertRuleStore, SqliteReadingStore, SqliteUserStore,
    UserStore, connect_pool,
};
use vitals_telemetry::init_tracing;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub user_store: Arc<dyn UserStore>,
    pub reading_store: Arc<dyn ReadingStore>,
    pub alert_store: Arc<dyn AlertRuleStore>,
    pub scorer: Arc<dyn RiskScorer>,
}

/// 组装完整的 HTTP 应用（路由 + 追踪中间件）。
pub fn build_app(state: AppState) -> Router {
    routes::create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(axum::middleware::from_fn(middleware::request_context))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    // 读数、告警、用户共用一个 SQLite 库文件
    let pool = connect_pool(&config.database_url).await?;
    let user_store: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(pool.clone()));
    let reading_store: Arc<dyn ReadingStore> = Arc::new(SqliteReadingStore::new(pool.clone()));
    let alert_store: Arc<dyn AlertRuleStore> = Arc::new(SqliteAlertRuleStore::new(pool));

    let jwt = JwtManager::new(
        config.jwt_secret.clone(),
        config.jwt_access_ttl_seconds,
        config.jwt_refresh_ttl_seconds,
    );
    let auth = Arc::new(AuthService::new(user_store.clone(), jwt));
    let scorer: Arc<dyn RiskScorer> = Arc::new(ProcessRiskScorer::new(ProcessScorerConfig {
        program: config.scorer_program.clone(),
        script: config.scorer_script.clone(),
        reduced_script: config.scorer_reduced_script.clone(),
        timeout_ms: config.scorer_timeout_ms,
    }));

    let _background = ingest::spawn_background(&config, reading_store.clone(), alert_store.clone());

    let state = AppState {
        auth,
        user_store,
        reading_store,
        alert_store,
        scorer,
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(http_addr = %config.http_addr, "http server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
