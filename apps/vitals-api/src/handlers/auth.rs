//! 认证相关 handlers：注册、登录、刷新 token、登出
//!
//! ## 提供的端点
//!
//! ### 公开端点（无需认证）
//! - `GET /health` - 健康检查，返回 `{"ok": true}`
//! - `POST /signup` - 注册；邮箱重复返回 409
//! - `POST /login` - 邮箱口令登录，返回 access/refresh token 与 `pairingRequired`
//! - `POST /refresh-token` - 使用 refresh token 换取新的 token 对
//!
//! ### 私有端点（需 Bearer token 认证）
//! - `POST /logout` - 作废当前 refresh token
//!
//! ## 首次登录
//!
//! 用户注册后第一次登录时 `pairingRequired = true`，前端据此引导扫码配对传感器网关；
//! 该标记在登录成功后即被清除。

use crate::AppState;
use crate::middleware::require_user_context;
use crate::utils::response::{
    auth_error, bad_request_error, conflict_error, internal_auth_error, profile_to_dto,
};
use crate::utils::validation::{normalize_email, normalize_optional, normalize_required};
use api_contract::{
    ApiResponse, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
    SignupRequest,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use vitals_auth::{AuthError, SignupInput};

/// 健康检查端点
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// 注册接口
///
/// # Errors
///
/// - `400 BAD REQUEST`: 必填字段缺失、邮箱格式或年龄不合法
/// - `409 CONFLICT`: 邮箱已注册
pub async fn signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    let name = match normalize_required(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let email = match normalize_email(req.email) {
        Ok(value) => value,
        Err(response) => return response,
    };
    if req.password.is_empty() {
        return bad_request_error("password required");
    }
    let gender = match normalize_required(req.gender, "gender") {
        Ok(value) => value,
        Err(response) => return response,
    };
    if !(0..=150).contains(&req.age) {
        return bad_request_error("age invalid");
    }
    if req.cholesterol.is_some_and(|value| value < 0) {
        return bad_request_error("cholesterol invalid");
    }

    let input = SignupInput {
        name,
        email,
        password: req.password,
        age: req.age,
        gender,
        cholesterol: req.cholesterol,
        chest_pain_type: normalize_optional(req.chest_pain_type),
        health_consent: req.health_consent,
    };
    match state.auth.signup(input).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(profile_to_dto(user))),
        )
            .into_response(),
        Err(AuthError::EmailTaken) => conflict_error("email already registered"),
        Err(err) => internal_auth_error(err),
    }
}

/// 登录接口
///
/// 成功时返回 access/refresh token，`expires` 为 access token 过期时间（Unix 毫秒）。
///
/// # Errors
///
/// - `401 UNAUTHORIZED`: 邮箱或口令错误
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let email = req.email.trim().to_ascii_lowercase();
    match state.auth.login(&email, &req.password).await {
        Ok(outcome) => {
            let response = LoginResponse {
                access_token: outcome.tokens.access_token,
                refresh_token: outcome.tokens.refresh_token,
                // 秒级时间戳转毫秒
                expires: outcome.tokens.expires_at.saturating_mul(1000),
                email: outcome.user.email,
                name: outcome.user.name,
                pairing_required: outcome.pairing_required,
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(AuthError::InvalidCredentials) => auth_error(StatusCode::UNAUTHORIZED),
        Err(err) => internal_auth_error(err),
    }
}

/// 刷新 access token（refresh token rotation：旧 refresh token 同时失效）
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Response {
    match state.auth.refresh(&req.refresh_token).await {
        Ok(tokens) => {
            let response = RefreshTokenResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expires: tokens.expires_at.saturating_mul(1000),
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(AuthError::TokenInvalid | AuthError::TokenExpired) => {
            auth_error(StatusCode::UNAUTHORIZED)
        }
        Err(err) => internal_auth_error(err),
    }
}

/// 登出
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.auth.logout(&ctx).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "loggedOut": true }))),
        )
            .into_response(),
        Err(err) => internal_auth_error(err),
    }
}
