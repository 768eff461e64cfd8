//! HTTP 响应辅助函数和 DTO 转换
//!
//! 提供统一的错误响应构造函数和 DTO 转换函数：
//! - 错误响应：auth_error, bad_request_error, not_found_error, conflict_error, internal_auth_error, storage_error
//! - DTO 转换：reading_to_dto, alert_rule_to_dto, profile_to_dto
//!
//! 设计原则：
//! - 所有错误返回统一的 ApiResponse 格式
//! - HTTP 状态码与错误码对应

use api_contract::{AlertRuleDto, ApiResponse, ProfileDto, ReadingDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use vitals_auth::AuthError;
use vitals_storage::{AlertRuleRecord, ReadingRecord, StorageError, UserRecord};

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(
            "AUTH.UNAUTHORIZED",
            "unauthorized",
        )),
    )
        .into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// 资源冲突响应（如邮箱已注册）
pub fn conflict_error(message: impl Into<String>) -> Response {
    (
        StatusCode::CONFLICT,
        Json(ApiResponse::<()>::error("RESOURCE.CONFLICT", message.into())),
    )
        .into_response()
}

/// 认证内部错误响应
pub fn internal_auth_error(err: AuthError) -> Response {
    tracing::warn!(error = %err, "auth_internal_error");
    internal_error()
}

/// 存储错误响应
pub fn storage_error(err: StorageError) -> Response {
    tracing::warn!(error = %err, "storage_error");
    internal_error()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", "internal error")),
    )
        .into_response()
}

/// ReadingRecord 转 ReadingDto
pub fn reading_to_dto(record: ReadingRecord) -> ReadingDto {
    ReadingDto {
        id: record.id,
        heartsensor: record.heartsensor,
        bp: record.bp,
        ts_ms: record.ts_ms,
    }
}

/// AlertRuleRecord 转 AlertRuleDto
pub fn alert_rule_to_dto(record: AlertRuleRecord) -> AlertRuleDto {
    AlertRuleDto {
        id: record.id,
        time: record.time,
        message: record.message,
        triggered: record.triggered,
    }
}

/// UserRecord 转 ProfileDto（不含口令哈希）
pub fn profile_to_dto(record: UserRecord) -> ProfileDto {
    ProfileDto {
        name: record.name,
        email: record.email,
        age: record.age,
        gender: record.gender,
        cholesterol: record.cholesterol,
        paired_bridge: record.paired_bridge,
    }
}
