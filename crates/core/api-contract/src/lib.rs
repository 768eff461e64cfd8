//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 注册请求体。
///
/// `healthConsent` 为 false 时不保存胆固醇与胸痛类型。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: i64,
    pub gender: String,
    pub cholesterol: Option<i64>,
    #[serde(alias = "chest_pain_type")]
    pub chest_pain_type: Option<String>,
    #[serde(default, alias = "health_consent")]
    pub health_consent: bool,
}

/// 登录请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires: u64,
    pub email: String,
    pub name: String,
    /// 首次登录需要先扫码配对传感器网关。
    pub pairing_required: bool,
}

/// 刷新 token 请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

/// 刷新 token 响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires: u64,
}

/// 用户资料。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub name: String,
    pub email: String,
    pub age: i64,
    pub gender: String,
    pub cholesterol: i64,
    pub paired_bridge: Option<String>,
}

/// 扫码配对请求体（二维码解码后的文本）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingRequest {
    #[serde(alias = "qr_text")]
    pub qr_text: String,
}

/// 配对结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingDto {
    pub bridge_url: String,
}

/// 读数返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingDto {
    pub id: i64,
    pub heartsensor: Option<String>,
    pub bp: Option<String>,
    pub ts_ms: i64,
}

/// 读数历史查询参数。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingsQuery {
    pub limit: Option<i64>,
}

/// 仪表盘数据。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub heartsensor: Option<String>,
    pub bp: Option<String>,
    pub chol: Option<i64>,
    /// 评分进程返回的 `alert_prediction`；评分不可用时为空。
    pub alert_prediction: Option<bool>,
    pub advisory: Option<String>,
}

/// 告警规则创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub time: String,
    pub message: String,
}

/// 告警规则返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleDto {
    pub id: i64,
    pub time: String,
    pub message: String,
    pub triggered: bool,
}

/// 采集与告警计数快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDto {
    pub messages_received: u64,
    pub messages_ignored: u64,
    pub readings_flushed: u64,
    pub flush_failures: u64,
    pub alerts_fired: u64,
    pub alerts_published: u64,
    pub alert_publish_failures: u64,
    pub outbox_replayed: u64,
}
