//! 输入验证辅助函数
//!
//! 提供统一的输入验证函数：
//! - normalize_required：验证必填字段，去除空格并检查非空
//! - normalize_optional：可选字段，去除空格，空串视为未提供
//! - normalize_email：去除空格、转小写并做最基本的格式检查
//!
//! 失败返回 bad_request_error 响应。

use crate::utils::response::bad_request_error;
use axum::response::Response;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 可选字段：去除空格，空字符串按未提供处理
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// 邮箱：必填，统一小写，必须形如 `local@domain`
pub fn normalize_email(value: String) -> Result<String, Response> {
    let email = normalize_required(value, "email")?.to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(bad_request_error("email invalid")),
    }
}
