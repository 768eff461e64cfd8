//! 传感器网关扫码配对
//!
//! - POST /pairing
//!
//! 二维码图片由客户端解码，这里只接收解码后的文本并校验其为
//! `mqtt://a.b.c.d:port` 形式的网关地址。

use crate::AppState;
use crate::middleware::require_user_context;
use crate::utils::response::{bad_request_error, not_found_error, storage_error};
use api_contract::{ApiResponse, PairingDto, PairingRequest};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

/// 校验网关地址：`mqtt://` + 四段点分数字 + `:` + 端口。
///
/// 每段只允许 ASCII 数字；端口必须能放进 u16。
pub fn parse_bridge_url(text: &str) -> Option<String> {
    let text = text.trim();
    let rest = text.strip_prefix("mqtt://")?;
    let (host, port) = rest.rsplit_once(':')?;
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    let octets: Vec<&str> = host.split('.').collect();
    if octets.len() != 4 || !octets.iter().copied().all(all_digits) {
        return None;
    }
    if !all_digits(port) || port.parse::<u16>().is_err() {
        return None;
    }
    Some(text.to_string())
}

pub async fn pair_bridge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PairingRequest>,
) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Some(bridge_url) = parse_bridge_url(&req.qr_text) else {
        return bad_request_error("Invalid QR code format.");
    };
    match state
        .user_store
        .set_paired_bridge(ctx.user_id, &bridge_url)
        .await
    {
        Ok(true) => {
            info!(user_id = ctx.user_id, bridge_url = %bridge_url, "bridge_paired");
            (
                StatusCode::OK,
                Json(ApiResponse::success(PairingDto { bridge_url })),
            )
                .into_response()
        }
        Ok(false) => not_found_error(),
        Err(err) => storage_error(err),
    }
}
