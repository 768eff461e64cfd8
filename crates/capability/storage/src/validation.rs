//! 验证辅助函数
//!
//! 存储边界上的最小校验：
//! - normalize_alert_time / ensure_alert_time：告警时间必须是补零的 "HH:MM"
//! - clamp_limit：列表查询的条数上限

use crate::error::StorageError;
use chrono::NaiveTime;

/// 单次列表查询允许的最大条数
pub const MAX_LIST_LIMIT: i64 = 1000;

/// 告警时间格式（补零的小时与分钟）。
pub const ALERT_TIME_FORMAT: &str = "%H:%M";

/// 解析告警时间并返回补零后的 `HH:MM`（`9:00` → `09:00`）。
pub fn normalize_alert_time(input: &str) -> Result<String, StorageError> {
    NaiveTime::parse_from_str(input.trim(), ALERT_TIME_FORMAT)
        .map(|time| time.format(ALERT_TIME_FORMAT).to_string())
        .map_err(|_| StorageError::new(format!("invalid alert time: {input}")))
}

/// 验证告警时间格式
///
/// 调度器按字符串相等匹配，所以只接受规范的 `HH:MM`（如 `09:00`，不接受 `9:00`）。
pub fn ensure_alert_time(time: &str) -> Result<(), StorageError> {
    if normalize_alert_time(time)? != time {
        return Err(StorageError::new(format!("invalid alert time: {time}")));
    }
    Ok(())
}

/// 将 limit 限制在 [0, MAX_LIST_LIMIT]
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(0, MAX_LIST_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_time_accepts_padded_hhmm() {
        assert!(ensure_alert_time("09:00").is_ok());
        assert!(ensure_alert_time("23:59").is_ok());
        assert!(ensure_alert_time("00:00").is_ok());
    }

    #[test]
    fn alert_time_rejects_other_shapes() {
        for value in ["9:00", "24:00", "12:60", "12-00", "", "12:00:00"] {
            assert!(ensure_alert_time(value).is_err(), "{value}");
        }
    }

    #[test]
    fn alert_time_is_padded_when_normalized() {
        assert_eq!(normalize_alert_time(" 07:05 ").expect("time"), "07:05");
        assert!(normalize_alert_time("7:5pm").is_err());
        assert!(ensure_alert_time(" 07:05").is_err());
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(-3), 0);
        assert_eq!(clamp_limit(5000), MAX_LIST_LIMIT);
        assert_eq!(clamp_limit(2), 2);
    }
}
