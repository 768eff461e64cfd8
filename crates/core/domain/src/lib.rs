pub mod data;

pub use data::{CompletedReading, SensorChannel, SensorMessage};

/// 用户上下文：认证后在各模块之间传递的执行上下文。
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: i64,
    pub email: String,
}

impl UserContext {
    /// 构造显式身份的用户上下文。
    pub fn new(user_id: i64, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

impl Default for UserContext {
    /// 空上下文（仅用于测试或占位）。
    fn default() -> Self {
        Self {
            user_id: 0,
            email: "".to_string(),
        }
    }
}
