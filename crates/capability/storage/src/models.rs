//! 数据模型
//!
//! 定义所有存储相关的数据模型：
//! - 读数模型：ReadingRecord
//! - 告警模型：AlertRuleRecord, OutboxRecord
//! - 用户模型：UserRecord, NewUser

/// 已持久化的读数（写入后不可变）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingRecord {
    pub id: i64,
    pub heartsensor: Option<String>,
    pub bp: Option<String>,
    pub ts_ms: i64,
}

/// 告警规则。`triggered` 只会从 false 翻到 true。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRuleRecord {
    pub id: i64,
    pub time: String,
    pub message: String,
    pub triggered: bool,
}

/// 告警发件箱条目：规则触发时与 triggered 翻转一起提交，发布成功后标记 delivered。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    pub id: i64,
    pub rule_id: i64,
    pub tick: String,
    pub message: String,
    pub delivered: bool,
    pub created_at_ms: i64,
}

/// 用户记录。
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
    /// 0 表示未知（评分时走简化模型）。
    pub cholesterol: i64,
    pub chest_pain_type: Option<String>,
    pub first_login: bool,
    pub paired_bridge: Option<String>,
}

impl UserRecord {
    /// 将用户记录转换为 UserContext。
    pub fn to_user_context(&self) -> domain::UserContext {
        domain::UserContext::new(self.id, self.email.clone())
    }
}

/// 用户创建输入。
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
    pub cholesterol: i64,
    pub chest_pain_type: Option<String>,
}
