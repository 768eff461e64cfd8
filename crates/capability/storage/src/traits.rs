//! 存储接口 Trait 定义
//!
//! 定义所有资源存储的异步接口：
//! - ReadingStore：读数存储（只追加）
//! - AlertRuleStore：告警规则 + 发件箱
//! - UserStore：用户存储
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 单写者假设：读数只由关联器写入，triggered 只由调度器翻转

use crate::error::StorageError;
use crate::models::{AlertRuleRecord, NewUser, OutboxRecord, ReadingRecord, UserRecord};
use async_trait::async_trait;
use domain::CompletedReading;

/// 读数存储接口
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// 追加一条完整读数，返回分配了 id 的记录
    async fn insert_reading(
        &self,
        reading: &CompletedReading,
    ) -> Result<ReadingRecord, StorageError>;

    /// 最近一条读数
    async fn latest_reading(&self) -> Result<Option<ReadingRecord>, StorageError>;

    /// 最近 `limit` 条心率非空的读数，按插入 id 倒序
    async fn recent_readings(&self, limit: i64) -> Result<Vec<ReadingRecord>, StorageError>;
}

/// 告警规则存储接口
///
/// 除规则 CRUD 外还负责发件箱：`fire_rule` 在同一事务里翻转 triggered 并写入待发布条目。
#[async_trait]
pub trait AlertRuleStore: Send + Sync {
    /// 创建规则（triggered = false）
    async fn insert_alert_rule(
        &self,
        time: &str,
        message: &str,
    ) -> Result<AlertRuleRecord, StorageError>;

    /// 列出全部规则（按 id 升序）
    async fn list_alert_rules(&self) -> Result<Vec<AlertRuleRecord>, StorageError>;

    /// 删除规则，返回是否存在
    async fn delete_alert_rule(&self, id: i64) -> Result<bool, StorageError>;

    /// 将规则标记为已触发，返回是否发生了 false -> true 的翻转
    async fn mark_triggered(&self, id: i64) -> Result<bool, StorageError>;

    /// 指定 "HH:MM" 且尚未触发的规则
    async fn unfired_rules_at(&self, hhmm: &str) -> Result<Vec<AlertRuleRecord>, StorageError>;

    /// 原子地翻转 triggered 并写入发件箱
    ///
    /// 规则已被触发（或已删除）时返回 `None`，保证每条规则最多入箱一次。
    async fn fire_rule(
        &self,
        rule: &AlertRuleRecord,
        tick: &str,
        now_ms: i64,
    ) -> Result<Option<OutboxRecord>, StorageError>;

    /// 尚未成功发布的发件箱条目（按 id 升序）
    async fn pending_notifications(&self) -> Result<Vec<OutboxRecord>, StorageError>;

    /// 标记发件箱条目已发布
    async fn mark_delivered(&self, outbox_id: i64) -> Result<bool, StorageError>;
}

/// 用户存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 创建用户；邮箱已存在时返回 `None`
    async fn create_user(&self, user: NewUser) -> Result<Option<UserRecord>, StorageError>;

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 根据 id 查找用户
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, StorageError>;

    /// 清除首次登录标记，返回清除前是否为首次登录
    async fn clear_first_login(&self, user_id: i64) -> Result<bool, StorageError>;

    /// 记录已配对的传感器桥地址
    async fn set_paired_bridge(&self, user_id: i64, bridge_url: &str)
    -> Result<bool, StorageError>;

    /// 绑定当前有效的 refresh token jti（`None` 表示登出）
    async fn set_refresh_jti(
        &self,
        user_id: i64,
        jti: Option<&str>,
    ) -> Result<bool, StorageError>;

    /// 读取当前有效的 refresh token jti
    async fn get_refresh_jti(&self, user_id: i64) -> Result<Option<String>, StorageError>;
}
