//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - ReadingStore: InMemoryReadingStore
//! - AlertRuleStore: InMemoryAlertRuleStore
//! - UserStore: InMemoryUserStore

pub mod alert_rule;
pub mod reading;
pub mod user;

pub use alert_rule::*;
pub use reading::*;
pub use user::*;
