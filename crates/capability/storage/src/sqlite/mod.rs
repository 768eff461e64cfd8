//! # SQLite 存储实现模块
//!
//! 本模块提供所有存储接口的 SQLite 实现，用于生产环境。
//!
//! ## 设计原则
//!
//! 1. **单库文件**：读数、告警、发件箱、用户共用一个库文件
//! 2. **参数化查询**：所有 SQL 查询使用参数绑定，防止 SQL 注入攻击
//! 3. **事务**：`fire_rule` 在一个事务里翻转 triggered 并写发件箱
//! 4. **稳定排序**：读数按自增 id 排序，不依赖墙钟
//!
//! ## 包含的实现
//!
//! - **ReadingStore** (`reading.rs`)
//! - **AlertRuleStore** (`alert_rule.rs`)
//! - **UserStore** (`user.rs`)
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use vitals_storage::{connect_pool, ReadingStore, SqliteReadingStore};
//!
//! let pool = connect_pool("sqlite://database.db").await?;
//! let readings = SqliteReadingStore::new(pool);
//! let latest = readings.latest_reading().await?;
//! ```

pub mod alert_rule;
pub mod reading;
pub mod user;

pub use alert_rule::*;
pub use reading::*;
pub use user::*;
