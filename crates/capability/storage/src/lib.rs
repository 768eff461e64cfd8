//! # Vitals Storage 模块
//!
//! 本模块提供统一的数据存储抽象层，支持 SQLite 与内存两种后端。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：ReadingStore、AlertRuleStore、UserStore
//! 2. **数据模型层** (`models.rs`)：读数、告警规则、发件箱、用户
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **验证辅助层** (`validation.rs`)：告警时间格式、列表上限
//! 5. **连接管理层** (`connection.rs`)：SQLite 连接池与建表
//! 6. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和演示）
//!    - `sqlite/`：SQLite 存储实现（生产环境使用）
//!
//! ## 核心约束
//!
//! - **读数只追加**：写入后不修改、不删除，按自增 id 排序
//! - **告警只触发一次**：`triggered` 只会从 false 翻到 true
//! - **发件箱**：触发与入箱在同一事务内提交，发布成功后再标记 delivered
//! - **邮箱唯一**：重复注册返回 `None` 而不是错误
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use vitals_storage::{connect_pool, AlertRuleStore, SqliteAlertRuleStore};
//!
//! let pool = connect_pool("sqlite://database.db").await?;
//! let alerts = SqliteAlertRuleStore::new(pool);
//! let rule = alerts.insert_alert_rule("09:00", "take meds").await?;
//! ```
//!
//! ### 使用内存存储（测试环境）
//!
//! ```rust,ignore
//! use vitals_storage::{InMemoryReadingStore, ReadingStore};
//!
//! let readings = InMemoryReadingStore::new();
//! let latest = readings.latest_reading().await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod sqlite;
pub mod traits;
pub mod validation;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::{InMemoryAlertRuleStore, InMemoryReadingStore, InMemoryUserStore};
pub use sqlite::{SqliteAlertRuleStore, SqliteReadingStore, SqliteUserStore};
