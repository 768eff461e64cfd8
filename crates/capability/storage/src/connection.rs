//! 数据库连接管理
//!
//! 提供数据库连接池初始化功能：
//! - connect_pool：建立 SQLite 连接池并确保表结构存在
//! - ensure_schema：建表（幂等）
//!
//! 设计原则：
//! - 读数、告警、发件箱、用户共用一个库文件
//! - `sqlite::memory:` 只允许单连接，否则每个连接各自一份内存库

use crate::error::StorageError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    "create table if not exists readings ( \
       id integer primary key autoincrement, \
       heartsensor text, \
       bp text, \
       ts_ms integer not null)",
    "create table if not exists alerts ( \
       id integer primary key autoincrement, \
       time text not null, \
       message text not null, \
       triggered integer not null default 0)",
    "create index if not exists idx_alerts_time_triggered on alerts (time, triggered)",
    "create table if not exists alert_outbox ( \
       id integer primary key autoincrement, \
       rule_id integer not null, \
       tick text not null, \
       message text not null, \
       delivered integer not null default 0, \
       created_at_ms integer not null)",
    "create index if not exists idx_alert_outbox_pending on alert_outbox (delivered, id)",
    "create table if not exists users ( \
       id integer primary key autoincrement, \
       name text not null, \
       email text not null unique, \
       password_hash text not null, \
       age integer not null, \
       gender text not null, \
       cholesterol integer not null default 0, \
       chest_pain_type text, \
       first_login integer not null default 1, \
       paired_bridge text, \
       refresh_jti text)",
];

/// 建立 SQLite 连接池
///
/// 库文件不存在时自动创建，并执行建表语句。
///
/// # 参数
/// - `database_url`：如 `sqlite://database.db` 或 `sqlite::memory:`
pub async fn connect_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(4)
    };
    let pool = pool_options.connect_with(options).await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// 建表（幂等）
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
