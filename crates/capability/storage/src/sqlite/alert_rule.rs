//! SQLite 告警规则与发件箱实现

use crate::error::StorageError;
use crate::models::{AlertRuleRecord, OutboxRecord};
use crate::traits::AlertRuleStore;
use crate::validation::ensure_alert_time;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub struct SqliteAlertRuleStore {
    pub pool: SqlitePool,
}

impl SqliteAlertRuleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn rule_from_row(row: &SqliteRow) -> Result<AlertRuleRecord, StorageError> {
    Ok(AlertRuleRecord {
        id: row.try_get("id")?,
        time: row.try_get("time")?,
        message: row.try_get("message")?,
        triggered: row.try_get("triggered")?,
    })
}

fn outbox_from_row(row: &SqliteRow) -> Result<OutboxRecord, StorageError> {
    Ok(OutboxRecord {
        id: row.try_get("id")?,
        rule_id: row.try_get("rule_id")?,
        tick: row.try_get("tick")?,
        message: row.try_get("message")?,
        delivered: row.try_get("delivered")?,
        created_at_ms: row.try_get("created_at_ms")?,
    })
}

#[async_trait::async_trait]
impl AlertRuleStore for SqliteAlertRuleStore {
    async fn insert_alert_rule(
        &self,
        time: &str,
        message: &str,
    ) -> Result<AlertRuleRecord, StorageError> {
        ensure_alert_time(time)?;
        let result = sqlx::query("insert into alerts (time, message) values (?, ?)")
            .bind(time)
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(AlertRuleRecord {
            id: result.last_insert_rowid(),
            time: time.to_string(),
            message: message.to_string(),
            triggered: false,
        })
    }

    async fn list_alert_rules(&self) -> Result<Vec<AlertRuleRecord>, StorageError> {
        let rows = sqlx::query("select id, time, message, triggered from alerts order by id asc")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(rule_from_row).collect()
    }

    async fn delete_alert_rule(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from alerts where id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_triggered(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("update alerts set triggered = 1 where id = ? and triggered = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unfired_rules_at(&self, hhmm: &str) -> Result<Vec<AlertRuleRecord>, StorageError> {
        let rows = sqlx::query(
            "select id, time, message, triggered from alerts \
             where time = ? and triggered = 0 \
             order by id asc",
        )
        .bind(hhmm)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(rule_from_row).collect()
    }

    async fn fire_rule(
        &self,
        rule: &AlertRuleRecord,
        tick: &str,
        now_ms: i64,
    ) -> Result<Option<OutboxRecord>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let flipped = sqlx::query("update alerts set triggered = 1 where id = ? and triggered = 0")
            .bind(rule.id)
            .execute(&mut *tx)
            .await?;
        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        let inserted = sqlx::query(
            "insert into alert_outbox (rule_id, tick, message, delivered, created_at_ms) \
             values (?, ?, ?, 0, ?)",
        )
        .bind(rule.id)
        .bind(tick)
        .bind(&rule.message)
        .bind(now_ms)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(OutboxRecord {
            id: inserted.last_insert_rowid(),
            rule_id: rule.id,
            tick: tick.to_string(),
            message: rule.message.clone(),
            delivered: false,
            created_at_ms: now_ms,
        }))
    }

    async fn pending_notifications(&self) -> Result<Vec<OutboxRecord>, StorageError> {
        let rows = sqlx::query(
            "select id, rule_id, tick, message, delivered, created_at_ms \
             from alert_outbox where delivered = 0 order by id asc",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(outbox_from_row).collect()
    }

    async fn mark_delivered(&self, outbox_id: i64) -> Result<bool, StorageError> {
        let result =
            sqlx::query("update alert_outbox set delivered = 1 where id = ? and delivered = 0")
                .bind(outbox_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
