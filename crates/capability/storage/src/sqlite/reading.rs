//! SQLite 读数实现

use crate::error::StorageError;
use crate::models::ReadingRecord;
use crate::traits::ReadingStore;
use crate::validation::clamp_limit;
use domain::CompletedReading;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub struct SqliteReadingStore {
    pub pool: SqlitePool,
}

impl SqliteReadingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn reading_from_row(row: &SqliteRow) -> Result<ReadingRecord, StorageError> {
    Ok(ReadingRecord {
        id: row.try_get("id")?,
        heartsensor: row.try_get("heartsensor")?,
        bp: row.try_get("bp")?,
        ts_ms: row.try_get("ts_ms")?,
    })
}

#[async_trait::async_trait]
impl ReadingStore for SqliteReadingStore {
    async fn insert_reading(
        &self,
        reading: &CompletedReading,
    ) -> Result<ReadingRecord, StorageError> {
        let result = sqlx::query("insert into readings (heartsensor, bp, ts_ms) values (?, ?, ?)")
            .bind(&reading.heartsensor)
            .bind(&reading.bp)
            .bind(reading.ts_ms)
            .execute(&self.pool)
            .await?;
        Ok(ReadingRecord {
            id: result.last_insert_rowid(),
            heartsensor: Some(reading.heartsensor.clone()),
            bp: Some(reading.bp.clone()),
            ts_ms: reading.ts_ms,
        })
    }

    async fn latest_reading(&self) -> Result<Option<ReadingRecord>, StorageError> {
        let row = sqlx::query(
            "select id, heartsensor, bp, ts_ms from readings order by id desc limit 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(reading_from_row).transpose()
    }

    async fn recent_readings(&self, limit: i64) -> Result<Vec<ReadingRecord>, StorageError> {
        let rows = sqlx::query(
            "select id, heartsensor, bp, ts_ms from readings \
             where heartsensor is not null \
             order by id desc \
             limit ?",
        )
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(reading_from_row).collect()
    }
}
