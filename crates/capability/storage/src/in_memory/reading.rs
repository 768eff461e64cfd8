//! 读数内存实现
//!
//! 仅用于本地测试和占位。

use crate::error::StorageError;
use crate::models::ReadingRecord;
use crate::traits::ReadingStore;
use crate::validation::clamp_limit;
use domain::CompletedReading;
use std::sync::RwLock;

/// 读数内存存储
pub struct InMemoryReadingStore {
    readings: RwLock<Vec<ReadingRecord>>,
}

impl InMemoryReadingStore {
    /// 创建新的读数存储
    pub fn new() -> Self {
        Self {
            readings: RwLock::new(Vec::new()),
        }
    }

    /// 获取当前累计的读数数量（用于测试）
    pub fn len(&self) -> usize {
        self.readings.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn insert_reading(
        &self,
        reading: &CompletedReading,
    ) -> Result<ReadingRecord, StorageError> {
        let mut readings = self
            .readings
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let id = readings.last().map(|item| item.id + 1).unwrap_or(1);
        let record = ReadingRecord {
            id,
            heartsensor: Some(reading.heartsensor.clone()),
            bp: Some(reading.bp.clone()),
            ts_ms: reading.ts_ms,
        };
        readings.push(record.clone());
        Ok(record)
    }

    async fn latest_reading(&self) -> Result<Option<ReadingRecord>, StorageError> {
        let readings = self
            .readings
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(readings.last().cloned())
    }

    async fn recent_readings(&self, limit: i64) -> Result<Vec<ReadingRecord>, StorageError> {
        let limit = clamp_limit(limit) as usize;
        let readings = self
            .readings
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(readings
            .iter()
            .rev()
            .filter(|item| item.heartsensor.is_some())
            .take(limit)
            .cloned()
            .collect())
    }
}
