use async_trait::async_trait;
use domain::{CompletedReading, SensorChannel, SensorMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use vitals_ingest::{IngestError, SensorMessageHandler};
use vitals_storage::ReadingStore;
use vitals_telemetry::{record_flush_failure, record_reading_flushed};

/// 读数关联器：把各通道独立到达的部分值拼成一条完整读数。
///
/// 每个通道只保留最近一次的值；所有通道都到齐时立即产出读数并清空缓冲。
/// 关联按“已到齐的通道数”判断，不校验两个值是否来自同一次测量。
#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<SensorChannel, String>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条通道值；到齐时返回完整读数（时间戳为 `now_ms`）。
    pub fn on_message(
        &mut self,
        channel: SensorChannel,
        payload: String,
        now_ms: i64,
    ) -> Option<CompletedReading> {
        self.pending.insert(channel, payload);
        if !SensorChannel::ALL
            .iter()
            .all(|channel| self.pending.contains_key(channel))
        {
            return None;
        }
        let mut pending = std::mem::take(&mut self.pending);
        Some(CompletedReading {
            heartsensor: pending
                .remove(&SensorChannel::HeartRate)
                .unwrap_or_default(),
            bp: pending
                .remove(&SensorChannel::BloodPressure)
                .unwrap_or_default(),
            ts_ms: now_ms,
        })
    }

    pub fn pending_value(&self, channel: SensorChannel) -> Option<&str> {
        self.pending.get(&channel).map(String::as_str)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// 采集处理器：驱动 `Correlator` 并把完整读数写入 ReadingStore。
///
/// 写入失败只记录日志，缓冲照常清空，丢失的读数不重试。
#[derive(Clone)]
pub struct CorrelatorHandler {
    store: Arc<dyn ReadingStore>,
    state: Arc<Mutex<Correlator>>,
}

impl CorrelatorHandler {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(Correlator::new())),
        }
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending_len()
    }

    async fn flush(&self, reading: CompletedReading) {
        match self.store.insert_reading(&reading).await {
            Ok(record) => {
                record_reading_flushed();
                info!(
                    target: "vitals.ingest",
                    reading_id = record.id,
                    heartsensor = %reading.heartsensor,
                    bp = %reading.bp,
                    ts_ms = reading.ts_ms,
                    "reading_flushed"
                );
            }
            Err(err) => {
                record_flush_failure();
                warn!(
                    target: "vitals.ingest",
                    heartsensor = %reading.heartsensor,
                    bp = %reading.bp,
                    error = %err,
                    "reading_flush_failed"
                );
            }
        }
    }
}

#[async_trait]
impl SensorMessageHandler for CorrelatorHandler {
    async fn handle(&self, message: SensorMessage) -> Result<(), IngestError> {
        let completed = {
            let mut state = self.state.lock().await;
            state.on_message(message.channel, message.payload, message.received_at_ms)
        };
        if let Some(reading) = completed {
            self.flush(reading).await;
        }
        Ok(())
    }
}
