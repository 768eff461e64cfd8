//! 追踪、请求 ID 与采集/告警计数。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 计数指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_ignored: u64,
    pub readings_flushed: u64,
    pub flush_failures: u64,
    pub alerts_fired: u64,
    pub alerts_published: u64,
    pub alert_publish_failures: u64,
    pub outbox_replayed: u64,
}

/// 进程内计数指标。
pub struct TelemetryMetrics {
    messages_received: AtomicU64,
    messages_ignored: AtomicU64,
    readings_flushed: AtomicU64,
    flush_failures: AtomicU64,
    alerts_fired: AtomicU64,
    alerts_published: AtomicU64,
    alert_publish_failures: AtomicU64,
    outbox_replayed: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_ignored: AtomicU64::new(0),
            readings_flushed: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            alerts_fired: AtomicU64::new(0),
            alerts_published: AtomicU64::new(0),
            alert_publish_failures: AtomicU64::new(0),
            outbox_replayed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_ignored: self.messages_ignored.load(Ordering::Relaxed),
            readings_flushed: self.readings_flushed.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            alerts_fired: self.alerts_fired.load(Ordering::Relaxed),
            alerts_published: self.alerts_published.load(Ordering::Relaxed),
            alert_publish_failures: self.alert_publish_failures.load(Ordering::Relaxed),
            outbox_replayed: self.outbox_replayed.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录收到的传感器消息次数。
pub fn record_message_received() {
    metrics().messages_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录被忽略的消息次数（未知通道、空 payload）。
pub fn record_message_ignored() {
    metrics().messages_ignored.fetch_add(1, Ordering::Relaxed);
}

/// 记录成功写入的完整读数次数。
pub fn record_reading_flushed() {
    metrics().readings_flushed.fetch_add(1, Ordering::Relaxed);
}

/// 记录读数写入失败次数（读数丢弃，不重试）。
pub fn record_flush_failure() {
    metrics().flush_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录规则触发次数（triggered 翻转并入发件箱）。
pub fn record_alert_fired() {
    metrics().alerts_fired.fetch_add(1, Ordering::Relaxed);
}

/// 记录告警发布成功次数。
pub fn record_alert_published() {
    metrics().alerts_published.fetch_add(1, Ordering::Relaxed);
}

/// 记录告警发布失败次数（留在发件箱等待重放）。
pub fn record_alert_publish_failure() {
    metrics()
        .alert_publish_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录发件箱重放成功次数。
pub fn record_outbox_replayed() {
    metrics().outbox_replayed.fetch_add(1, Ordering::Relaxed);
}
