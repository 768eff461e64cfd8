use async_trait::async_trait;
use chrono::Timelike;
use rumqttc::{AsyncClient, QoS};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vitals_config::AlertClock;
use vitals_ingest::{now_epoch_ms, qos_from_u8};
use vitals_storage::{ALERT_TIME_FORMAT, AlertRuleStore, OutboxRecord, normalize_alert_time};
use vitals_telemetry::{
    record_alert_fired, record_alert_publish_failure, record_alert_published,
    record_outbox_replayed,
};

/// 告警链路错误。
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("publish error: {0}")]
    Publish(String),
    #[error("invalid alert time: {0}")]
    InvalidTime(String),
}

/// 通知发布器抽象。
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, message: &str) -> Result<(), AlertError>;
}

/// 空发布器（未启用 MQTT 时占位）。
#[derive(Debug, Default)]
pub struct NoopPublisher;

#[async_trait]
impl NotificationPublisher for NoopPublisher {
    async fn publish(&self, _message: &str) -> Result<(), AlertError> {
        Ok(())
    }
}

/// MQTT 通知发布器：与采集共用一个连接，纯文本发布到告警 topic。
///
/// 发布成功只表示消息进入了 rumqttc 的请求队列，还没有得到 broker 确认；
/// 发件箱随后即标记为已送达，因此 QoS 0 下断线期间排队的消息仍可能丢失。
/// 队列已满时直接返回失败，条目留在发件箱等下次重放，调度任务不会阻塞。
#[derive(Clone)]
pub struct MqttNotificationPublisher {
    client: AsyncClient,
    topic: String,
    qos: QoS,
}

impl MqttNotificationPublisher {
    pub fn new(client: AsyncClient, topic: impl Into<String>, qos: u8) -> Self {
        Self {
            client,
            topic: topic.into(),
            qos: qos_from_u8(qos),
        }
    }
}

#[async_trait]
impl NotificationPublisher for MqttNotificationPublisher {
    async fn publish(&self, message: &str) -> Result<(), AlertError> {
        info!(
            target: "vitals.alerting",
            topic = %self.topic,
            payload_size = message.len(),
            "alert_publish"
        );
        self.client
            .try_publish(self.topic.as_str(), self.qos, false, message.as_bytes().to_vec())
            .map_err(|err| AlertError::Publish(err.to_string()))
    }
}

/// 解析并规范化告警时间，返回补零的 `HH:MM`。
pub fn parse_alert_time(input: &str) -> Result<String, AlertError> {
    normalize_alert_time(input).map_err(|_| AlertError::InvalidTime(input.to_string()))
}

/// 当前墙钟的 `HH:MM`。
pub fn current_hhmm(clock: AlertClock) -> String {
    match clock {
        AlertClock::Local => chrono::Local::now().format(ALERT_TIME_FORMAT).to_string(),
        AlertClock::Utc => chrono::Utc::now().format(ALERT_TIME_FORMAT).to_string(),
    }
}

/// 距离下一个整分钟的时长。
pub fn until_next_minute(clock: AlertClock) -> Duration {
    let now = match clock {
        AlertClock::Local => chrono::Local::now().time(),
        AlertClock::Utc => chrono::Utc::now().time(),
    };
    let millis = (now.nanosecond() / 1_000_000).min(999);
    let elapsed_ms = u64::from(now.second()) * 1000 + u64::from(millis);
    Duration::from_millis(60_000 - elapsed_ms.min(59_999))
}

/// 单次 tick 的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 本分钟匹配到的未触发规则数。
    pub matched: usize,
    /// 本次成功翻转 triggered 的规则数。
    pub fired: usize,
    /// 本次新触发并发布成功的通知数。
    pub published: usize,
    /// 发布或存储失败的次数；已入箱的条目留在发件箱等待重放。
    pub failed: usize,
    /// 从发件箱重放成功的通知数。
    pub replayed: usize,
}

/// 分钟级告警调度器。
///
/// 每次 tick 先重放发件箱里未送达的通知，再匹配当前分钟的未触发规则。
/// 规则的翻转与入箱是原子的，发布在其后进行；因此通知至少送达一次，
/// 规则永远不会被重复触发。
///
/// 单条规则或单条发件箱条目的存储错误只记日志并计入 `failed`，
/// 不影响同一分钟里的其他规则。
pub struct AlertScheduler {
    store: Arc<dyn AlertRuleStore>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl AlertScheduler {
    pub fn new(store: Arc<dyn AlertRuleStore>, publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self { store, publisher }
    }

    /// 执行一次 tick。只有查询当前分钟的规则失败时才返回错误。
    pub async fn tick(&self, hhmm: &str) -> Result<TickReport, AlertError> {
        let mut report = TickReport::default();
        self.replay_pending(&mut report).await;

        let rules = self
            .store
            .unfired_rules_at(hhmm)
            .await
            .map_err(|err| AlertError::Storage(err.to_string()))?;
        report.matched = rules.len();
        for rule in rules {
            let entry = match self.store.fire_rule(&rule, hhmm, now_epoch_ms()).await {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        target: "vitals.alerting",
                        rule_id = rule.id,
                        tick = %hhmm,
                        error = %err,
                        "alert_fire_failed"
                    );
                    continue;
                }
            };
            report.fired += 1;
            record_alert_fired();
            info!(
                target: "vitals.alerting",
                rule_id = rule.id,
                outbox_id = entry.id,
                tick = %hhmm,
                "alert_fired"
            );
            if self.deliver(&entry).await {
                report.published += 1;
            } else {
                report.failed += 1;
            }
        }
        Ok(report)
    }

    async fn replay_pending(&self, report: &mut TickReport) {
        let pending = match self.store.pending_notifications().await {
            Ok(pending) => pending,
            Err(err) => {
                report.failed += 1;
                warn!(target: "vitals.alerting", error = %err, "alert_outbox_read_failed");
                return;
            }
        };
        for entry in pending {
            if self.deliver(&entry).await {
                report.replayed += 1;
                record_outbox_replayed();
                info!(
                    target: "vitals.alerting",
                    rule_id = entry.rule_id,
                    outbox_id = entry.id,
                    tick = %entry.tick,
                    "alert_replayed"
                );
            } else {
                report.failed += 1;
            }
        }
    }

    /// 发布一条发件箱条目并标记已送达；返回是否两步都成功。
    ///
    /// 任一步失败时条目保持未送达，下次 tick 重放。
    async fn deliver(&self, entry: &OutboxRecord) -> bool {
        if let Err(err) = self.publisher.publish(&entry.message).await {
            record_alert_publish_failure();
            warn!(
                target: "vitals.alerting",
                rule_id = entry.rule_id,
                outbox_id = entry.id,
                error = %err,
                "alert_publish_failed"
            );
            return false;
        }
        record_alert_published();
        if let Err(err) = self.store.mark_delivered(entry.id).await {
            warn!(
                target: "vitals.alerting",
                rule_id = entry.rule_id,
                outbox_id = entry.id,
                error = %err,
                "alert_mark_delivered_failed"
            );
            return false;
        }
        true
    }
}

/// 启动调度任务：立即 tick 一次（重放重启前未送达的通知），随后对齐整分钟。
pub fn spawn_alert_scheduler(
    scheduler: Arc<AlertScheduler>,
    clock: AlertClock,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let hhmm = current_hhmm(clock);
            match scheduler.tick(&hhmm).await {
                Ok(report) if report != TickReport::default() => {
                    info!(
                        target: "vitals.alerting",
                        tick = %hhmm,
                        matched = report.matched,
                        fired = report.fired,
                        published = report.published,
                        failed = report.failed,
                        replayed = report.replayed,
                        "alert_tick"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(target: "vitals.alerting", tick = %hhmm, error = %err, "alert_tick_failed");
                }
            }
            tokio::time::sleep(until_next_minute(clock)).await;
        }
    })
}
