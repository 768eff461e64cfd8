//! 后台链路装配模块
//!
//! 负责把 MQTT 连接、读数关联器与告警调度器组装起来：
//! - 采集：MqttSource → CorrelatorHandler → ReadingStore
//! - 告警：AlertScheduler（每分钟）→ MqttNotificationPublisher
//!
//! 采集与告警共用一个 MQTT 连接（同一个 `AsyncClient`/event loop）。

use std::sync::Arc;
use tracing::{info, warn};
use vitals_alerting::{
    AlertScheduler, MqttNotificationPublisher, NoopPublisher, NotificationPublisher,
    spawn_alert_scheduler,
};
use vitals_config::AppConfig;
use vitals_correlator::CorrelatorHandler;
use vitals_ingest::{
    MqttTransport, MqttTransportConfig, NoopSource, SensorMessageHandler, SensorTopics, Source,
};
use vitals_storage::{AlertRuleStore, ReadingStore};

/// 启动后台任务，返回各任务句柄。
///
/// MQTT 只在采集或告警任一开启时连接。采集关闭时仍要驱动 event loop，
/// 告警发布才会真正发出，但不订阅传感器通道。
pub fn spawn_background(
    config: &AppConfig,
    reading_store: Arc<dyn ReadingStore>,
    alert_store: Arc<dyn AlertRuleStore>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::new();
    let handler: Arc<dyn SensorMessageHandler> = Arc::new(CorrelatorHandler::new(reading_store));

    let (source, publisher): (Arc<dyn Source>, Arc<dyn NotificationPublisher>) =
        if config.mqtt_enabled() {
            let transport = MqttTransport::new(&MqttTransportConfig {
                host: config.mqtt_host.clone(),
                port: config.mqtt_port,
                username: config.mqtt_username.clone(),
                password: config.mqtt_password.clone(),
                qos: config.mqtt_qos,
            });
            let publisher = MqttNotificationPublisher::new(
                transport.client(),
                config.alert_topic.clone(),
                config.mqtt_qos,
            );
            let topics = SensorTopics {
                heart_rate: config.heart_topic.clone(),
                blood_pressure: config.bp_topic.clone(),
            };
            info!(
                target: "vitals.ingest",
                host = %config.mqtt_host,
                port = config.mqtt_port,
                heart_topic = %topics.heart_rate,
                bp_topic = %topics.blood_pressure,
                alert_topic = %config.alert_topic,
                "mqtt_transport_configured"
            );
            let source = transport.into_source(topics);
            let source = if config.ingest_enabled {
                source
            } else {
                source.publish_only()
            };
            (Arc::new(source), Arc::new(publisher))
        } else {
            info!(target: "vitals.ingest", "mqtt transport disabled");
            (Arc::new(NoopSource), Arc::new(NoopPublisher))
        };

    handles.push(tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            warn!(target: "vitals.ingest", error = %err, "ingest_source_stopped");
        }
    }));

    if config.alerts_enabled {
        let scheduler = Arc::new(AlertScheduler::new(alert_store, publisher));
        info!(target: "vitals.alerting", clock = ?config.alert_clock, "alert scheduler enabled");
        handles.push(spawn_alert_scheduler(scheduler, config.alert_clock));
    }
    handles
}
