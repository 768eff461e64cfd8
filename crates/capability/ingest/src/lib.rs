use async_trait::async_trait;
use domain::{SensorChannel, SensorMessage};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vitals_telemetry::{record_message_ignored, record_message_received};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// SensorMessage 处理器。
#[async_trait]
pub trait SensorMessageHandler: Send + Sync {
    async fn handle(&self, message: SensorMessage) -> Result<(), IngestError>;
}

/// 采集源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn SensorMessageHandler>) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(&self, _handler: Arc<dyn SensorMessageHandler>) -> Result<(), IngestError> {
        Ok(())
    }
}

/// 通道与 topic 的对应关系。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTopics {
    pub heart_rate: String,
    pub blood_pressure: String,
}

impl Default for SensorTopics {
    fn default() -> Self {
        Self {
            heart_rate: SensorChannel::HeartRate.default_topic().to_string(),
            blood_pressure: SensorChannel::BloodPressure.default_topic().to_string(),
        }
    }
}

impl SensorTopics {
    pub fn topic_for(&self, channel: SensorChannel) -> &str {
        match channel {
            SensorChannel::HeartRate => &self.heart_rate,
            SensorChannel::BloodPressure => &self.blood_pressure,
        }
    }

    /// 未知 topic 返回 `None`。
    pub fn channel_for(&self, topic: &str) -> Option<SensorChannel> {
        SensorChannel::ALL
            .into_iter()
            .find(|channel| self.topic_for(*channel) == topic)
    }
}

/// payload 按 UTF-8 解码并去掉首尾空白；非法 UTF-8 返回 `None`。
pub fn decode_payload(payload: &[u8]) -> Option<String> {
    std::str::from_utf8(payload)
        .ok()
        .map(|text| text.trim().to_string())
}

/// MQTT 连接配置。
#[derive(Debug, Clone)]
pub struct MqttTransportConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub qos: u8,
}

pub fn qos_from_u8(value: u8) -> QoS {
    match value {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

/// 共享的 MQTT 连接：订阅与告警发布走同一个 event loop。
///
/// `client()` 返回的 `AsyncClient` 可以克隆给告警发布器使用；
/// event loop 本身由 `into_source` 交给 `MqttSource` 驱动。
pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
    qos: QoS,
}

impl MqttTransport {
    pub fn new(config: &MqttTransportConfig) -> Self {
        let client_id = format!("vitals-{}", uuid::Uuid::new_v4());
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) =
            (config.username.as_ref(), config.password.as_ref())
        {
            options.set_credentials(username, password);
        }
        let (client, eventloop) = AsyncClient::new(options, 10);
        Self {
            client,
            eventloop,
            qos: qos_from_u8(config.qos),
        }
    }

    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    pub fn into_source(self, topics: SensorTopics) -> MqttSource {
        MqttSource {
            client: self.client,
            eventloop: Mutex::new(self.eventloop),
            topics,
            qos: self.qos,
            subscribe: true,
        }
    }
}

/// MQTT 采集源。
///
/// 每次 ConnAck 后重新订阅全部通道；event loop 出错时退避 1 秒继续 poll，
/// 由 rumqttc 负责重连。
pub struct MqttSource {
    client: AsyncClient,
    eventloop: Mutex<EventLoop>,
    topics: SensorTopics,
    qos: QoS,
    subscribe: bool,
}

impl MqttSource {
    pub fn topics(&self) -> &SensorTopics {
        &self.topics
    }

    /// 只驱动 event loop（供告警发布使用），不订阅传感器通道。
    pub fn publish_only(mut self) -> Self {
        self.subscribe = false;
        self
    }

    fn subscribe_all(&self) {
        if !self.subscribe {
            return;
        }
        for channel in SensorChannel::ALL {
            let topic = self.topics.topic_for(channel);
            match self.client.try_subscribe(topic, self.qos) {
                Ok(()) => info!(target: "vitals.ingest", topic = %topic, "mqtt_subscribe"),
                Err(err) => {
                    warn!(target: "vitals.ingest", topic = %topic, error = %err, "mqtt_subscribe_failed")
                }
            }
        }
    }

    async fn dispatch(&self, handler: &Arc<dyn SensorMessageHandler>, topic: &str, payload: &[u8]) {
        record_message_received();
        let Some(channel) = self.topics.channel_for(topic) else {
            record_message_ignored();
            warn!(target: "vitals.ingest", topic = %topic, "sensor_topic_ignored");
            return;
        };
        let Some(payload) = decode_payload(payload) else {
            record_message_ignored();
            warn!(target: "vitals.ingest", topic = %topic, "sensor_payload_not_utf8");
            return;
        };
        debug!(target: "vitals.ingest", topic = %topic, payload = %payload, "sensor_message");
        let message = SensorMessage {
            channel,
            topic: topic.to_string(),
            payload,
            received_at_ms: now_epoch_ms(),
        };
        if let Err(err) = handler.handle(message).await {
            warn!(target: "vitals.ingest", topic = %topic, error = %err, "sensor_handler_failed");
        }
    }
}

#[async_trait]
impl Source for MqttSource {
    async fn run(&self, handler: Arc<dyn SensorMessageHandler>) -> Result<(), IngestError> {
        let mut eventloop = self
            .eventloop
            .try_lock()
            .map_err(|_| IngestError::Source("mqtt source already running".to_string()))?;
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(target: "vitals.ingest", "mqtt_connected");
                    self.subscribe_all();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.dispatch(&handler, &publish.topic, &publish.payload)
                        .await;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(target: "vitals.ingest", error = %err, "mqtt_eventloop_error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

pub fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
