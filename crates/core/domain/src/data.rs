/// 传感器通道（heartsensor / bp）。
///
/// 通道之间相互独立，不保证到达顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorChannel {
    HeartRate,
    BloodPressure,
}

impl SensorChannel {
    /// 一次完整读数需要的全部通道。
    pub const ALL: [SensorChannel; 2] = [SensorChannel::HeartRate, SensorChannel::BloodPressure];

    /// 默认 topic 名称（与传感器桥约定）。
    pub fn default_topic(&self) -> &'static str {
        match self {
            SensorChannel::HeartRate => "heartsensor",
            SensorChannel::BloodPressure => "bp",
        }
    }
}

/// 传输层收到的一条传感器消息（payload 为不透明字符串）。
#[derive(Debug, Clone)]
pub struct SensorMessage {
    pub channel: SensorChannel,
    pub topic: String,
    pub payload: String,
    pub received_at_ms: i64,
}

/// 所有通道都已到齐、待写入的完整读数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedReading {
    pub heartsensor: String,
    pub bp: String,
    pub ts_ms: i64,
}
