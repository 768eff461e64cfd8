//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 告警调度使用的墙钟。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertClock {
    Local,
    Utc,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_access_ttl_seconds: u64,
    pub jwt_refresh_ttl_seconds: u64,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_qos: u8,
    pub heart_topic: String,
    pub bp_topic: String,
    pub alert_topic: String,
    pub ingest_enabled: bool,
    pub alerts_enabled: bool,
    pub alert_clock: AlertClock,
    pub scorer_program: String,
    pub scorer_script: String,
    pub scorer_reduced_script: String,
    pub scorer_timeout_ms: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("VITALS_JWT_SECRET")
            .map_err(|_| ConfigError::Missing("VITALS_JWT_SECRET".to_string()))?;
        let jwt_access_ttl_seconds = read_u64_with_default("VITALS_JWT_ACCESS_TTL_SECONDS", 1800)?;
        let jwt_refresh_ttl_seconds =
            read_u64_with_default("VITALS_JWT_REFRESH_TTL_SECONDS", 604_800)?;
        let http_addr = env::var("VITALS_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let database_url =
            env::var("VITALS_DATABASE_URL").unwrap_or_else(|_| "sqlite://database.db".to_string());
        let mqtt_host = env::var("VITALS_MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let mqtt_port = read_u16_with_default("VITALS_MQTT_PORT", 1883)?;
        let mqtt_username = read_optional("VITALS_MQTT_USERNAME");
        let mqtt_password = read_optional("VITALS_MQTT_PASSWORD");
        let mqtt_qos = read_u8_with_default("VITALS_MQTT_QOS", 0)?;
        if mqtt_qos > 2 {
            return Err(ConfigError::Invalid(
                "VITALS_MQTT_QOS".to_string(),
                mqtt_qos.to_string(),
            ));
        }
        let heart_topic = read_topic("VITALS_HEART_TOPIC", "heartsensor");
        let bp_topic = read_topic("VITALS_BP_TOPIC", "bp");
        let alert_topic = read_topic("VITALS_ALERT_TOPIC", "alert");
        let ingest_enabled = read_bool_with_default("VITALS_INGEST", false);
        let alerts_enabled = read_bool_with_default("VITALS_ALERTS", false);
        let alert_clock = read_alert_clock("VITALS_ALERT_CLOCK")?;
        let scorer_program =
            env::var("VITALS_SCORER_PROGRAM").unwrap_or_else(|_| "python".to_string());
        let scorer_script =
            env::var("VITALS_SCORER_SCRIPT").unwrap_or_else(|_| "smartdata.py".to_string());
        let scorer_reduced_script = env::var("VITALS_SCORER_REDUCED_SCRIPT")
            .unwrap_or_else(|_| "smartdatanor.py".to_string());
        let scorer_timeout_ms = read_u64_with_default("VITALS_SCORER_TIMEOUT_MS", 10_000)?;

        Ok(Self {
            http_addr,
            database_url,
            jwt_secret,
            jwt_access_ttl_seconds,
            jwt_refresh_ttl_seconds,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_qos,
            heart_topic,
            bp_topic,
            alert_topic,
            ingest_enabled,
            alerts_enabled,
            alert_clock,
            scorer_program,
            scorer_script,
            scorer_reduced_script,
            scorer_timeout_ms,
        })
    }

    /// 是否需要建立 MQTT 连接（采集或告警任一开启）。
    pub fn mqtt_enabled(&self) -> bool {
        self.ingest_enabled || self.alerts_enabled
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_topic(key: &str, default: &str) -> String {
    read_optional(key)
        .map(|value| value.trim_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

fn read_alert_clock(key: &str) -> Result<AlertClock, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(AlertClock::Local),
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "local" => Ok(AlertClock::Local),
        "utc" => Ok(AlertClock::Utc),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}
