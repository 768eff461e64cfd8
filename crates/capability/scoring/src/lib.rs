//! 风险评估能力：调用外部 ML 评分进程。
//!
//! 评分进程以 `program script <features-json>` 启动，标准输出为
//! `{"alert_prediction": "True" | "False"}`。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// 仪表盘在模型给出 "False" 时展示的提示语。
pub const ADVISORY_MESSAGE: &str = "Something is wrong. Please consult a doctor.";

/// 评分错误。
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("scorer timed out after {0} ms")]
    Timeout(u64),
    #[error("scorer exited with status {0}")]
    ExitStatus(String),
    #[error("invalid scorer output: {0}")]
    Output(String),
}

/// 评分特征。字段名与评分脚本约定一致。
///
/// `chol` / `cp` 仅在胆固醇已知（非 0）时出现，此时使用完整模型。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFeatures {
    pub age: i64,
    pub trestbps: serde_json::Value,
    pub thalch: serde_json::Value,
    pub sex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chol: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cp: Option<String>,
}

impl RiskFeatures {
    /// 由用户资料与最新读数组装特征。
    pub fn new(
        age: i64,
        gender: &str,
        cholesterol: i64,
        chest_pain_type: Option<&str>,
        bp: &str,
        heartsensor: &str,
    ) -> Self {
        let full = cholesterol != 0;
        Self {
            age,
            trestbps: sensor_value(bp),
            thalch: sensor_value(heartsensor),
            sex: gender.to_string(),
            chol: full.then_some(cholesterol),
            cp: if full {
                chest_pain_type.map(str::to_string)
            } else {
                None
            },
        }
    }

    /// 是否走完整模型。
    pub fn uses_full_model(&self) -> bool {
        self.chol.is_some()
    }
}

/// 数值型 payload 按 JSON 数字发送，其余保持原始字符串。
pub fn sensor_value(raw: &str) -> serde_json::Value {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return serde_json::Value::from(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => serde_json::Value::from(value),
        _ => serde_json::Value::String(raw.to_string()),
    }
}

/// 评分结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskPrediction {
    pub alert_prediction: bool,
}

impl RiskPrediction {
    /// 模型输出 "False" 时给出就医提示。
    pub fn advisory(&self) -> Option<&'static str> {
        if self.alert_prediction {
            None
        } else {
            Some(ADVISORY_MESSAGE)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScorerOutput {
    alert_prediction: String,
}

/// 解析评分进程的标准输出（取最后一行非空 JSON）。
pub fn parse_prediction(stdout: &str) -> Result<RiskPrediction, ScoringError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .ok_or_else(|| ScoringError::Output("empty output".to_string()))?;
    let output: ScorerOutput =
        serde_json::from_str(line).map_err(|err| ScoringError::Output(err.to_string()))?;
    match output.alert_prediction.as_str() {
        "True" => Ok(RiskPrediction {
            alert_prediction: true,
        }),
        "False" => Ok(RiskPrediction {
            alert_prediction: false,
        }),
        other => Err(ScoringError::Output(format!(
            "unexpected alert_prediction: {other}"
        ))),
    }
}

/// 风险评分抽象。
#[async_trait]
pub trait RiskScorer: Send + Sync {
    async fn score(&self, features: &RiskFeatures) -> Result<RiskPrediction, ScoringError>;
}

/// 外部进程评分配置。
#[derive(Debug, Clone)]
pub struct ProcessScorerConfig {
    pub program: String,
    pub script: String,
    pub reduced_script: String,
    pub timeout_ms: u64,
}

/// 以子进程方式调用评分脚本。
pub struct ProcessRiskScorer {
    config: ProcessScorerConfig,
}

impl ProcessRiskScorer {
    pub fn new(config: ProcessScorerConfig) -> Self {
        Self { config }
    }

    pub fn script_for(&self, features: &RiskFeatures) -> &str {
        if features.uses_full_model() {
            &self.config.script
        } else {
            &self.config.reduced_script
        }
    }
}

#[async_trait]
impl RiskScorer for ProcessRiskScorer {
    async fn score(&self, features: &RiskFeatures) -> Result<RiskPrediction, ScoringError> {
        let payload =
            serde_json::to_string(features).map_err(|err| ScoringError::Spawn(err.to_string()))?;
        let script = self.script_for(features);
        let mut command = Command::new(&self.config.program);
        if !script.is_empty() {
            command.arg(script);
        }
        command.arg(&payload).kill_on_drop(true);

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(result) => result.map_err(|err| ScoringError::Spawn(err.to_string()))?,
            Err(_) => {
                warn!(target: "vitals.scoring", script = %script, "scorer_timeout");
                return Err(ScoringError::Timeout(self.config.timeout_ms));
            }
        };
        if !output.status.success() {
            return Err(ScoringError::ExitStatus(output.status.to_string()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let prediction = parse_prediction(&stdout)?;
        info!(
            target: "vitals.scoring",
            script = %script,
            alert_prediction = prediction.alert_prediction,
            "scorer_prediction"
        );
        Ok(prediction)
    }
}

/// 固定返回值的评分器（未配置评分进程或测试时使用）。
#[derive(Debug, Clone, Copy)]
pub struct StaticRiskScorer {
    prediction: Option<RiskPrediction>,
}

impl StaticRiskScorer {
    pub fn new(alert_prediction: bool) -> Self {
        Self {
            prediction: Some(RiskPrediction { alert_prediction }),
        }
    }

    /// 始终失败，用于验证降级路径。
    pub fn unavailable() -> Self {
        Self { prediction: None }
    }
}

#[async_trait]
impl RiskScorer for StaticRiskScorer {
    async fn score(&self, _features: &RiskFeatures) -> Result<RiskPrediction, ScoringError> {
        self.prediction
            .ok_or_else(|| ScoringError::Spawn("scorer unavailable".to_string()))
    }
}
