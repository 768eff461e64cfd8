use serde_json::json;
use vitals_scoring::{
    ADVISORY_MESSAGE, ProcessRiskScorer, ProcessScorerConfig, RiskFeatures, RiskScorer,
    ScoringError, StaticRiskScorer, parse_prediction, sensor_value,
};

fn scorer(program: &str, timeout_ms: u64) -> ProcessRiskScorer {
    ProcessRiskScorer::new(ProcessScorerConfig {
        program: program.to_string(),
        script: "smartdata.py".to_string(),
        reduced_script: "smartdatanor.py".to_string(),
        timeout_ms,
    })
}

#[test]
fn full_features_include_cholesterol_and_chest_pain() {
    let features = RiskFeatures::new(54, "male", 230, Some("asymptomatic"), "130", "150");
    let value = serde_json::to_value(&features).expect("json");
    assert_eq!(
        value,
        json!({
            "age": 54,
            "trestbps": 130,
            "thalch": 150,
            "sex": "male",
            "chol": 230,
            "cp": "asymptomatic"
        })
    );
    assert_eq!(scorer("python", 1000).script_for(&features), "smartdata.py");
}

#[test]
fn unknown_cholesterol_uses_reduced_model() {
    let features = RiskFeatures::new(61, "female", 0, Some("typical"), "120/80", "72");
    let value = serde_json::to_value(&features).expect("json");
    assert_eq!(
        value,
        json!({ "age": 61, "trestbps": "120/80", "thalch": 72, "sex": "female" })
    );
    assert_eq!(scorer("python", 1000).script_for(&features), "smartdatanor.py");
}

#[test]
fn sensor_values_keep_non_numeric_text() {
    assert_eq!(sensor_value(" 72 "), json!(72));
    assert_eq!(sensor_value("98.6"), json!(98.6));
    assert_eq!(sensor_value("120/80"), json!("120/80"));
}

#[test]
fn prediction_parses_last_json_line() {
    let prediction = parse_prediction("loading model\n{\"alert_prediction\": \"False\"}\n")
        .expect("prediction");
    assert!(!prediction.alert_prediction);
    assert_eq!(prediction.advisory(), Some(ADVISORY_MESSAGE));

    let prediction = parse_prediction("{\"alert_prediction\": \"True\"}").expect("prediction");
    assert!(prediction.alert_prediction);
    assert_eq!(prediction.advisory(), None);
}

#[test]
fn prediction_rejects_unexpected_output() {
    assert!(matches!(parse_prediction(""), Err(ScoringError::Output(_))));
    assert!(matches!(
        parse_prediction("{\"alert_prediction\": \"maybe\"}"),
        Err(ScoringError::Output(_))
    ));
    assert!(matches!(parse_prediction("not json"), Err(ScoringError::Output(_))));
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let features = RiskFeatures::new(40, "male", 0, None, "120", "70");
    let err = scorer("vitals-scorer-does-not-exist", 1000)
        .score(&features)
        .await
        .expect_err("spawn");
    assert!(matches!(err, ScoringError::Spawn(_)));
}

#[tokio::test]
async fn static_scorer_reports_configured_prediction() {
    let features = RiskFeatures::new(40, "male", 0, None, "120", "70");
    let prediction = StaticRiskScorer::new(false)
        .score(&features)
        .await
        .expect("score");
    assert!(!prediction.alert_prediction);
    assert!(StaticRiskScorer::unavailable().score(&features).await.is_err());
}
