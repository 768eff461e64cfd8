use crate::{AppState, build_app};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bytes::Bytes;
use domain::CompletedReading;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use vitals_auth::{AuthService, JwtManager};
use vitals_scoring::{ADVISORY_MESSAGE, RiskScorer, StaticRiskScorer};
use vitals_storage::{
    InMemoryAlertRuleStore, InMemoryReadingStore, InMemoryUserStore, ReadingStore,
};

struct TestApp {
    app: Router,
    readings: Arc<InMemoryReadingStore>,
}

fn test_app(scorer: StaticRiskScorer) -> TestApp {
    let users = Arc::new(InMemoryUserStore::new());
    let readings = Arc::new(InMemoryReadingStore::new());
    let alerts = Arc::new(InMemoryAlertRuleStore::new());
    let jwt = JwtManager::new("test-secret".to_string(), 3600, 7200);
    let scorer: Arc<dyn RiskScorer> = Arc::new(scorer);
    let state = AppState {
        auth: Arc::new(AuthService::new(users.clone(), jwt)),
        user_store: users,
        reading_store: readings.clone(),
        alert_store: alerts,
        scorer,
    };
    TestApp {
        app: build_app(state),
        readings,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes: Bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn signup_and_login(app: &Router, email: &str, cholesterol: i64) -> (String, Value) {
    let (status, _) = send(
        app,
        "POST",
        "/signup",
        None,
        Some(json!({
            "name": "Alice",
            "email": email,
            "password": "s3cret-pass",
            "age": 54,
            "gender": "female",
            "cholesterol": cholesterol,
            "chestPainType": "asymptomatic",
            "healthConsent": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": email, "password": "s3cret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["accessToken"]
        .as_str()
        .expect("access token")
        .to_string();
    (token, body)
}

#[tokio::test]
async fn health_is_public_and_traced() {
    let test = test_app(StaticRiskScorer::new(true));
    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-trace-id"));
}

#[tokio::test]
async fn first_login_requires_pairing_once() {
    let test = test_app(StaticRiskScorer::new(true));
    let (_, body) = signup_and_login(&test.app, "alice@example.com", 230).await;
    assert_eq!(body["data"]["pairingRequired"], json!(true));

    let (_, body) = send(
        &test.app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "s3cret-pass" })),
    )
    .await;
    assert_eq!(body["data"]["pairingRequired"], json!(false));
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let test = test_app(StaticRiskScorer::new(true));
    signup_and_login(&test.app, "bob@example.com", 0).await;
    let (status, body) = send(
        &test.app,
        "POST",
        "/signup",
        None,
        Some(json!({
            "name": "Bob",
            "email": "BOB@example.com",
            "password": "other",
            "age": 60,
            "gender": "male"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("RESOURCE.CONFLICT"));
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let test = test_app(StaticRiskScorer::new(true));
    for uri in ["/profile", "/readings", "/alerts", "/dashboard-data", "/metrics"] {
        let (status, body) = send(&test.app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"]["code"], json!("AUTH.UNAUTHORIZED"));
    }
    let (status, _) = send(&test.app, "GET", "/profile", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn pairing_validates_qr_text() {
    let test = test_app(StaticRiskScorer::new(true));
    let (token, _) = signup_and_login(&test.app, "carol@example.com", 0).await;

    let (status, body) = send(
        &test.app,
        "POST",
        "/pairing",
        Some(&token),
        Some(json!({ "qrText": "https://example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("INVALID.REQUEST"));

    let (status, _) = send(
        &test.app,
        "POST",
        "/pairing",
        Some(&token),
        Some(json!({ "qrText": "mqtt://192.168.1.20:1883" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&test.app, "GET", "/profile", Some(&token), None).await;
    assert_eq!(body["data"]["pairedBridge"], json!("mqtt://192.168.1.20:1883"));
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn alert_rules_crud() {
    let test = test_app(StaticRiskScorer::new(true));
    let (token, _) = signup_and_login(&test.app, "dave@example.com", 0).await;

    let (status, _) = send(
        &test.app,
        "POST",
        "/alerts",
        Some(&token),
        Some(json!({ "time": "25:00", "message": "bad" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &test.app,
        "POST",
        "/alerts",
        Some(&token),
        Some(json!({ "time": "09:00", "message": "Take medication" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["triggered"], json!(false));
    let id = body["data"]["id"].as_i64().expect("id");

    let (_, body) = send(&test.app, "GET", "/alerts", Some(&token), None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["time"], json!("09:00"));

    let uri = format!("/alerts/{id}");
    let (status, _) = send(&test.app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&test.app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("RESOURCE.NOT_FOUND"));
}

#[tokio::test]
async fn readings_are_newest_first_and_limit_is_checked() {
    let test = test_app(StaticRiskScorer::new(true));
    let (token, _) = signup_and_login(&test.app, "erin@example.com", 0).await;
    for (heart, bp, ts) in [("70", "110/70", 1), ("72", "120/80", 2), ("75", "125/85", 3)] {
        test.readings
            .insert_reading(&CompletedReading {
                heartsensor: heart.to_string(),
                bp: bp.to_string(),
                ts_ms: ts,
            })
            .await
            .expect("insert");
    }

    let (status, body) = send(&test.app, "GET", "/readings?limit=2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["heartsensor"], json!("75"));
    assert_eq!(body["data"][1]["heartsensor"], json!("72"));
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (_, body) = send(&test.app, "GET", "/readings/latest", Some(&token), None).await;
    assert_eq!(body["data"]["bp"], json!("125/85"));

    let (status, _) = send(&test.app, "GET", "/readings?limit=5000", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_reports_advisory_on_false_prediction() {
    let test = test_app(StaticRiskScorer::new(false));
    let (token, _) = signup_and_login(&test.app, "frank@example.com", 230).await;
    test.readings
        .insert_reading(&CompletedReading {
            heartsensor: "72".to_string(),
            bp: "120/80".to_string(),
            ts_ms: 1,
        })
        .await
        .expect("insert");

    let (status, body) = send(&test.app, "GET", "/dashboard-data", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["heartsensor"], json!("72"));
    assert_eq!(body["data"]["chol"], json!(230));
    assert_eq!(body["data"]["alertPrediction"], json!(false));
    assert_eq!(body["data"]["advisory"], json!(ADVISORY_MESSAGE));
}

#[tokio::test]
async fn dashboard_degrades_when_scorer_fails() {
    let test = test_app(StaticRiskScorer::unavailable());
    let (token, _) = signup_and_login(&test.app, "gina@example.com", 0).await;
    test.readings
        .insert_reading(&CompletedReading {
            heartsensor: "80".to_string(),
            bp: "130/85".to_string(),
            ts_ms: 1,
        })
        .await
        .expect("insert");

    let (status, body) = send(&test.app, "GET", "/dashboard-data", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bp"], json!("130/85"));
    assert_eq!(body["data"]["alertPrediction"], Value::Null);
    assert_eq!(body["data"]["chol"], Value::Null);
}

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let test = test_app(StaticRiskScorer::new(true));
    let (token, body) = signup_and_login(&test.app, "hank@example.com", 0).await;
    let refresh = body["data"]["refreshToken"]
        .as_str()
        .expect("refresh token")
        .to_string();

    let (status, _) = send(&test.app, "POST", "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &test.app,
        "POST",
        "/refresh-token",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
