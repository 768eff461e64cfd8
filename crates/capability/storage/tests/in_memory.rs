use domain::CompletedReading;
use vitals_storage::{
    AlertRuleStore, InMemoryAlertRuleStore, InMemoryReadingStore, InMemoryUserStore, NewUser,
    ReadingStore, UserStore,
};

fn reading(heart: &str, bp: &str, ts_ms: i64) -> CompletedReading {
    CompletedReading {
        heartsensor: heart.to_string(),
        bp: bp.to_string(),
        ts_ms,
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Alice".to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        age: 54,
        gender: "F".to_string(),
        cholesterol: 230,
        chest_pain_type: Some("typical angina".to_string()),
    }
}

#[tokio::test]
async fn recent_readings_newest_first() {
    let store = InMemoryReadingStore::new();
    store.insert_reading(&reading("70", "110/70", 1)).await.expect("a");
    store.insert_reading(&reading("72", "120/80", 2)).await.expect("b");
    store.insert_reading(&reading("75", "125/85", 3)).await.expect("c");

    let recent = store.recent_readings(2).await.expect("recent");
    let hearts: Vec<_> = recent
        .iter()
        .map(|item| item.heartsensor.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(hearts, vec!["75", "72"]);
    assert!(recent[0].id > recent[1].id);

    let latest = store.latest_reading().await.expect("latest").expect("some");
    assert_eq!(latest.bp.as_deref(), Some("125/85"));
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn empty_store_has_no_latest() {
    let store = InMemoryReadingStore::new();
    assert!(store.latest_reading().await.expect("latest").is_none());
    assert!(store.recent_readings(10).await.expect("recent").is_empty());
}

#[tokio::test]
async fn alert_rules_round_trip() {
    let store = InMemoryAlertRuleStore::new();
    let first = store.insert_alert_rule("09:00", "take meds").await.expect("insert");
    let second = store.insert_alert_rule("21:30", "walk").await.expect("insert");
    assert!(!first.triggered);
    assert_ne!(first.id, second.id);

    let rules = store.list_alert_rules().await.expect("list");
    assert_eq!(rules.len(), 2);

    assert!(store.delete_alert_rule(first.id).await.expect("delete"));
    assert!(!store.delete_alert_rule(first.id).await.expect("delete again"));
    assert_eq!(store.list_alert_rules().await.expect("list").len(), 1);
}

#[tokio::test]
async fn alert_rule_rejects_unpadded_time() {
    let store = InMemoryAlertRuleStore::new();
    assert!(store.insert_alert_rule("9:00", "late").await.is_err());
}

#[tokio::test]
async fn fire_rule_enqueues_once() {
    let store = InMemoryAlertRuleStore::new();
    let rule = store.insert_alert_rule("09:00", "take meds").await.expect("insert");

    let entry = store
        .fire_rule(&rule, "09:00", 100)
        .await
        .expect("fire")
        .expect("entry");
    assert_eq!(entry.rule_id, rule.id);
    assert_eq!(entry.message, "take meds");
    assert!(store.fire_rule(&rule, "09:00", 200).await.expect("fire").is_none());

    assert!(store.unfired_rules_at("09:00").await.expect("unfired").is_empty());
    let pending = store.pending_notifications().await.expect("pending");
    assert_eq!(pending.len(), 1);

    assert!(store.mark_delivered(entry.id).await.expect("deliver"));
    assert!(store.pending_notifications().await.expect("pending").is_empty());
    assert_eq!(store.outbox().len(), 1);
}

#[tokio::test]
async fn mark_triggered_flips_once() {
    let store = InMemoryAlertRuleStore::new();
    let rule = store.insert_alert_rule("07:15", "stretch").await.expect("insert");
    assert!(store.mark_triggered(rule.id).await.expect("flip"));
    assert!(!store.mark_triggered(rule.id).await.expect("flip again"));
    assert!(!store.mark_triggered(999).await.expect("missing"));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let store = InMemoryUserStore::new();
    let created = store.create_user(new_user("a@example.com")).await.expect("create");
    assert!(created.is_some());
    let duplicate = store.create_user(new_user("a@example.com")).await.expect("create");
    assert!(duplicate.is_none());
}

#[tokio::test]
async fn first_login_clears_once() {
    let store = InMemoryUserStore::new();
    let user = store
        .create_user(new_user("b@example.com"))
        .await
        .expect("create")
        .expect("user");
    assert!(user.first_login);
    assert!(store.clear_first_login(user.id).await.expect("clear"));
    assert!(!store.clear_first_login(user.id).await.expect("clear again"));

    assert!(store
        .set_paired_bridge(user.id, "mqtt://192.168.1.20:1883")
        .await
        .expect("pair"));
    let found = store.find_by_id(user.id).await.expect("find").expect("user");
    assert_eq!(found.paired_bridge.as_deref(), Some("mqtt://192.168.1.20:1883"));
    assert!(!found.first_login);
}

#[tokio::test]
async fn refresh_jti_set_and_cleared() {
    let store = InMemoryUserStore::new();
    let user = store
        .create_user(new_user("c@example.com"))
        .await
        .expect("create")
        .expect("user");
    store.set_refresh_jti(user.id, Some("jti-1")).await.expect("set");
    assert_eq!(
        store.get_refresh_jti(user.id).await.expect("get").as_deref(),
        Some("jti-1")
    );
    store.set_refresh_jti(user.id, None).await.expect("clear");
    assert!(store.get_refresh_jti(user.id).await.expect("get").is_none());
}
