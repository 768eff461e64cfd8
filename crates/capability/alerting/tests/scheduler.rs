use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use vitals_alerting::{AlertError, AlertScheduler, NoopPublisher, NotificationPublisher, TickReport};
use vitals_storage::{
    AlertRuleRecord, AlertRuleStore, InMemoryAlertRuleStore, OutboxRecord, StorageError,
};

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl RecordingPublisher {
    async fn sent(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, message: &str) -> Result<(), AlertError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AlertError::Publish("broker unavailable".to_string()));
        }
        self.sent.lock().await.push(message.to_string());
        Ok(())
    }
}

/// 包装内存实现，按需让部分调用失败。
#[derive(Default)]
struct FlakyAlertStore {
    inner: InMemoryAlertRuleStore,
    mark_delivered_failures: AtomicUsize,
    fire_fails_for: Mutex<Option<i64>>,
    pending_fails: AtomicBool,
}

#[async_trait::async_trait]
impl AlertRuleStore for FlakyAlertStore {
    async fn insert_alert_rule(
        &self,
        time: &str,
        message: &str,
    ) -> Result<AlertRuleRecord, StorageError> {
        self.inner.insert_alert_rule(time, message).await
    }

    async fn list_alert_rules(&self) -> Result<Vec<AlertRuleRecord>, StorageError> {
        self.inner.list_alert_rules().await
    }

    async fn delete_alert_rule(&self, id: i64) -> Result<bool, StorageError> {
        self.inner.delete_alert_rule(id).await
    }

    async fn mark_triggered(&self, id: i64) -> Result<bool, StorageError> {
        self.inner.mark_triggered(id).await
    }

    async fn unfired_rules_at(&self, hhmm: &str) -> Result<Vec<AlertRuleRecord>, StorageError> {
        self.inner.unfired_rules_at(hhmm).await
    }

    async fn fire_rule(
        &self,
        rule: &AlertRuleRecord,
        tick: &str,
        now_ms: i64,
    ) -> Result<Option<OutboxRecord>, StorageError> {
        if *self.fire_fails_for.lock().await == Some(rule.id) {
            return Err(StorageError::new("database is locked"));
        }
        self.inner.fire_rule(rule, tick, now_ms).await
    }

    async fn pending_notifications(&self) -> Result<Vec<OutboxRecord>, StorageError> {
        if self.pending_fails.load(Ordering::SeqCst) {
            return Err(StorageError::new("database is locked"));
        }
        self.inner.pending_notifications().await
    }

    async fn mark_delivered(&self, outbox_id: i64) -> Result<bool, StorageError> {
        let remaining = self.mark_delivered_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.mark_delivered_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::new("database is locked"));
        }
        self.inner.mark_delivered(outbox_id).await
    }
}

async fn triggered_messages(store: &dyn AlertRuleStore) -> Vec<String> {
    let mut fired: Vec<String> = store
        .list_alert_rules()
        .await
        .expect("list")
        .into_iter()
        .filter(|rule| rule.triggered)
        .map(|rule| rule.message)
        .collect();
    fired.sort();
    fired
}

fn scheduler_with(
    store: Arc<InMemoryAlertRuleStore>,
    publisher: Arc<RecordingPublisher>,
) -> AlertScheduler {
    AlertScheduler::new(store, publisher)
}

#[tokio::test]
async fn matching_tick_publishes_once() {
    let store = Arc::new(InMemoryAlertRuleStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(store.clone(), publisher.clone());
    let rule = store
        .insert_alert_rule("09:00", "Take medication")
        .await
        .expect("insert");

    let report = scheduler.tick("09:00").await.expect("tick");
    assert_eq!(report.matched, 1);
    assert_eq!(report.fired, 1);
    assert_eq!(report.published, 1);
    assert_eq!(publisher.sent().await, vec!["Take medication".to_string()]);

    let rules = store.list_alert_rules().await.expect("list");
    assert!(rules.iter().any(|r| r.id == rule.id && r.triggered));

    let again = scheduler.tick("09:00").await.expect("tick again");
    assert_eq!(again, TickReport::default());
    assert_eq!(publisher.sent().await.len(), 1);
}

#[tokio::test]
async fn non_matching_tick_changes_nothing() {
    let store = Arc::new(InMemoryAlertRuleStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(store.clone(), publisher.clone());
    store.insert_alert_rule("09:00", "Take medication").await.expect("insert");

    let report = scheduler.tick("09:01").await.expect("tick");
    assert_eq!(report, TickReport::default());
    assert!(publisher.sent().await.is_empty());
    assert!(store.outbox().is_empty());
    let rules = store.list_alert_rules().await.expect("list");
    assert!(rules.iter().all(|r| !r.triggered));
}

#[tokio::test]
async fn every_rule_of_the_minute_fires() {
    let store = Arc::new(InMemoryAlertRuleStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(store.clone(), publisher.clone());
    store.insert_alert_rule("07:30", "Breakfast").await.expect("insert");
    store.insert_alert_rule("07:30", "Blood pressure check").await.expect("insert");
    store.insert_alert_rule("08:00", "Walk").await.expect("insert");

    let report = scheduler.tick("07:30").await.expect("tick");
    assert_eq!(report.fired, 2);
    let mut sent = publisher.sent().await;
    sent.sort();
    assert_eq!(sent, vec!["Blood pressure check", "Breakfast"]);
}

#[tokio::test]
async fn failed_publish_is_replayed_once() {
    let store = Arc::new(InMemoryAlertRuleStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(store.clone(), publisher.clone());
    store.insert_alert_rule("21:00", "Evening pills").await.expect("insert");

    publisher.set_offline(true);
    let report = scheduler.tick("21:00").await.expect("tick");
    assert_eq!(report.fired, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(store.pending_notifications().await.expect("pending").len(), 1);

    publisher.set_offline(false);
    let report = scheduler.tick("21:01").await.expect("replay");
    assert_eq!(report.replayed, 1);
    assert_eq!(report.fired, 0);
    assert_eq!(publisher.sent().await, vec!["Evening pills".to_string()]);

    let report = scheduler.tick("21:02").await.expect("quiet");
    assert_eq!(report, TickReport::default());
    assert_eq!(publisher.sent().await.len(), 1);
}

#[tokio::test]
async fn noop_publisher_marks_delivered() {
    let store = Arc::new(InMemoryAlertRuleStore::new());
    let scheduler = AlertScheduler::new(store.clone(), Arc::new(NoopPublisher));
    store.insert_alert_rule("12:00", "Lunch").await.expect("insert");

    let report = scheduler.tick("12:00").await.expect("tick");
    assert_eq!(report.published, 1);
    assert!(store.pending_notifications().await.expect("pending").is_empty());
}

#[tokio::test]
async fn mark_delivered_failure_does_not_stop_other_rules() {
    let store = Arc::new(FlakyAlertStore::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = AlertScheduler::new(store.clone(), publisher.clone());
    store.insert_alert_rule("07:30", "Breakfast").await.expect("insert");
    store.insert_alert_rule("07:30", "Blood pressure check").await.expect("insert");
    store.mark_delivered_failures.store(1, Ordering::SeqCst);

    let report = scheduler.tick("07:30").await.expect("tick");
    assert_eq!(report.matched, 2);
    assert_eq!(report.fired, 2);
    assert_eq!(report.published, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(
        triggered_messages(store.as_ref()).await,
        vec!["Blood pressure check", "Breakfast"]
    );
    assert_eq!(
        publisher.sent().await,
        vec!["Breakfast".to_string(), "Blood pressure check".to_string()]
    );
    let pending = store.pending_notifications().await.expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].message, "Breakfast");

    let report = scheduler.tick("07:31").await.expect("replay");
    assert_eq!(report.replayed, 1);
    assert_eq!(report.failed, 0);
    assert!(store.pending_notifications().await.expect("pending").is_empty());
    assert_eq!(
        publisher.sent().await,
        vec![
            "Breakfast".to_string(),
            "Blood pressure check".to_string(),
            "Breakfast".to_string(),
        ]
    );
}

#[tokio::test]
async fn fire_failure_skips_only_that_rule() {
    let store = Arc::new(FlakyAlertStore::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = AlertScheduler::new(store.clone(), publisher.clone());
    let first = store.insert_alert_rule("07:30", "Breakfast").await.expect("insert");
    store.insert_alert_rule("07:30", "Blood pressure check").await.expect("insert");
    *store.fire_fails_for.lock().await = Some(first.id);

    let report = scheduler.tick("07:30").await.expect("tick");
    assert_eq!(report.matched, 2);
    assert_eq!(report.fired, 1);
    assert_eq!(report.published, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(publisher.sent().await, vec!["Blood pressure check".to_string()]);
    assert_eq!(
        triggered_messages(store.as_ref()).await,
        vec!["Blood pressure check"]
    );
}

#[tokio::test]
async fn outbox_read_failure_still_matches_the_minute() {
    let store = Arc::new(FlakyAlertStore::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = AlertScheduler::new(store.clone(), publisher.clone());
    store.insert_alert_rule("09:00", "Take medication").await.expect("insert");
    store.pending_fails.store(true, Ordering::SeqCst);

    let report = scheduler.tick("09:00").await.expect("tick");
    assert_eq!(report.fired, 1);
    assert_eq!(report.published, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(publisher.sent().await, vec!["Take medication".to_string()]);
}
