//! 告警规则与发件箱内存实现
//!
//! 规则与发件箱放在同一把锁下，`fire_rule` 的翻转与入箱因此是原子的。

use crate::error::StorageError;
use crate::models::{AlertRuleRecord, OutboxRecord};
use crate::traits::AlertRuleStore;
use crate::validation::ensure_alert_time;
use std::sync::RwLock;

struct AlertState {
    rules: Vec<AlertRuleRecord>,
    outbox: Vec<OutboxRecord>,
    next_rule_id: i64,
    next_outbox_id: i64,
}

/// 告警规则内存存储
pub struct InMemoryAlertRuleStore {
    state: RwLock<AlertState>,
}

impl InMemoryAlertRuleStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(AlertState {
                rules: Vec::new(),
                outbox: Vec::new(),
                next_rule_id: 1,
                next_outbox_id: 1,
            }),
        }
    }

    /// 发件箱全部条目（含已发布，用于测试）
    pub fn outbox(&self) -> Vec<OutboxRecord> {
        self.state
            .read()
            .map(|state| state.outbox.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryAlertRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AlertRuleStore for InMemoryAlertRuleStore {
    async fn insert_alert_rule(
        &self,
        time: &str,
        message: &str,
    ) -> Result<AlertRuleRecord, StorageError> {
        ensure_alert_time(time)?;
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let record = AlertRuleRecord {
            id: state.next_rule_id,
            time: time.to_string(),
            message: message.to_string(),
            triggered: false,
        };
        state.next_rule_id += 1;
        state.rules.push(record.clone());
        Ok(record)
    }

    async fn list_alert_rules(&self) -> Result<Vec<AlertRuleRecord>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state.rules.clone())
    }

    async fn delete_alert_rule(&self, id: i64) -> Result<bool, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = state.rules.len();
        state.rules.retain(|rule| rule.id != id);
        Ok(state.rules.len() != before)
    }

    async fn mark_triggered(&self, id: i64) -> Result<bool, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match state.rules.iter_mut().find(|rule| rule.id == id) {
            Some(rule) if !rule.triggered => {
                rule.triggered = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn unfired_rules_at(&self, hhmm: &str) -> Result<Vec<AlertRuleRecord>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state
            .rules
            .iter()
            .filter(|rule| rule.time == hhmm && !rule.triggered)
            .cloned()
            .collect())
    }

    async fn fire_rule(
        &self,
        rule: &AlertRuleRecord,
        tick: &str,
        now_ms: i64,
    ) -> Result<Option<OutboxRecord>, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(stored) = state
            .rules
            .iter_mut()
            .find(|item| item.id == rule.id && !item.triggered)
        else {
            return Ok(None);
        };
        stored.triggered = true;
        let entry = OutboxRecord {
            id: state.next_outbox_id,
            rule_id: rule.id,
            tick: tick.to_string(),
            message: rule.message.clone(),
            delivered: false,
            created_at_ms: now_ms,
        };
        state.next_outbox_id += 1;
        state.outbox.push(entry.clone());
        Ok(Some(entry))
    }

    async fn pending_notifications(&self) -> Result<Vec<OutboxRecord>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state
            .outbox
            .iter()
            .filter(|entry| !entry.delivered)
            .cloned()
            .collect())
    }

    async fn mark_delivered(&self, outbox_id: i64) -> Result<bool, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match state.outbox.iter_mut().find(|entry| entry.id == outbox_id) {
            Some(entry) if !entry.delivered => {
                entry.delivered = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
