//! 用户内存存储实现
//!
//! 仅用于本地演示和测试。邮箱唯一。

use crate::error::StorageError;
use crate::models::{NewUser, UserRecord};
use crate::traits::UserStore;
use std::collections::BTreeMap;
use std::sync::RwLock;

struct UserEntry {
    record: UserRecord,
    refresh_jti: Option<String>,
}

struct UserState {
    users: BTreeMap<i64, UserEntry>,
    next_id: i64,
}

/// 用户内存存储
pub struct InMemoryUserStore {
    state: RwLock<UserState>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(UserState {
                users: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn update<F>(&self, user_id: i64, apply: F) -> Result<bool, StorageError>
    where
        F: FnOnce(&mut UserEntry) -> bool,
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state.users.get_mut(&user_id).map(apply).unwrap_or(false))
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<Option<UserRecord>, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if state
            .users
            .values()
            .any(|entry| entry.record.email == user.email)
        {
            return Ok(None);
        }
        let record = UserRecord {
            id: state.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            age: user.age,
            gender: user.gender,
            cholesterol: user.cholesterol,
            chest_pain_type: user.chest_pain_type,
            first_login: true,
            paired_bridge: None,
        };
        state.next_id += 1;
        state.users.insert(
            record.id,
            UserEntry {
                record: record.clone(),
                refresh_jti: None,
            },
        );
        Ok(Some(record))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state
            .users
            .values()
            .find(|entry| entry.record.email == email)
            .map(|entry| entry.record.clone()))
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state.users.get(&user_id).map(|entry| entry.record.clone()))
    }

    async fn clear_first_login(&self, user_id: i64) -> Result<bool, StorageError> {
        self.update(user_id, |entry| {
            let was_first = entry.record.first_login;
            entry.record.first_login = false;
            was_first
        })
    }

    async fn set_paired_bridge(
        &self,
        user_id: i64,
        bridge_url: &str,
    ) -> Result<bool, StorageError> {
        self.update(user_id, |entry| {
            entry.record.paired_bridge = Some(bridge_url.to_string());
            true
        })
    }

    async fn set_refresh_jti(
        &self,
        user_id: i64,
        jti: Option<&str>,
    ) -> Result<bool, StorageError> {
        self.update(user_id, |entry| {
            entry.refresh_jti = jti.map(str::to_string);
            true
        })
    }

    async fn get_refresh_jti(&self, user_id: i64) -> Result<Option<String>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state
            .users
            .get(&user_id)
            .and_then(|entry| entry.refresh_jti.clone()))
    }
}
