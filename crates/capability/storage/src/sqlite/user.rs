//! SQLite 用户存储实现
//!
//! 设计要点：
//! - 邮箱唯一约束，重复注册通过 `on conflict do nothing` 识别
//! - refresh token jti 与用户同表保存，登出时置空

use crate::error::StorageError;
use crate::models::{NewUser, UserRecord};
use crate::traits::UserStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str = "id, name, email, password_hash, age, gender, cholesterol, \
     chest_pain_type, first_login, paired_bridge";

pub struct SqliteUserStore {
    pub pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &SqliteRow) -> Result<UserRecord, StorageError> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        age: row.try_get("age")?,
        gender: row.try_get("gender")?,
        cholesterol: row.try_get("cholesterol")?,
        chest_pain_type: row.try_get("chest_pain_type")?,
        first_login: row.try_get("first_login")?,
        paired_bridge: row.try_get("paired_bridge")?,
    })
}

#[async_trait::async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, user: NewUser) -> Result<Option<UserRecord>, StorageError> {
        let result = sqlx::query(
            "insert into users \
             (name, email, password_hash, age, gender, cholesterol, chest_pain_type, first_login) \
             values (?, ?, ?, ?, ?, ?, ?, 1) \
             on conflict (email) do nothing",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.age)
        .bind(&user.gender)
        .bind(user.cholesterol)
        .bind(&user.chest_pain_type)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(UserRecord {
            id: result.last_insert_rowid(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            age: user.age,
            gender: user.gender,
            cholesterol: user.cholesterol,
            chest_pain_type: user.chest_pain_type,
            first_login: true,
            paired_bridge: None,
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let sql = format!("select {USER_COLUMNS} from users where email = ?");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, StorageError> {
        let sql = format!("select {USER_COLUMNS} from users where id = ?");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn clear_first_login(&self, user_id: i64) -> Result<bool, StorageError> {
        let result =
            sqlx::query("update users set first_login = 0 where id = ? and first_login = 1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_paired_bridge(
        &self,
        user_id: i64,
        bridge_url: &str,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("update users set paired_bridge = ? where id = ?")
            .bind(bridge_url)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_refresh_jti(
        &self,
        user_id: i64,
        jti: Option<&str>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("update users set refresh_jti = ? where id = ?")
            .bind(jti)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_refresh_jti(&self, user_id: i64) -> Result<Option<String>, StorageError> {
        let jti: Option<Option<String>> =
            sqlx::query_scalar("select refresh_jti from users where id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(jti.flatten())
    }
}
