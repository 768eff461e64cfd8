//! 认证能力：注册、登录、JWT 生成与校验。

mod jwt;
mod password;

use async_trait::async_trait;
use domain::UserContext;
use std::sync::Arc;
use vitals_storage::{NewUser, UserRecord, UserStore};

pub use jwt::JwtManager;
pub use password::{hash_password, verify_password};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already registered")]
    EmailTaken,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

/// 登录/刷新返回的 token 结构。
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_jti: String,
    pub expires_at: u64,
}

/// 注册输入（已通过基础校验）。
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: i64,
    pub gender: String,
    pub cholesterol: Option<i64>,
    pub chest_pain_type: Option<String>,
    /// 未同意提供健康数据时，胆固醇按未知（0）处理，胸痛类型不保存。
    pub health_consent: bool,
}

/// 登录结果。
pub struct LoginOutcome {
    pub user: UserRecord,
    pub tokens: AuthTokens,
    /// 首次登录需要引导配对传感器桥；返回后标记即被清除。
    pub pairing_required: bool,
}

/// 认证服务实现（基于 UserStore + JWT）。
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    jwt: JwtManager,
}

impl AuthService {
    /// 创建认证服务实例。
    pub fn new(user_store: Arc<dyn UserStore>, jwt: JwtManager) -> Self {
        Self { user_store, jwt }
    }

    /// 注册新用户；邮箱重复返回 `EmailTaken`。
    pub async fn signup(&self, input: SignupInput) -> Result<UserRecord, AuthError> {
        let password_hash = hash_password(&input.password)?;
        let (cholesterol, chest_pain_type) = if input.health_consent {
            (input.cholesterol.unwrap_or(0), input.chest_pain_type)
        } else {
            (0, None)
        };
        self.user_store
            .create_user(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
                age: input.age,
                gender: input.gender,
                cholesterol,
                chest_pain_type,
            })
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?
            .ok_or(AuthError::EmailTaken)
    }

    /// 登录校验并签发 token。
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self
            .user_store
            .find_by_email(email)
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&user.password_hash, password)? {
            return Err(AuthError::InvalidCredentials);
        }
        let ctx = user.to_user_context();
        let tokens = self.jwt.issue_tokens(&ctx)?;
        let updated = self
            .user_store
            .set_refresh_jti(ctx.user_id, Some(&tokens.refresh_jti))
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        if !updated {
            return Err(AuthError::Internal("refresh token binding update failed".to_string()));
        }
        let pairing_required = self
            .user_store
            .clear_first_login(ctx.user_id)
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        Ok(LoginOutcome {
            user,
            tokens,
            pairing_required,
        })
    }

    /// 校验 access token 并提取 UserContext。
    pub fn verify_access_token(&self, token: &str) -> Result<UserContext, AuthError> {
        self.jwt.decode_access(token)
    }

    /// 使用 refresh token 换取新 token（旧 refresh token 随即失效）。
    pub async fn refresh(&self, token: &str) -> Result<AuthTokens, AuthError> {
        let (ctx, jti) = self.jwt.decode_refresh(token)?;
        let stored = self
            .user_store
            .get_refresh_jti(ctx.user_id)
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        if stored.as_deref() != Some(jti.as_str()) {
            return Err(AuthError::TokenInvalid);
        }

        let tokens = self.jwt.issue_tokens(&ctx)?;
        let updated = self
            .user_store
            .set_refresh_jti(ctx.user_id, Some(&tokens.refresh_jti))
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        if !updated {
            return Err(AuthError::Internal("refresh token rotation update failed".to_string()));
        }
        Ok(tokens)
    }

    /// 登出：作废当前 refresh token。
    pub async fn logout(&self, ctx: &UserContext) -> Result<(), AuthError> {
        self.user_store
            .set_refresh_jti(ctx.user_id, None)
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        Ok(())
    }
}

/// 认证能力 trait，便于替换实现与测试。
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn signup(&self, input: SignupInput) -> Result<UserRecord, AuthError>;
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError>;
    fn verify_access_token(&self, token: &str) -> Result<UserContext, AuthError>;
    async fn refresh(&self, token: &str) -> Result<AuthTokens, AuthError>;
    async fn logout(&self, ctx: &UserContext) -> Result<(), AuthError>;
}

#[async_trait]
impl Authenticator for AuthService {
    async fn signup(&self, input: SignupInput) -> Result<UserRecord, AuthError> {
        self.signup(input).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        self.login(email, password).await
    }

    fn verify_access_token(&self, token: &str) -> Result<UserContext, AuthError> {
        self.verify_access_token(token)
    }

    async fn refresh(&self, token: &str) -> Result<AuthTokens, AuthError> {
        self.refresh(token).await
    }

    async fn logout(&self, ctx: &UserContext) -> Result<(), AuthError> {
        self.logout(ctx).await
    }
}
