use crate::{
    config::Config,
    error::{AppError, Result},
    models::notification::EmailLinkData,
    models::user::*,
    services::{dispatcher::{NotificationAction, NotificationHandler}, Database},
};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub email: String,
}

/// 已认证用户，由认证中间件写入请求扩展
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    config: Config,
    handler: NotificationHandler,
}

impl AuthService {
    pub async fn new(
        db: Arc<Database>,
        config: &Config,
        handler: NotificationHandler,
    ) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
            handler,
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<PublicUser> {
        request.validate().map_err(AppError::ValidatorError)?;

        if self.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }
        if self.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::conflict("Username already taken"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: request.username,
            email: request.email,
            password_hash: self.hash_password(&request.password)?,
            is_active: true,
            is_email_confirmed: false,
            confirm_token: None,
            confirm_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        let user = self.db.create("user", user).await?;
        info!("Registered user: {}", user.username);

        self.request_confirm_email(&user).await?;

        Ok(user.into())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        request.validate().map_err(AppError::ValidatorError)?;

        let user = self
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        if !self.verify_password(&request.password, &user.password_hash) {
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        if !user.is_active {
            return Err(AppError::unauthorized("User is not active"));
        }

        let access_token = self.generate_jwt(&user)?;
        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    /// 发送邮箱确认链接（注册后及重发时调用）
    pub async fn request_confirm_email(&self, user: &User) -> Result<()> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.config.confirm_token_expiry_hours);

        self.db
            .query_with_params(
                "UPDATE user SET confirm_token = $token, confirm_token_expires_at = $expires_at, \
                 updated_at = $now WHERE meta::id(id) = $id RETURN NONE",
                json!({
                    "id": user.id,
                    "token": token,
                    "expires_at": expires_at,
                    "now": Utc::now(),
                }),
            )
            .await?;

        self.handler
            .dispatch(NotificationAction::UserConfirmEmail(EmailLinkData {
                email: user.email.clone(),
                link: format!(
                    "{}/confirm-email?uid={}&token={}",
                    self.config.public_host, user.id, token
                ),
            }))
            .await
    }

    pub async fn resend_confirm_email(&self, user_id: &str) -> Result<()> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if user.is_email_confirmed {
            return Err(AppError::forbidden("Already confirmed."));
        }

        self.request_confirm_email(&user).await
    }

    pub async fn confirm_email(&self, request: ConfirmEmailRequest) -> Result<()> {
        let user = self
            .find_by_id(&request.uid)
            .await?
            .ok_or_else(|| AppError::bad_request("Invalid token."))?;

        let valid = user.confirm_token.as_deref() == Some(request.token.as_str())
            && user
                .confirm_token_expires_at
                .map(|t| t > Utc::now())
                .unwrap_or(false);
        if !valid {
            return Err(AppError::bad_request("Invalid token."));
        }

        if user.is_email_confirmed {
            return Err(AppError::bad_request("Already confirmed."));
        }

        self.db
            .query_with_params(
                "UPDATE user SET is_email_confirmed = true, confirm_token = NONE, \
                 confirm_token_expires_at = NONE, updated_at = $now \
                 WHERE meta::id(id) = $id RETURN NONE",
                json!({"id": user.id, "now": Utc::now()}),
            )
            .await?;

        info!("Email confirmed for user: {}", user.username);
        Ok(())
    }

    /// 找回密码。未注册邮箱静默成功，避免泄露账号是否存在
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<()> {
        request.validate().map_err(AppError::ValidatorError)?;

        let user = match self.find_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                debug!("Forgot password requested for unknown email");
                return Ok(());
            }
        };

        if !user.is_active {
            return Err(AppError::bad_request("User is not active."));
        }
        if !user.is_email_confirmed {
            return Err(AppError::bad_request("Email not confirmed."));
        }

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.config.reset_token_expiry_hours);

        self.db
            .query_with_params(
                "UPDATE user SET reset_token = $token, reset_token_expires_at = $expires_at, \
                 updated_at = $now WHERE meta::id(id) = $id RETURN NONE",
                json!({
                    "id": user.id,
                    "token": token,
                    "expires_at": expires_at,
                    "now": Utc::now(),
                }),
            )
            .await?;

        self.handler
            .dispatch(NotificationAction::UserForgotPassword(EmailLinkData {
                email: user.email.clone(),
                link: format!(
                    "{}/forgot-password?uid={}&token={}",
                    self.config.public_host, user.id, token
                ),
            }))
            .await
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate().map_err(AppError::ValidatorError)?;

        let user = self
            .find_by_id(&request.uid)
            .await?
            .ok_or_else(|| AppError::bad_request("Invalid token."))?;

        let valid = user.reset_token.as_deref() == Some(request.token.as_str())
            && user
                .reset_token_expires_at
                .map(|t| t > Utc::now())
                .unwrap_or(false);
        if !valid {
            return Err(AppError::bad_request("Invalid token."));
        }

        let password_hash = self.hash_password(&request.password)?;
        self.db
            .query_with_params(
                "UPDATE user SET password_hash = $password_hash, reset_token = NONE, \
                 reset_token_expires_at = NONE, updated_at = $now \
                 WHERE meta::id(id) = $id RETURN NONE",
                json!({
                    "id": user.id,
                    "password_hash": password_hash,
                    "now": Utc::now(),
                }),
            )
            .await?;

        info!("Password reset for user: {}", user.username);
        Ok(())
    }

    /// 登录状态下修改密码，需验证旧密码
    pub async fn change_password(&self, user_id: &str, request: ChangePasswordRequest) -> Result<()> {
        request.validate().map_err(AppError::ValidatorError)?;

        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !self.verify_password(&request.old_password, &user.password_hash) {
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let password_hash = self.hash_password(&request.new_password)?;
        self.db
            .query_with_params(
                "UPDATE user SET password_hash = $password_hash, updated_at = $now \
                 WHERE meta::id(id) = $id RETURN NONE",
                json!({
                    "id": user.id,
                    "password_hash": password_hash,
                    "now": Utc::now(),
                }),
            )
            .await?;

        info!("Password changed for user: {}", user.username);
        Ok(())
    }

    /// 用仍然有效的令牌换取一个新令牌
    pub async fn refresh_token(&self, user_id: &str) -> Result<String> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

        if !user.is_active {
            return Err(AppError::unauthorized("User is not active"));
        }

        self.generate_jwt(&user)
    }

    pub async fn get_account(&self, user_id: &str) -> Result<AccountInfo> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok(user.into())
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::unauthorized("Invalid token"))
            }
        }
    }

    pub fn generate_jwt(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            exp: (now + Duration::hours(self.config.jwt_expiry_hours)).timestamp(),
            iat: now.timestamp(),
            email: user.email.clone(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;
        Ok(token)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM user WHERE meta::id(id) = $id",
                json!({"id": id}),
            )
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM user WHERE email = $email",
                json!({"email": email}),
            )
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM user WHERE username = $username",
                json!({"username": username}),
            )
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    /// 清理过期的确认/重置令牌（后台任务调用）
    pub async fn cleanup_expired_tokens(&self) -> Result<()> {
        self.db
            .query_with_params(
                "UPDATE user SET confirm_token = NONE, confirm_token_expires_at = NONE \
                 WHERE confirm_token_expires_at < $now RETURN NONE; \
                 UPDATE user SET reset_token = NONE, reset_token_expires_at = NONE \
                 WHERE reset_token_expires_at < $now RETURN NONE",
                json!({"now": Utc::now()}),
            )
            .await?;
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        match PasswordHash::new(password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 48);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
