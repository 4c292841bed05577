use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::users::UserRole;
use crate::entities::{prelude::*, *};
use crate::models::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::services::access::Identity;
use crate::services::user_service::ensure_unique;
use crate::utils::auth::{create_jwt, validate_jwt};
use crate::utils::hash::calculate_hash;
use crate::utils::password::{hash_password, verify_password};
use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";

/// Opaque refresh token: 32 random bytes, base64url without padding.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct AuthService {
    db: DatabaseConnection,
    config: AppConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self { db, config }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AppError> {
        req.validate()?;

        let user = Users::find()
            .filter(users::Column::Username.eq(req.username.trim()))
            .one(&self.db)
            .await?;

        let Some(user) = user else {
            warn!("Login failed: unknown user '{}'", req.username);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let password_ok = !user.is_system
            && user
                .password_hash
                .as_deref()
                .is_some_and(|hash| verify_password(&req.password, hash));
        if !password_ok {
            warn!("Login failed: bad password for user {}", user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let tokens = self.issue_tokens(&self.db, &user).await?;
        info!("🔑 User {} logged in", user.id);
        Ok(tokens)
    }

    /// Creates a `User`-role account and signs it in.
    pub async fn register(&self, req: RegisterRequest) -> Result<TokenResponse, AppError> {
        req.validate()?;

        let username = req.username.trim().to_string();
        let email = req.email.trim().to_string();
        ensure_unique(&self.db, &username, &email, None).await?;

        let password_hash = hash_password(&req.password)?;

        let txn = self.db.begin().await?;
        let user = users::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(Some(password_hash)),
            role: Set(UserRole::User),
            is_system: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::on_write(e, "Username or email already exists."))?;

        let tokens = self.issue_tokens(&txn, &user).await?;
        txn.commit().await?;

        info!("👤 User {} '{}' registered", user.id, user.username);
        Ok(tokens)
    }

    /// Consumes a refresh token and issues a fresh pair. The presented token is
    /// revoked in the same transaction, so it can be used at most once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let token_hash = calculate_hash(refresh_token.as_bytes());
        let txn = self.db.begin().await?;

        let stored = RefreshTokens::find()
            .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
            .filter(refresh_tokens::Column::IsRevoked.eq(false))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()))?;

        if stored.expires_at <= Utc::now() {
            debug!("Refresh token {} expired at {}", stored.id, stored.expires_at);
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()));
        }

        // Conditional update: a concurrent rotation of the same token loses here.
        let revoked = RefreshTokens::update_many()
            .col_expr(refresh_tokens::Column::IsRevoked, Expr::value(true))
            .filter(refresh_tokens::Column::Id.eq(stored.id))
            .filter(refresh_tokens::Column::IsRevoked.eq(false))
            .exec(&txn)
            .await?
            .rows_affected;
        if revoked != 1 {
            warn!("Refresh token {} was rotated concurrently", stored.id);
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()));
        }

        let user = Users::find_by_id(stored.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()))?;

        let tokens = self.issue_tokens(&txn, &user).await?;
        txn.commit().await?;

        debug!("Refresh token {} rotated for user {}", stored.id, user.id);
        Ok(tokens)
    }

    /// Marks the token revoked. Unknown or already revoked tokens are a no-op.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        let token_hash = calculate_hash(refresh_token.as_bytes());
        let revoked = RefreshTokens::update_many()
            .col_expr(refresh_tokens::Column::IsRevoked, Expr::value(true))
            .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
            .filter(refresh_tokens::Column::IsRevoked.eq(false))
            .exec(&self.db)
            .await?
            .rows_affected;

        if revoked > 0 {
            info!("🔒 Refresh token revoked");
        }
        Ok(())
    }

    /// Resolves a bearer token to an identity. Anything that does not check out,
    /// including a token for a user that no longer exists, is anonymous.
    pub async fn resolve_identity(&self, bearer: &str) -> Result<Identity, AppError> {
        let claims = match validate_jwt(bearer, &self.config) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Rejected bearer token: {}", e);
                return Ok(Identity::anonymous());
            }
        };

        let Some(user_id) = claims.user_id() else {
            return Ok(Identity::anonymous());
        };

        let identity = match Users::find_by_id(user_id).one(&self.db).await? {
            Some(user) if !user.is_system => Identity::with_role(user.id, user.role),
            _ => Identity::anonymous(),
        };
        Ok(identity)
    }

    async fn issue_tokens<C: ConnectionTrait>(
        &self,
        conn: &C,
        user: &users::Model,
    ) -> Result<TokenResponse, AppError> {
        let (access_token, expires_at) = create_jwt(user, &self.config)?;

        let refresh_token = generate_refresh_token();
        let refresh_expires_at = Duration::try_days(self.config.refresh_token_lifetime_days)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .context("refresh token expiry out of range")?;

        refresh_tokens::ActiveModel {
            token_hash: Set(calculate_hash(refresh_token.as_bytes())),
            user_id: Set(user.id),
            expires_at: Set(refresh_expires_at),
            is_revoked: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_tokens_are_unique_and_url_safe() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
