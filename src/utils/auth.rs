use crate::config::AppConfig;
use crate::entities::users::{self, UserRole};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub unique_name: String,
    pub role: UserRole,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Signs a short-lived access token for `user`, returning it with its expiry instant.
pub fn create_jwt(user: &users::Model, config: &AppConfig) -> Result<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expires_at = Duration::try_minutes(config.access_token_lifetime_minutes)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .context("access token expiry out of range")?;

    let claims = Claims {
        sub: user.id.to_string(),
        unique_name: user.username.clone(),
        role: user.role,
        iss: config.jwt_issuer.clone(),
        aud: config.jwt_audience.clone(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )?;

    Ok((token, expires_at))
}

pub fn validate_jwt(token: &str, config: &AppConfig) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_audience(&[&config.jwt_audience]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}
