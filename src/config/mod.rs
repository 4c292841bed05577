use anyhow::Context;
use std::env;

/// Runtime configuration for token issuance, CORS and seeding.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HMAC secret used to sign access tokens
    pub jwt_secret: String,

    /// `iss` claim written into and required on access tokens
    pub jwt_issuer: String,

    /// `aud` claim written into and required on access tokens
    pub jwt_audience: String,

    /// Access token lifetime in minutes (default: 15)
    pub access_token_lifetime_minutes: i64,

    /// Refresh token lifetime in days (default: 7)
    pub refresh_token_lifetime_days: i64,

    /// Allowed CORS Origins (comma separated, `*` for any)
    pub allowed_origins: Vec<String>,

    /// Seed sample genres, users, movies and reviews on startup
    pub seed_demo_data: bool,

    /// Bootstrap admin account created on startup when all three are set
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            jwt_issuer: "movie-review-backend".to_string(),
            jwt_audience: "movie-review-clients".to_string(),
            access_token_lifetime_minutes: 15,
            refresh_token_lifetime_days: 7,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
            seed_demo_data: false,
            admin_username: None,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            jwt_issuer: env::var("JWT_ISSUER").unwrap_or(default.jwt_issuer),

            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or(default.jwt_audience),

            access_token_lifetime_minutes: env::var("ACCESS_TOKEN_LIFETIME_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.access_token_lifetime_minutes),

            refresh_token_lifetime_days: env::var("REFRESH_TOKEN_LIFETIME_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.refresh_token_lifetime_days),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_origins(&v))
                .unwrap_or(default.allowed_origins),

            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.seed_demo_data),

            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }

    /// Relaxed settings for local work: demo data on, localhost origins only.
    pub fn development() -> Self {
        Self {
            seed_demo_data: true,
            ..Self::default()
        }
    }

    /// Strict settings: `JWT_SECRET` must be provided and origins never fall back to localhost.
    pub fn production() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set in production")?;
        let from_env = Self::from_env();

        Ok(Self {
            jwt_secret,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            seed_demo_data: false,
            ..from_env
        })
    }

    /// Bootstrap admin credentials, present only when all three variables are set.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str, &str)> {
        match (&self.admin_username, &self.admin_email, &self.admin_password) {
            (Some(u), Some(e), Some(p)) => Some((u.as_str(), e.as_str(), p.as_str())),
            _ => None,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
