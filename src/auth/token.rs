use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::errors::AppError;

const DEFAULT_TTL_HOURS: i64 = 24;
const MAX_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_SWEEP_SECS: u64 = 300;

/// Session settings read from the environment.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: Arc<Vec<u8>>,
    /// Fixed lifetime; sessions are not extended on use.
    pub ttl_hours: i64,
    pub cookie_secure: bool,
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            ttl_hours,
            cookie_secure: false,
            sweep_interval_secs: DEFAULT_SWEEP_SECS,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        if secret.is_empty() {
            return Err(AppError::configuration("JWT_SECRET must not be empty"));
        }

        let ttl_hours = parse_ttl_hours(std::env::var("SESSION_TTL_HOURS").ok().as_deref())?;

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let sweep_interval_secs = std::env::var("SESSION_SWEEP_SECS")
            .map(|val| val.parse::<u64>())
            .unwrap_or(Ok(DEFAULT_SWEEP_SECS))
            .map_err(|_| AppError::configuration("SESSION_SWEEP_SECS must be a valid integer"))?;

        Ok(Self {
            secret: Arc::new(secret.into_bytes()),
            ttl_hours,
            cookie_secure,
            sweep_interval_secs,
        })
    }

    pub fn encode(&self, user_id: Uuid, session_id: Uuid, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            exp: expires_at.timestamp() as usize,
            iat: issued_at.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign session token: {err}")))
    }

    /// Decode and validate signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_with(token, true)
    }

    /// Signature only; used for revocation so expired tokens can still
    /// clean up their row.
    pub fn decode_ignoring_expiry(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_with(token, false)
    }

    fn decode_with(&self, token: &str, validate_exp: bool) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = validate_exp;
        validation.leeway = 0;
        if !validate_exp {
            validation.required_spec_claims.remove("exp");
        }

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "session token rejected");
                AppError::unauthenticated("invalid session token")
            })
    }
}

/// Session lifetime in hours, bounded so expiry arithmetic cannot overflow.
fn parse_ttl_hours(raw: Option<&str>) -> Result<i64, AppError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TTL_HOURS);
    };

    let hours = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::configuration("SESSION_TTL_HOURS must be a valid integer"))?;
    if hours <= 0 {
        return Err(AppError::configuration("SESSION_TTL_HOURS must be positive"));
    }
    if hours > MAX_TTL_HOURS {
        return Err(AppError::configuration(format!(
            "SESSION_TTL_HOURS must not exceed {MAX_TTL_HOURS}"
        )));
    }

    Ok(hours)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub exp: usize,
    pub iat: usize,
}
