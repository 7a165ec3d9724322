use std::sync::OnceLock;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::user::normalize_email;
use crate::utils::{hash_password, verify_password};

/// Account that passed credential verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedCredentials {
    pub user_id: Uuid,
}

/// Checks an email/password pair. Knows nothing about roles or tenants.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `Ok(None)` for any rejection; callers must not distinguish why.
    async fn verify(&self, email: &str, password: &str) -> AppResult<Option<VerifiedCredentials>>;
}

/// Hash checked for unknown emails so every login pays for one argon2
/// verification.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password("unknown-account-placeholder").ok())
        .as_deref()
}

#[derive(Debug, Clone)]
pub struct SqliteCredentialVerifier {
    pool: SqlitePool,
}

impl SqliteCredentialVerifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialVerifier for SqliteCredentialVerifier {
    async fn verify(&self, email: &str, password: &str) -> AppResult<Option<VerifiedCredentials>> {
        let row: Option<(Uuid, String, bool)> =
            sqlx::query_as("SELECT id, password_hash, is_active FROM users WHERE lower(email) = ?")
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;

        let Some((user_id, password_hash, is_active)) = row else {
            if let Some(hash) = dummy_hash() {
                let _ = verify_password(password, hash);
            }
            return Ok(None);
        };

        if !verify_password(password, &password_hash)? || !is_active {
            return Ok(None);
        }

        Ok(Some(VerifiedCredentials { user_id }))
    }
}
