use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

use super::credentials::CredentialVerifier;
use super::token::SessionConfig;
use crate::authz::OrganizationScope;
use crate::errors::{AppError, AppResult};
use crate::utils::utc_now;

/// Cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "access_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scope: OrganizationScope,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A freshly created session together with its bearer token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub expires_at: DateTime<Utc>,
    /// Selected organization of a super_admin session; null means the
    /// global view.
    pub selected_organization_id: Option<Uuid>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            expires_at: session.expires_at,
            selected_organization_id: session.scope.selected(),
        }
    }
}

/// Keyed session storage. Each method is a single atomic operation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> AppResult<()>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Session>>;
    /// Overwrites the scope (last write wins) and returns the new state.
    async fn set_scope(&self, id: Uuid, scope: OrganizationScope) -> AppResult<Option<Session>>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

#[derive(Debug, Clone, FromRow)]
struct DbSession {
    id: Uuid,
    user_id: Uuid,
    selected_organization_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<DbSession> for Session {
    fn from(row: DbSession) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            scope: OrganizationScope::from_selected(row.selected_organization_id),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert(&self, session: &Session) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, selected_organization_id, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.scope.selected())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Session>> {
        let row = sqlx::query_as::<_, DbSession>(
            "SELECT id, user_id, selected_organization_id, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    async fn set_scope(&self, id: Uuid, scope: OrganizationScope) -> AppResult<Option<Session>> {
        let row = sqlx::query_as::<_, DbSession>(
            "UPDATE sessions SET selected_organization_id = ? WHERE id = ? \
             RETURNING id, user_id, selected_organization_id, created_at, expires_at",
        )
        .bind(scope.selected())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Issues, resolves and revokes sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    verifier: Arc<dyn CredentialVerifier>,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, verifier: Arc<dyn CredentialVerifier>, config: Arc<SessionConfig>) -> Self {
        Self { store, verifier, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn create_session(&self, email: &str, password: &str) -> AppResult<IssuedSession> {
        let verified = self
            .verifier
            .verify(email, password)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let now = utc_now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: verified.user_id,
            scope: OrganizationScope::Global,
            created_at: now,
            expires_at: now + Duration::hours(self.config.ttl_hours),
        };

        self.store.insert(&session).await?;
        let token = self
            .config
            .encode(session.user_id, session.id, session.created_at, session.expires_at)?;

        tracing::info!(user_id = %session.user_id, session_id = %session.id, "session created");
        Ok(IssuedSession { session, token })
    }

    /// Validates a bearer token against the store.
    pub async fn resolve(&self, token: Option<&str>) -> AppResult<Session> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthenticated("authentication required"))?;
        let claims = self.config.decode(token)?;

        let session = self
            .store
            .get(claims.sid)
            .await?
            .ok_or_else(|| AppError::unauthenticated("session has ended"))?;

        if session.user_id != claims.sub {
            tracing::warn!(session_id = %session.id, "session token subject mismatch");
            return Err(AppError::unauthenticated("invalid session token"));
        }

        if session.is_expired_at(utc_now()) {
            self.store.delete(session.id).await?;
            return Err(AppError::unauthenticated("session has ended"));
        }

        Ok(session)
    }

    /// Idempotent; unknown, malformed and already revoked tokens are ignored.
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        let Ok(claims) = self.config.decode_ignoring_expiry(token) else {
            return Ok(());
        };

        self.store.delete(claims.sid).await?;
        tracing::info!(user_id = %claims.sub, session_id = %claims.sid, "session revoked");
        Ok(())
    }

    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let removed = self.store.delete_for_user(user_id).await?;
        if removed > 0 {
            tracing::info!(user_id = %user_id, removed, "sessions revoked for user");
        }
        Ok(removed)
    }

    pub async fn set_scope(&self, session_id: Uuid, scope: OrganizationScope) -> AppResult<Session> {
        self.store
            .set_scope(session_id, scope)
            .await?
            .ok_or_else(|| AppError::unauthenticated("session has ended"))
    }

    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.store.delete_expired(utc_now()).await
    }
}

/// Periodically deletes expired sessions.
pub async fn run_session_sweeper(manager: SessionManager) {
    let period = std::time::Duration::from_secs(manager.config().sweep_interval_secs.max(1));
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        match manager.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "expired sessions purged"),
            Err(err) => tracing::warn!(error = %err, "session sweep failed"),
        }
    }
}
