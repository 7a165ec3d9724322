use std::sync::Arc;

use sqlx::SqlitePool;

use super::session::{Session, SessionStore};
use crate::authz::{OrganizationScope, Principal};
use crate::db::scoped::ScopedTable;
use crate::errors::{AppError, AppResult};
use crate::models::user::DbUser;

/// Turns a live session into the request's [`Principal`].
#[derive(Clone)]
pub struct IdentityResolver {
    pool: SqlitePool,
    store: Arc<dyn SessionStore>,
}

impl IdentityResolver {
    pub fn new(pool: SqlitePool, store: Arc<dyn SessionStore>) -> Self {
        Self { pool, store }
    }

    /// Fresh user state is read on every call, so role and activity changes
    /// apply to the next request. Sessions whose account can no longer act
    /// are revoked.
    pub async fn resolve(&self, session: &Session) -> AppResult<Principal> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", DbUser::COLUMNS);
        let user = sqlx::query_as::<_, DbUser>(&sql)
            .bind(session.user_id)
            .fetch_optional(&self.pool)
            .await?;

        let principal = user
            .filter(|user| user.is_active)
            .and_then(|user| principal_for(&user, session.scope));

        match principal {
            Some(principal) => Ok(principal),
            None => {
                tracing::warn!(
                    user_id = %session.user_id,
                    session_id = %session.id,
                    "session owner can no longer authenticate; revoking"
                );
                self.store.delete(session.id).await?;
                Err(AppError::unauthenticated("session has ended"))
            }
        }
    }
}

/// `None` when a tenant-bound account lacks an organization.
pub fn principal_for(user: &DbUser, scope: OrganizationScope) -> Option<Principal> {
    Principal::resolve(user.id, user.role, user.organization_id, scope).map(|p| p.with_email(user.email.clone()))
}
