pub mod auth;
pub mod health;
pub mod organizations;
pub mod requests;
pub mod schedules;
pub mod shift_types;
pub mod staffs;
pub mod switch;
pub mod teams;
pub mod users;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind};
use crate::db::scoped::{fetch_scoped, list_scoped, ScopedTable};
use crate::errors::{AppError, AppResult};

/// Authorizes a listing of `T` in the caller's effective scope and returns
/// the visible rows.
pub(crate) async fn list_visible<T: ScopedTable>(state: &AppState, ctx: &AuthContext) -> AppResult<Vec<T>> {
    state
        .policy
        .require(&ctx.principal, Action::Read, T::KIND, ctx.principal.effective_organization_id())?;
    list_scoped(&state.pool, &ctx.filter()).await
}

/// Loads a row through the caller's tenant filter and authorizes `action`
/// on it. Invisible rows are not found.
pub(crate) async fn fetch_authorized<T: ScopedTable>(
    state: &AppState,
    ctx: &AuthContext,
    action: Action,
    id: Uuid,
) -> AppResult<T> {
    let row: T = fetch_scoped(&state.pool, &ctx.filter(), id).await?;
    authorize_row(state, ctx, action, &row)?;
    Ok(row)
}

/// Authorizes an action on a row the caller can already see.
pub(crate) fn authorize_row<T: ScopedTable>(state: &AppState, ctx: &AuthContext, action: Action, row: &T) -> AppResult<()> {
    state.policy.require(&ctx.principal, action, T::KIND, row.organization_id())
}

/// Organization a new row is created in: the one named in the payload, or
/// the caller's effective organization. A global super_admin must name one.
pub(crate) fn target_organization(ctx: &AuthContext, requested: Option<Uuid>) -> AppResult<Uuid> {
    requested
        .or(ctx.principal.effective_organization_id())
        .ok_or_else(|| AppError::bad_request("organization_id is required outside an organization scope"))
}

/// Authorizes creation and returns the owning organization, which must
/// exist.
pub(crate) async fn authorize_create(
    state: &AppState,
    ctx: &AuthContext,
    kind: ResourceKind,
    requested: Option<Uuid>,
) -> AppResult<Uuid> {
    // Roles without create rights are refused before the payload is read.
    state
        .policy
        .require(&ctx.principal, Action::Create, kind, ctx.principal.effective_organization_id())?;

    let organization_id = target_organization(ctx, requested)?;
    state
        .policy
        .require(&ctx.principal, Action::Create, kind, Some(organization_id))?;
    ensure_organization_exists(&state.pool, organization_id).await?;

    Ok(organization_id)
}

pub(crate) async fn ensure_organization_exists(pool: &SqlitePool, organization_id: Uuid) -> AppResult<()> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM organizations WHERE id = ?")
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;

    found
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("organization not found"))
}

pub(crate) fn require_non_empty(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} must not be empty")));
    }
    Ok(())
}
