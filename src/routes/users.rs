use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{
    authorize_row, ensure_organization_exists, fetch_authorized, list_visible, require_non_empty, target_organization,
};
use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind, Role};
use crate::db::map_constraint;
use crate::db::scoped::ScopedTable;
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, RequestContext};
use crate::models::user::{normalize_email, DbUser, User, UserCreateRequest, UserUpdateRequest};
use crate::utils::{hash_password, utc_now};

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "Users in the caller's scope", body = [User]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<User>>> {
    let users = list_visible::<DbUser>(&state, &ctx).await?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not permitted"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    headers: HeaderMap,
    Json(payload): Json<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let scope = ctx.principal.effective_organization_id();
    state.policy.require(&ctx.principal, Action::Create, ResourceKind::User, scope)?;
    state
        .policy
        .require(&ctx.principal, Action::AssignRole(payload.role), ResourceKind::User, scope)?;

    // super_admin accounts belong to no organization.
    let organization_id = if payload.role.is_cross_tenant() {
        None
    } else {
        let organization_id = target_organization(&ctx, payload.organization_id)?;
        state
            .policy
            .require(&ctx.principal, Action::Create, ResourceKind::User, Some(organization_id))?;
        state.policy.require(
            &ctx.principal,
            Action::AssignRole(payload.role),
            ResourceKind::User,
            Some(organization_id),
        )?;
        ensure_organization_exists(&state.pool, organization_id).await?;
        Some(organization_id)
    };

    let email = normalize_email(&payload.email);
    validate_email(&email)?;
    require_non_empty(&payload.name, "name")?;
    let password_hash = hash_password(&payload.password)?;

    let now = utc_now();
    let user_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, organization_id, email, password_hash, name, role, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(user_id)
    .bind(organization_id)
    .bind(&email)
    .bind(password_hash)
    .bind(payload.name.trim())
    .bind(payload.role)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| map_constraint(err, "email already in use"))?;

    let user: User = fetch_user(&state.pool, user_id).await?.into();
    tracing::info!(
        actor_id = %ctx.principal.user_id(),
        user_id = %user.id,
        role = %user.role,
        organization_id = ?user.organization_id,
        "user created"
    );
    log_activity(
        &state.events,
        "created",
        Some(ctx.principal.user_id()),
        &user,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(user)))
}

/// Renames, changes role or (de)activates a user. Deactivation ends every
/// session of the account.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Change would leave the organization without an admin"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such user in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    let current: DbUser = fetch_authorized(&state, &ctx, Action::Update, id).await?;
    // Editing an account requires the right to grant its current role.
    authorize_row(&state, &ctx, Action::AssignRole(current.role), &current)?;

    let role = payload.role.unwrap_or(current.role);
    if role != current.role {
        authorize_row(&state, &ctx, Action::AssignRole(role), &current)?;
        if !role.is_cross_tenant() && current.organization_id.is_none() {
            return Err(AppError::bad_request("a tenant role requires an organization"));
        }
    }

    let is_active = payload.is_active.unwrap_or(current.is_active);
    let name = match payload.name.as_ref() {
        Some(name) => {
            require_non_empty(name, "name")?;
            name.trim().to_string()
        }
        None => current.name.clone(),
    };

    let loses_admin = current.role == Role::Admin && current.is_active && (role != Role::Admin || !is_active);
    // super_admin accounts belong to no organization.
    let organization_id = if role.is_cross_tenant() {
        None
    } else {
        current.organization_id
    };

    // The last-admin guard and the write are a single statement.
    let now = utc_now();
    let updated = sqlx::query(
        "UPDATE users SET name = ?, role = ?, is_active = ?, organization_id = ?, updated_at = ? \
         WHERE id = ? AND (? = 0 OR EXISTS ( \
             SELECT 1 FROM users other \
             WHERE other.organization_id = users.organization_id \
               AND other.role = 'admin' AND other.is_active = 1 AND other.id != users.id))",
    )
    .bind(&name)
    .bind(role)
    .bind(is_active)
    .bind(organization_id)
    .bind(now)
    .bind(current.id)
    .bind(loses_admin)
    .execute(&state.pool)
    .await?
    .rows_affected();

    if updated == 0 {
        tracing::warn!(actor_id = %ctx.principal.user_id(), user_id = %current.id, "refused to remove the last admin");
        return Err(AppError::bad_request(
            "the last active admin of an organization cannot be demoted or deactivated",
        ));
    }

    let deactivated = current.is_active && !is_active;
    if deactivated {
        state.sessions.revoke_all_for_user(current.id).await?;
    }

    let user: User = fetch_user(&state.pool, current.id).await?.into();
    let action = if deactivated {
        "deactivated"
    } else if role != current.role {
        "role_changed"
    } else {
        "updated"
    };
    tracing::info!(
        actor_id = %ctx.principal.user_id(),
        user_id = %user.id,
        from_role = %current.role,
        to_role = %user.role,
        is_active = user.is_active,
        "user {action}"
    );
    log_activity(
        &state.events,
        action,
        Some(ctx.principal.user_id()),
        &user,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(user))
}

async fn fetch_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", DbUser::COLUMNS);
    sqlx::query_as::<_, DbUser>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));

    if !valid {
        return Err(AppError::bad_request("invalid email address"));
    }
    Ok(())
}
