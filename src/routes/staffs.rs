use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{authorize_create, fetch_authorized, list_visible, require_non_empty};
use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind, TenantFilter};
use crate::db::map_constraint;
use crate::db::scoped::{delete_scoped, fetch_scoped};
use crate::errors::AppResult;
use crate::models::staff::{DbStaff, Staff, StaffCreateRequest, StaffUpdateRequest};
use crate::models::team::Team;
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/api/staffs",
    tag = "Staffs",
    responses(
        (status = 200, description = "Staff of the caller's organization", body = [Staff]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_staffs(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<Staff>>> {
    let staffs = list_visible::<DbStaff>(&state, &ctx).await?;
    Ok(Json(staffs.into_iter().map(Staff::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/staffs",
    tag = "Staffs",
    request_body = StaffCreateRequest,
    responses(
        (status = 201, description = "Staff created", body = Staff),
        (status = 403, description = "Not permitted"),
        (status = 409, description = "Employee code already used")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_staff(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<StaffCreateRequest>,
) -> AppResult<(StatusCode, Json<Staff>)> {
    let organization_id = authorize_create(&state, &ctx, ResourceKind::Staff, payload.organization_id).await?;
    require_non_empty(&payload.employee_code, "employee_code")?;
    require_non_empty(&payload.last_name, "last_name")?;
    require_non_empty(&payload.first_name, "first_name")?;
    ensure_team(&state.pool, organization_id, payload.team_id).await?;

    let now = utc_now();
    let staff_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO staffs (id, organization_id, team_id, employee_code, last_name, first_name, email, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(staff_id)
    .bind(organization_id)
    .bind(payload.team_id)
    .bind(payload.employee_code.trim())
    .bind(payload.last_name.trim())
    .bind(payload.first_name.trim())
    .bind(&payload.email)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| map_constraint(err, "employee code already in use"))?;

    let staff: DbStaff = fetch_scoped(&state.pool, &TenantFilter::for_organization(organization_id), staff_id).await?;
    tracing::info!(user_id = %ctx.principal.user_id(), %organization_id, staff_id = %staff_id, "staff created");

    Ok((StatusCode::CREATED, Json(staff.into())))
}

#[utoipa::path(
    get,
    path = "/api/staffs/{id}",
    tag = "Staffs",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Staff detail", body = Staff),
        (status = 404, description = "No such staff in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_staff(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Staff>> {
    let staff: DbStaff = fetch_authorized(&state, &ctx, Action::Read, id).await?;
    Ok(Json(staff.into()))
}

#[utoipa::path(
    put,
    path = "/api/staffs/{id}",
    tag = "Staffs",
    params(("id" = Uuid, Path, description = "Staff id")),
    request_body = StaffUpdateRequest,
    responses(
        (status = 200, description = "Staff updated", body = Staff),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such staff in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_staff(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<StaffUpdateRequest>,
) -> AppResult<Json<Staff>> {
    let mut staff: DbStaff = fetch_authorized(&state, &ctx, Action::Update, id).await?;

    if let Some(last_name) = payload.last_name.as_ref() {
        require_non_empty(last_name, "last_name")?;
        staff.last_name = last_name.trim().to_string();
    }
    if let Some(first_name) = payload.first_name.as_ref() {
        require_non_empty(first_name, "first_name")?;
        staff.first_name = first_name.trim().to_string();
    }
    if payload.email.is_some() {
        staff.email = payload.email.clone();
    }
    if payload.team_id.is_some() {
        ensure_team(&state.pool, staff.organization_id, payload.team_id).await?;
        staff.team_id = payload.team_id;
    }
    if let Some(is_active) = payload.is_active {
        staff.is_active = is_active;
    }

    let now = utc_now();
    sqlx::query(
        "UPDATE staffs SET last_name = ?, first_name = ?, email = ?, team_id = ?, is_active = ?, updated_at = ? WHERE id = ? AND organization_id = ?",
    )
    .bind(&staff.last_name)
    .bind(&staff.first_name)
    .bind(&staff.email)
    .bind(staff.team_id)
    .bind(staff.is_active)
    .bind(now)
    .bind(staff.id)
    .bind(staff.organization_id)
    .execute(&state.pool)
    .await?;

    staff.updated_at = now;
    Ok(Json(staff.into()))
}

#[utoipa::path(
    delete,
    path = "/api/staffs/{id}",
    tag = "Staffs",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 204, description = "Staff deleted"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such staff in scope"),
        (status = 409, description = "Staff still has requests")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_staff(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let staff: DbStaff = fetch_authorized(&state, &ctx, Action::Delete, id).await?;

    delete_scoped::<DbStaff>(&state.pool, &ctx.filter(), id).await?;
    tracing::info!(user_id = %ctx.principal.user_id(), staff_id = %id, "staff deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// A team reference must point into the staff member's own organization.
async fn ensure_team(pool: &SqlitePool, organization_id: Uuid, team_id: Option<Uuid>) -> AppResult<()> {
    if let Some(team_id) = team_id {
        let _: Team = fetch_scoped(pool, &TenantFilter::for_organization(organization_id), team_id).await?;
    }
    Ok(())
}
