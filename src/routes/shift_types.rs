use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{authorize_create, fetch_authorized, list_visible, require_non_empty};
use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind, TenantFilter};
use crate::db::map_constraint;
use crate::db::scoped::{delete_scoped, fetch_scoped};
use crate::errors::{AppError, AppResult};
use crate::models::shift_type::{ShiftType, ShiftTypeCreateRequest, ShiftTypeUpdateRequest};
use crate::utils::utc_now;

const DEFAULT_COLOR: &str = "#9E9E9E";

#[utoipa::path(
    get,
    path = "/api/shifts",
    tag = "Shifts",
    responses(
        (status = 200, description = "Shift types of the caller's organization", body = [ShiftType]),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_shift_types(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<ShiftType>>> {
    Ok(Json(list_visible(&state, &ctx).await?))
}

#[utoipa::path(
    post,
    path = "/api/shifts",
    tag = "Shifts",
    request_body = ShiftTypeCreateRequest,
    responses(
        (status = 201, description = "Shift type created", body = ShiftType),
        (status = 403, description = "Not permitted"),
        (status = 409, description = "Code already used in this organization")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_shift_type(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<ShiftTypeCreateRequest>,
) -> AppResult<(StatusCode, Json<ShiftType>)> {
    let organization_id = authorize_create(&state, &ctx, ResourceKind::ShiftType, payload.organization_id).await?;
    require_non_empty(&payload.name, "name")?;
    require_non_empty(&payload.code, "code")?;
    validate_time(&payload.start_time)?;
    validate_time(&payload.end_time)?;

    let now = utc_now();
    let shift_type_id = Uuid::new_v4();
    let color = payload.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string());

    sqlx::query(
        "INSERT INTO shift_types (id, organization_id, name, code, start_time, end_time, color, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(shift_type_id)
    .bind(organization_id)
    .bind(payload.name.trim())
    .bind(payload.code.trim())
    .bind(&payload.start_time)
    .bind(&payload.end_time)
    .bind(&color)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| map_constraint(err, "shift code already in use"))?;

    let shift_type = fetch_scoped(&state.pool, &TenantFilter::for_organization(organization_id), shift_type_id).await?;
    Ok((StatusCode::CREATED, Json(shift_type)))
}

#[utoipa::path(
    get,
    path = "/api/shifts/{id}",
    tag = "Shifts",
    params(("id" = Uuid, Path, description = "Shift type id")),
    responses(
        (status = 200, description = "Shift type detail", body = ShiftType),
        (status = 404, description = "No such shift type in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_shift_type(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ShiftType>> {
    let shift_type: ShiftType = fetch_authorized(&state, &ctx, Action::Read, id).await?;
    Ok(Json(shift_type))
}

#[utoipa::path(
    put,
    path = "/api/shifts/{id}",
    tag = "Shifts",
    params(("id" = Uuid, Path, description = "Shift type id")),
    request_body = ShiftTypeUpdateRequest,
    responses(
        (status = 200, description = "Shift type updated", body = ShiftType),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such shift type in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_shift_type(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShiftTypeUpdateRequest>,
) -> AppResult<Json<ShiftType>> {
    let mut shift_type: ShiftType = fetch_authorized(&state, &ctx, Action::Update, id).await?;

    if let Some(name) = payload.name.as_ref() {
        require_non_empty(name, "name")?;
        shift_type.name = name.trim().to_string();
    }
    if let Some(start_time) = payload.start_time.as_ref() {
        validate_time(start_time)?;
        shift_type.start_time = start_time.clone();
    }
    if let Some(end_time) = payload.end_time.as_ref() {
        validate_time(end_time)?;
        shift_type.end_time = end_time.clone();
    }
    if let Some(color) = payload.color.as_ref() {
        shift_type.color = color.clone();
    }

    let now = utc_now();
    sqlx::query(
        "UPDATE shift_types SET name = ?, start_time = ?, end_time = ?, color = ?, updated_at = ? WHERE id = ? AND organization_id = ?",
    )
    .bind(&shift_type.name)
    .bind(&shift_type.start_time)
    .bind(&shift_type.end_time)
    .bind(&shift_type.color)
    .bind(now)
    .bind(shift_type.id)
    .bind(shift_type.organization_id)
    .execute(&state.pool)
    .await?;

    shift_type.updated_at = now;
    Ok(Json(shift_type))
}

#[utoipa::path(
    delete,
    path = "/api/shifts/{id}",
    tag = "Shifts",
    params(("id" = Uuid, Path, description = "Shift type id")),
    responses(
        (status = 204, description = "Shift type deleted"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such shift type in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_shift_type(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let shift_type: ShiftType = fetch_authorized(&state, &ctx, Action::Delete, id).await?;

    delete_scoped::<ShiftType>(&state.pool, &ctx.filter(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// "HH:MM", 24-hour clock. Night shifts may end before they start.
fn validate_time(value: &str) -> AppResult<()> {
    chrono::NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| AppError::bad_request(format!("invalid time '{value}', expected HH:MM")))
}
