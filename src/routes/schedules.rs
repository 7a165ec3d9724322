use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use uuid::Uuid;

use super::{authorize_create, fetch_authorized, list_visible, require_non_empty};
use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind, TenantFilter};
use crate::db::scoped::{delete_scoped, fetch_scoped};
use crate::errors::{AppError, AppResult};
use crate::models::schedule::{Schedule, ScheduleCreateRequest, ScheduleStatus, ScheduleUpdateRequest};
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/api/schedules",
    tag = "Schedules",
    responses(
        (status = 200, description = "Schedules of the caller's organization", body = [Schedule]),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_schedules(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<Schedule>>> {
    Ok(Json(list_visible(&state, &ctx).await?))
}

#[utoipa::path(
    post,
    path = "/api/schedules",
    tag = "Schedules",
    request_body = ScheduleCreateRequest,
    responses(
        (status = 201, description = "Draft schedule created", body = Schedule),
        (status = 400, description = "Invalid period"),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<ScheduleCreateRequest>,
) -> AppResult<(StatusCode, Json<Schedule>)> {
    let organization_id = authorize_create(&state, &ctx, ResourceKind::Schedule, payload.organization_id).await?;
    require_non_empty(&payload.name, "name")?;
    validate_period(payload.start_date, payload.end_date)?;

    let now = utc_now();
    let schedule_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO schedules (id, organization_id, name, start_date, end_date, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(schedule_id)
    .bind(organization_id)
    .bind(payload.name.trim())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(ScheduleStatus::Draft)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let schedule = fetch_scoped(&state.pool, &TenantFilter::for_organization(organization_id), schedule_id).await?;
    tracing::info!(user_id = %ctx.principal.user_id(), %organization_id, %schedule_id, "schedule created");

    Ok((StatusCode::CREATED, Json(schedule)))
}

#[utoipa::path(
    get,
    path = "/api/schedules/{id}",
    tag = "Schedules",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Schedule detail", body = Schedule),
        (status = 404, description = "No such schedule in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_schedule(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Schedule>> {
    let schedule: Schedule = fetch_authorized(&state, &ctx, Action::Read, id).await?;
    Ok(Json(schedule))
}

#[utoipa::path(
    put,
    path = "/api/schedules/{id}",
    tag = "Schedules",
    params(("id" = Uuid, Path, description = "Schedule id")),
    request_body = ScheduleUpdateRequest,
    responses(
        (status = 200, description = "Schedule updated", body = Schedule),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such schedule in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_schedule(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleUpdateRequest>,
) -> AppResult<Json<Schedule>> {
    let mut schedule: Schedule = fetch_authorized(&state, &ctx, Action::Update, id).await?;

    if let Some(name) = payload.name.as_ref() {
        require_non_empty(name, "name")?;
        schedule.name = name.trim().to_string();
    }
    if let Some(start_date) = payload.start_date {
        schedule.start_date = start_date;
    }
    if let Some(end_date) = payload.end_date {
        schedule.end_date = end_date;
    }
    if let Some(status) = payload.status {
        schedule.status = status;
    }
    validate_period(schedule.start_date, schedule.end_date)?;

    let now = utc_now();
    sqlx::query(
        "UPDATE schedules SET name = ?, start_date = ?, end_date = ?, status = ?, updated_at = ? WHERE id = ? AND organization_id = ?",
    )
    .bind(&schedule.name)
    .bind(schedule.start_date)
    .bind(schedule.end_date)
    .bind(schedule.status)
    .bind(now)
    .bind(schedule.id)
    .bind(schedule.organization_id)
    .execute(&state.pool)
    .await?;

    schedule.updated_at = now;
    Ok(Json(schedule))
}

#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    tag = "Schedules",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such schedule in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_schedule(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let schedule: Schedule = fetch_authorized(&state, &ctx, Action::Delete, id).await?;

    delete_scoped::<Schedule>(&state.pool, &ctx.filter(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_period(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::bad_request("end_date must not precede start_date"));
    }
    Ok(())
}
