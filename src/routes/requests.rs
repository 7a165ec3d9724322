use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{authorize_create, fetch_authorized, list_visible};
use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind, TenantFilter};
use crate::db::scoped::{delete_scoped, fetch_scoped};
use crate::errors::AppResult;
use crate::models::request::{ShiftRequest, ShiftRequestCreateRequest};
use crate::models::staff::DbStaff;
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    responses(
        (status = 200, description = "Shift requests of the caller's organization", body = [ShiftRequest]),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_requests(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<ShiftRequest>>> {
    Ok(Json(list_visible(&state, &ctx).await?))
}

/// The request's organization is always the one of the staff member it is
/// filed for.
#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = ShiftRequestCreateRequest,
    responses(
        (status = 201, description = "Request created", body = ShiftRequest),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such staff in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<ShiftRequestCreateRequest>,
) -> AppResult<(StatusCode, Json<ShiftRequest>)> {
    state.policy.require(
        &ctx.principal,
        Action::Create,
        ResourceKind::Request,
        ctx.principal.effective_organization_id(),
    )?;
    let staff: DbStaff = fetch_scoped(&state.pool, &ctx.filter(), payload.staff_id).await?;
    let organization_id = authorize_create(&state, &ctx, ResourceKind::Request, Some(staff.organization_id)).await?;

    let now = utc_now();
    let request_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO requests (id, organization_id, staff_id, request_type, target_date, note, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(request_id)
    .bind(organization_id)
    .bind(staff.id)
    .bind(payload.request_type)
    .bind(payload.target_date)
    .bind(&payload.note)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let request = fetch_scoped(&state.pool, &TenantFilter::for_organization(organization_id), request_id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request detail", body = ShiftRequest),
        (status = 404, description = "No such request in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ShiftRequest>> {
    let request: ShiftRequest = fetch_authorized(&state, &ctx, Action::Read, id).await?;
    Ok(Json(request))
}

#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 404, description = "No such request in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_request(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let request: ShiftRequest = fetch_authorized(&state, &ctx, Action::Delete, id).await?;

    delete_scoped::<ShiftRequest>(&state.pool, &ctx.filter(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
