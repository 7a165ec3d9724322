use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{authorize_create, fetch_authorized, list_visible, require_non_empty};
use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind, TenantFilter};
use crate::db::scoped::{delete_scoped, fetch_scoped};
use crate::errors::AppResult;
use crate::models::team::{Team, TeamCreateRequest};
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/api/teams",
    tag = "Teams",
    responses(
        (status = 200, description = "Teams of the caller's organization", body = [Team]),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_teams(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<Vec<Team>>> {
    Ok(Json(list_visible(&state, &ctx).await?))
}

#[utoipa::path(
    post,
    path = "/api/teams",
    tag = "Teams",
    request_body = TeamCreateRequest,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_team(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<TeamCreateRequest>,
) -> AppResult<(StatusCode, Json<Team>)> {
    let organization_id = authorize_create(&state, &ctx, ResourceKind::Team, payload.organization_id).await?;
    require_non_empty(&payload.name, "name")?;

    let now = utc_now();
    let team_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO teams (id, organization_id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(team_id)
    .bind(organization_id)
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let team = fetch_scoped(&state.pool, &TenantFilter::for_organization(organization_id), team_id).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

#[utoipa::path(
    get,
    path = "/api/teams/{id}",
    tag = "Teams",
    params(("id" = Uuid, Path, description = "Team id")),
    responses(
        (status = 200, description = "Team detail", body = Team),
        (status = 404, description = "No such team in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_team(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<Uuid>) -> AppResult<Json<Team>> {
    let team: Team = fetch_authorized(&state, &ctx, Action::Read, id).await?;
    Ok(Json(team))
}

#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    tag = "Teams",
    params(("id" = Uuid, Path, description = "Team id")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 404, description = "No such team in scope"),
        (status = 409, description = "Team still has staff")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_team(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    let team: Team = fetch_authorized(&state, &ctx, Action::Delete, id).await?;

    delete_scoped::<Team>(&state.pool, &ctx.filter(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
