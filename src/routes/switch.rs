use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{self, AuthContext, SessionView};
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct SwitchResponse {
    pub session: SessionView,
    /// Organization data is now scoped to; null for the global view.
    pub effective_organization_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/admin/switch-organization/{org_id}",
    tag = "Admin",
    params(("org_id" = Uuid, Path, description = "Organization to act in")),
    responses(
        (status = 200, description = "Session scoped to the organization", body = SwitchResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Only super_admin may switch"),
        (status = 404, description = "No such organization")
    ),
    security(("bearerAuth" = []))
)]
pub async fn switch_organization(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(org_id): Path<Uuid>,
) -> AppResult<Json<SwitchResponse>> {
    let session = auth::switch_organization(
        &state.pool,
        state.policy.as_ref(),
        &state.sessions,
        &state.events,
        &ctx.principal,
        &ctx.session,
        org_id,
    )
    .await?;

    Ok(Json(SwitchResponse {
        effective_organization_id: session.scope.selected(),
        session: SessionView::from(&session),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/switch-organization",
    tag = "Admin",
    responses(
        (status = 200, description = "Session back in the global view", body = SwitchResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Only super_admin may switch")
    ),
    security(("bearerAuth" = []))
)]
pub async fn clear_organization(State(state): State<AppState>, ctx: AuthContext) -> AppResult<Json<SwitchResponse>> {
    let session = auth::clear_organization_override(
        state.policy.as_ref(),
        &state.sessions,
        &state.events,
        &ctx.principal,
        &ctx.session,
    )
    .await?;

    Ok(Json(SwitchResponse {
        effective_organization_id: session.scope.selected(),
        session: SessionView::from(&session),
    }))
}
