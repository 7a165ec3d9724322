use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use super::{list_visible, require_non_empty};
use crate::app::AppState;
use crate::auth::AuthContext;
use crate::authz::{Action, ResourceKind, TenantFilter};
use crate::db::map_constraint;
use crate::db::scoped::{fetch_scoped, list_scoped};
use crate::errors::AppResult;
use crate::events::{log_activity, RequestContext};
use crate::models::organization::{Organization, OrganizationCreateRequest};
use crate::utils::utc_now;

/// Organizations visible to the caller: all of them for a super_admin, in
/// any session scope, otherwise the home organization only.
#[utoipa::path(
    get,
    path = "/api/admin/organizations",
    tag = "Admin",
    responses(
        (status = 200, description = "Organizations in scope", body = [Organization]),
        (status = 403, description = "Not permitted")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_organizations(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> AppResult<Json<Vec<Organization>>> {
    if ctx.principal.can_switch_organization() {
        // The switch selector needs every organization, whatever is selected.
        state
            .policy
            .require(&ctx.principal, Action::Read, ResourceKind::Organization, None)?;
        return Ok(Json(list_scoped(&state.pool, &TenantFilter::global()).await?));
    }

    Ok(Json(list_visible(&state, &ctx).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/organizations",
    tag = "Admin",
    request_body = OrganizationCreateRequest,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 403, description = "Not permitted"),
        (status = 409, description = "Name already in use")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_organization(
    State(state): State<AppState>,
    ctx: AuthContext,
    headers: HeaderMap,
    Json(payload): Json<OrganizationCreateRequest>,
) -> AppResult<(StatusCode, Json<Organization>)> {
    // A new organization belongs to no existing tenant.
    state
        .policy
        .require(&ctx.principal, Action::Create, ResourceKind::Organization, None)?;
    require_non_empty(&payload.name, "name")?;

    let now = utc_now();
    let organization_id = Uuid::new_v4();

    sqlx::query("INSERT INTO organizations (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(organization_id)
        .bind(payload.name.trim())
        .bind(now)
        .bind(now)
        .execute(&state.pool)
        .await
        .map_err(|err| map_constraint(err, "organization name already in use"))?;

    let organization: Organization =
        fetch_scoped(&state.pool, &TenantFilter::for_organization(organization_id), organization_id).await?;

    tracing::info!(actor_id = %ctx.principal.user_id(), %organization_id, "organization created");
    log_activity(
        &state.events,
        "created",
        Some(ctx.principal.user_id()),
        &organization,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(organization)))
}
