use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{AuthContext, SessionToken, SESSION_COOKIE_NAME};
use crate::authz::{Principal, Role};
use crate::errors::{AppError, AppResult};
use crate::events::{publish, DomainEvent, RequestContext, Severity};
use crate::models::user::LoginRequest;
use crate::utils::{hash_password, utc_now, verify_password};

/// The authenticated actor as seen by clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalView {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    #[schema(example = "テナント管理者")]
    pub role_label: String,
    pub home_organization_id: Option<Uuid>,
    /// Null only for a super_admin in the global view.
    pub effective_organization_id: Option<Uuid>,
    pub can_switch_organization: bool,
}

impl From<&Principal> for PrincipalView {
    fn from(principal: &Principal) -> Self {
        Self {
            user_id: principal.user_id(),
            email: principal.email().to_string(),
            role: principal.role(),
            role_label: principal.role().label().to_string(),
            home_organization_id: principal.home_organization_id(),
            effective_organization_id: principal.effective_organization_id(),
            can_switch_organization: principal.can_switch_organization(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub principal: PrincipalView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = LoginResponse,
         headers(("Set-Cookie" = String, description = "HttpOnly session cookie (access_token)"))),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let issued = state.sessions.create_session(&payload.email, &payload.password).await?;
    let principal = state.resolver.resolve(&issued.session).await?;

    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(issued.session.created_at)
        .bind(principal.user_id())
        .execute(&state.pool)
        .await?;

    publish(
        &state.events,
        DomainEvent::new(
            "session.created",
            Some(principal.user_id()),
            Some(issued.session.id),
            json!({ "role": principal.role(), "context": RequestContext::from_headers(&headers) }),
        )
        .in_organization(principal.home_organization_id())
        .with_severity(Severity::Noise),
    );

    let cookie = Cookie::build((SESSION_COOKIE_NAME, issued.token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.session.expires_at,
            principal: PrincipalView::from(&principal),
        }),
    ))
}

/// Always succeeds; a missing or stale token simply has nothing to revoke.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Session revoked and cookie cleared", body = MessageResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    SessionToken(token): SessionToken,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(token) = token.as_deref() {
        state.sessions.revoke(token).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
    Ok((
        jar,
        Json(MessageResponse {
            message: "logged out".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current principal", body = PrincipalView),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(ctx: AuthContext) -> Json<PrincipalView> {
    Json(PrincipalView::from(&ctx.principal))
}

/// Changes the caller's own password and ends all of its sessions.
#[utoipa::path(
    put,
    path = "/api/auth/password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed; sign in again", body = MessageResponse),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is wrong")
    ),
    security(("bearerAuth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    ctx: AuthContext,
    jar: CookieJar,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let user_id = ctx.principal.user_id();
    let current_hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;

    if !verify_password(&payload.current_password, &current_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    let new_hash = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(new_hash)
        .bind(utc_now())
        .bind(user_id)
        .execute(&state.pool)
        .await?;

    state.sessions.revoke_all_for_user(user_id).await?;
    publish(
        &state.events,
        DomainEvent::new("user.password_changed", Some(user_id), Some(user_id), serde_json::Value::Null)
            .in_organization(ctx.principal.home_organization_id()),
    );

    let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
    Ok((
        jar,
        Json(MessageResponse {
            message: "password changed".to_string(),
        }),
    ))
}
