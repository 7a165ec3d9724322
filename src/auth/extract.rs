use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;

use super::session::{Session, SESSION_COOKIE_NAME};
use crate::app::AppState;
use crate::authz::{Principal, TenantFilter};
use crate::errors::AppError;

/// Authenticated request context: the validated session and the principal
/// resolved from it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub session: Session,
}

impl AuthContext {
    pub fn filter(&self) -> TenantFilter {
        TenantFilter::for_principal(&self.principal)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers);
        let session = state.sessions.resolve(token.as_deref()).await?;
        let principal = state.resolver.resolve(&session).await?;

        Ok(AuthContext { principal, session })
    }
}

/// Raw token of the request, if any. Never rejects; used by logout.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(token_from_headers(&parts.headers)))
    }
}

/// Bearer header first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}
