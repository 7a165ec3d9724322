mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{ADMIN, SUPER_ADMIN, USER};

#[tokio::test]
async fn login_sets_http_only_session_cookie() -> Result<()> {
    let t = common::spawn().await?;

    let resp = t
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN.0, "password": ADMIN.1 })),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::OK);

    let cookie = resp
        .headers
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("login must set a cookie");
    assert!(cookie.starts_with("access_token="), "unexpected cookie: {cookie}");
    assert!(cookie.contains("HttpOnly"));

    assert_eq!(resp.body["principal"]["role"], "admin");
    assert_eq!(resp.body["principal"]["can_switch_organization"], false);
    assert_eq!(
        resp.body["principal"]["effective_organization_id"],
        t.seed.primary_organization_id.to_string()
    );

    Ok(())
}

#[tokio::test]
async fn email_match_ignores_case() -> Result<()> {
    let t = common::spawn().await?;

    let resp = t
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "Admin@Example.COM", "password": ADMIN.1 })),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() -> Result<()> {
    let t = common::spawn().await?;

    let wrong_password = t
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN.0, "password": "not-the-password" })),
        )
        .await?;
    let unknown_email = t
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "whatever123" })),
        )
        .await?;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert!(wrong_password.headers.get("set-cookie").is_none());

    Ok(())
}

#[tokio::test]
async fn me_accepts_bearer_header_and_cookie() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(USER).await?;

    let bearer = t.get("/api/auth/me", &token).await?;
    assert_eq!(bearer.status, StatusCode::OK);
    assert_eq!(bearer.body["email"], USER.0);
    assert_eq!(bearer.body["role"], "user");

    let req = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header("cookie", format!("access_token={token}"))
        .body(Body::empty())?;
    let cookie = t.send(req).await?;
    assert_eq!(cookie.status, StatusCode::OK);
    assert_eq!(cookie.body["email"], USER.0);

    Ok(())
}

#[tokio::test]
async fn missing_or_garbage_token_is_401_never_403() -> Result<()> {
    let t = common::spawn().await?;

    for uri in ["/api/auth/me", "/api/staffs", "/api/admin/users"] {
        let none = t.request(Method::GET, uri, None, None).await?;
        assert_eq!(none.status, StatusCode::UNAUTHORIZED, "{uri} without token");

        let garbage = t.get(uri, "not.a.jwt").await?;
        assert_eq!(garbage.status, StatusCode::UNAUTHORIZED, "{uri} with garbage token");
    }

    Ok(())
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;

    let claims = shiftmaster::auth::SessionConfig::new("test-secret", 24).decode(&token)?;
    let now = chrono::Utc::now();
    let forged = shiftmaster::auth::SessionConfig::new("other-secret", 24).encode(
        claims.sub,
        claims.sid,
        now,
        now + chrono::Duration::hours(1),
    )?;

    let resp = t.get("/api/auth/me", &forged).await?;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn logout_revokes_session_and_is_repeatable() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;

    let first = t.request(Method::POST, "/api/auth/logout", Some(&token), None).await?;
    assert_eq!(first.status, StatusCode::OK);
    let cleared = first
        .headers
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cleared.starts_with("access_token="), "logout must clear the cookie");

    let after = t.get("/api/auth/me", &token).await?;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    let second = t.request(Method::POST, "/api/auth/logout", Some(&token), None).await?;
    assert_eq!(second.status, StatusCode::OK);

    let anonymous = t.request(Method::POST, "/api/auth/logout", None, None).await?;
    assert_eq!(anonymous.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn sessions_are_independent() -> Result<()> {
    let t = common::spawn().await?;
    let first = t.login(ADMIN).await?;
    let second = t.login(ADMIN).await?;

    t.request(Method::POST, "/api/auth/logout", Some(&first), None).await?;

    assert_eq!(t.get("/api/auth/me", &first).await?.status, StatusCode::UNAUTHORIZED);
    assert_eq!(t.get("/api/auth/me", &second).await?.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn expired_session_row_is_rejected() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;

    sqlx::query("UPDATE sessions SET expires_at = ?")
        .bind(chrono::Utc::now() - chrono::Duration::minutes(1))
        .execute(&t.pool)
        .await?;

    let resp = t.get("/api/auth/me", &token).await?;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM sessions").fetch_one(&t.pool).await?;
    assert_eq!(remaining, 0, "expired rows are removed when seen");

    Ok(())
}

#[tokio::test]
async fn change_password_ends_every_session() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;
    let other = t.login(ADMIN).await?;

    let wrong = t
        .put(
            "/api/auth/password",
            &token,
            json!({ "current_password": "nope", "new_password": "N3wPassword!" }),
        )
        .await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let short = t
        .put(
            "/api/auth/password",
            &token,
            json!({ "current_password": ADMIN.1, "new_password": "short" }),
        )
        .await?;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let ok = t
        .put(
            "/api/auth/password",
            &token,
            json!({ "current_password": ADMIN.1, "new_password": "N3wPassword!" }),
        )
        .await?;
    assert_eq!(ok.status, StatusCode::OK);

    assert_eq!(t.get("/api/auth/me", &token).await?.status, StatusCode::UNAUTHORIZED);
    assert_eq!(t.get("/api/auth/me", &other).await?.status, StatusCode::UNAUTHORIZED);

    let relogin = t.login((ADMIN.0, "N3wPassword!")).await?;
    assert_eq!(t.get("/api/auth/me", &relogin).await?.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn super_admin_starts_in_global_view() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(SUPER_ADMIN).await?;

    let me = t.get("/api/auth/me", &token).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["role"], "super_admin");
    assert!(me.body["home_organization_id"].is_null());
    assert!(me.body["effective_organization_id"].is_null());
    assert_eq!(me.body["can_switch_organization"], true);

    Ok(())
}
