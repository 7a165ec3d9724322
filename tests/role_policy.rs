mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{strings, ADMIN, MANAGER, OTHER_ADMIN, SUPER_ADMIN, USER};
use shiftmaster::seed::PRIMARY_ORGANIZATION_ID;

async fn user_id(t: &common::TestApp, email: &str) -> Result<Uuid> {
    Ok(sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(&t.pool)
        .await?)
}

#[tokio::test]
async fn manager_reaches_schedules_but_not_user_admin() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(MANAGER).await?;

    assert_eq!(t.get("/api/admin/users", &token).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(t.get("/api/schedules", &token).await?.status, StatusCode::OK);
    assert_eq!(t.get("/api/staffs", &token).await?.status, StatusCode::OK);

    let staff = t
        .post(
            "/api/staffs",
            &token,
            json!({ "employee_code": "N0099", "last_name": "佐藤", "first_name": "美咲" }),
        )
        .await?;
    assert_eq!(staff.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn plain_user_is_read_only() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(USER).await?;

    assert_eq!(t.get("/api/staffs", &token).await?.status, StatusCode::OK);
    assert_eq!(t.get("/api/shifts", &token).await?.status, StatusCode::OK);
    assert_eq!(t.get("/api/schedules", &token).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(t.get("/api/admin/organizations", &token).await?.status, StatusCode::FORBIDDEN);

    let staff_id = t.get("/api/staffs", &token).await?.body[0]["id"].as_str().map(String::from);
    let staff_id = staff_id.expect("primary tenant has staff");
    let delete = t.delete(&format!("/api/staffs/{staff_id}"), &token).await?;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn admin_cannot_mint_super_admins() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;

    let resp = t
        .post(
            "/api/admin/users",
            &token,
            json!({ "email": "root@example.com", "name": "乗っ取り", "password": "Escalate123!", "role": "super_admin" }),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let own_id = user_id(&t, ADMIN.0).await?;
    let promote = t
        .put(&format!("/api/admin/users/{own_id}"), &token, json!({ "role": "super_admin" }))
        .await?;
    assert_eq!(promote.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn admin_creates_users_in_own_organization() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;

    let resp = t
        .post(
            "/api/admin/users",
            &token,
            json!({ "email": "Nurse@Example.com", "name": "看護 太郎", "password": "S3cureP@ssw0rd", "role": "manager" }),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    assert_eq!(resp.body["email"], "nurse@example.com");
    assert_eq!(resp.body["organization_id"], t.seed.primary_organization_id.to_string());
    assert!(resp.body.get("password_hash").is_none());

    let duplicate = t
        .post(
            "/api/admin/users",
            &token,
            json!({ "email": "NURSE@example.com", "name": "重複", "password": "S3cureP@ssw0rd", "role": "user" }),
        )
        .await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let foreign = t
        .post(
            "/api/admin/users",
            &token,
            json!({
                "email": "spy@example.com",
                "name": "越境",
                "password": "S3cureP@ssw0rd",
                "role": "user",
                "organization_id": t.seed.other_organization_id,
            }),
        )
        .await?;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let weak = t
        .post(
            "/api/admin/users",
            &token,
            json!({ "email": "weak@example.com", "name": "短い", "password": "short", "role": "user" }),
        )
        .await?;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn admin_user_listing_stays_in_tenant() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;

    let resp = t.get("/api/admin/users", &token).await?;
    assert_eq!(resp.status, StatusCode::OK);
    let emails = strings(&resp.body, "email");
    assert!(emails.contains(&MANAGER.0.to_string()));
    assert!(!emails.contains(&OTHER_ADMIN.0.to_string()));
    assert!(!emails.contains(&SUPER_ADMIN.0.to_string()));

    let super_id = user_id(&t, SUPER_ADMIN.0).await?;
    let touch = t
        .put(&format!("/api/admin/users/{super_id}"), &token, json!({ "is_active": false }))
        .await?;
    assert_eq!(touch.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn deactivation_revokes_live_sessions() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let victim = t.login(USER).await?;
    assert_eq!(t.get("/api/auth/me", &victim).await?.status, StatusCode::OK);

    let id = user_id(&t, USER.0).await?;
    let resp = t
        .put(&format!("/api/admin/users/{id}"), &admin, json!({ "is_active": false }))
        .await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["is_active"], false);

    assert_eq!(t.get("/api/auth/me", &victim).await?.status, StatusCode::UNAUTHORIZED);

    let relogin = t
        .request(
            axum::http::Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": USER.0, "password": USER.1 })),
        )
        .await?;
    assert_eq!(relogin.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn role_change_applies_to_existing_session() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let manager = t.login(MANAGER).await?;
    assert_eq!(t.get("/api/schedules", &manager).await?.status, StatusCode::OK);

    let id = user_id(&t, MANAGER.0).await?;
    let resp = t
        .put(&format!("/api/admin/users/{id}"), &admin, json!({ "role": "user" }))
        .await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["role"], "user");

    assert_eq!(t.get("/api/schedules", &manager).await?.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn last_admin_cannot_be_demoted_or_deactivated() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let id = user_id(&t, ADMIN.0).await?;

    let demote = t
        .put(&format!("/api/admin/users/{id}"), &admin, json!({ "role": "manager" }))
        .await?;
    assert_eq!(demote.status, StatusCode::BAD_REQUEST);

    let deactivate = t
        .put(&format!("/api/admin/users/{id}"), &admin, json!({ "is_active": false }))
        .await?;
    assert_eq!(deactivate.status, StatusCode::BAD_REQUEST);

    // A second admin lifts the restriction.
    let created = t
        .post(
            "/api/admin/users",
            &admin,
            json!({ "email": "admin2@example.com", "name": "副 管理者", "password": "Sec0ndAdmin!", "role": "admin" }),
        )
        .await?;
    assert_eq!(created.status, StatusCode::CREATED);

    let demote = t
        .put(&format!("/api/admin/users/{id}"), &admin, json!({ "role": "manager" }))
        .await?;
    assert_eq!(demote.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn organizations_are_managed_by_super_admin_only() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let root = t.login(SUPER_ADMIN).await?;

    let denied = t.post("/api/admin/organizations", &admin, json!({ "name": "新病院" })).await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let created = t.post("/api/admin/organizations", &root, json!({ "name": "新病院" })).await?;
    assert_eq!(created.status, StatusCode::CREATED);

    let duplicate = t.post("/api/admin/organizations", &root, json!({ "name": "新病院" })).await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let own = t.get("/api/admin/organizations", &admin).await?;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(strings(&own.body, "name"), vec![shiftmaster::seed::PRIMARY_ORGANIZATION_NAME.to_string()]);

    let all = t.get("/api/admin/organizations", &root).await?;
    assert_eq!(all.body.as_array().map(Vec::len), Some(3));

    Ok(())
}

#[tokio::test]
async fn concurrent_demotions_keep_one_admin() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let root = t.login(SUPER_ADMIN).await?;

    let created = t
        .post(
            "/api/admin/users",
            &admin,
            json!({ "email": "admin2@example.com", "name": "副 管理者", "password": "Sec0ndAdmin!", "role": "admin" }),
        )
        .await?;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

    let first = user_id(&t, ADMIN.0).await?;
    let second = user_id(&t, "admin2@example.com").await?;
    let first_path = format!("/api/admin/users/{first}");
    let second_path = format!("/api/admin/users/{second}");
    let (a, b) = tokio::join!(
        t.put(&first_path, &root, json!({ "role": "manager" })),
        t.put(&second_path, &root, json!({ "role": "manager" })),
    );
    let mut statuses = vec![a?.status, b?.status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::BAD_REQUEST]);

    let admins: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE organization_id = ? AND role = 'admin' AND is_active = 1",
    )
    .bind(PRIMARY_ORGANIZATION_ID)
    .fetch_one(&t.pool)
    .await?;
    assert_eq!(admins, 1);

    Ok(())
}

#[tokio::test]
async fn request_creation_is_authorized_before_staff_lookup() -> Result<()> {
    let t = common::spawn().await?;
    let manager = t.login(MANAGER).await?;
    let admin = t.login(ADMIN).await?;
    let body = json!({ "staff_id": Uuid::new_v4(), "request_type": "day_off", "target_date": "2025-04-01" });

    let denied = t.post("/api/requests", &manager, body.clone()).await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let missing = t.post("/api/requests", &admin, body).await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    Ok(())
}
