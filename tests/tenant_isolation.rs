mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{strings, ADMIN, MANAGER, OTHER_ADMIN};

#[tokio::test]
async fn staff_listing_is_confined_to_home_organization() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(ADMIN).await?;

    let resp = t.get("/api/staffs", &token).await?;
    assert_eq!(resp.status, StatusCode::OK);

    let names = strings(&resp.body, "full_name");
    assert!(names.contains(&"山田 花子".to_string()), "got {names:?}");
    assert!(!names.contains(&"鈴木 一郎".to_string()), "foreign staff leaked: {names:?}");

    Ok(())
}

#[tokio::test]
async fn other_tenant_sees_none_of_the_primary_shift_types() -> Result<()> {
    let t = common::spawn().await?;
    let token = t.login(OTHER_ADMIN).await?;

    let resp = t.get("/api/shifts", &token).await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(!strings(&resp.body, "name").contains(&"日勤".to_string()));

    let staffs = t.get("/api/staffs", &token).await?;
    assert_eq!(strings(&staffs.body, "full_name"), vec!["鈴木 一郎".to_string()]);

    Ok(())
}

#[tokio::test]
async fn foreign_rows_are_not_found_by_id() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let other = t.login(OTHER_ADMIN).await?;

    let listing = t.get("/api/staffs", &other).await?;
    let foreign_id = listing.body[0]["id"].as_str().expect("other tenant has one staff").to_string();

    let get = t.get(&format!("/api/staffs/{foreign_id}"), &admin).await?;
    assert_eq!(get.status, StatusCode::NOT_FOUND);

    let put = t
        .put(&format!("/api/staffs/{foreign_id}"), &admin, json!({ "last_name": "改竄" }))
        .await?;
    assert_eq!(put.status, StatusCode::NOT_FOUND);

    let delete = t.delete(&format!("/api/staffs/{foreign_id}"), &admin).await?;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    // Untouched in its own tenant.
    let still_there = t.get(&format!("/api/staffs/{foreign_id}"), &other).await?;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["last_name"], "鈴木");

    Ok(())
}

#[tokio::test]
async fn creating_in_another_organization_is_forbidden() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;

    let resp = t
        .post(
            "/api/staffs",
            &admin,
            json!({
                "employee_code": "X0001",
                "last_name": "越境",
                "first_name": "太郎",
                "organization_id": t.seed.other_organization_id,
            }),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM staffs WHERE employee_code = 'X0001'")
        .fetch_one(&t.pool)
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn created_rows_land_in_caller_organization() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let other = t.login(OTHER_ADMIN).await?;

    let created = t
        .post(
            "/api/shifts",
            &admin,
            json!({ "name": "半日", "code": "H", "start_time": "08:30", "end_time": "12:30" }),
        )
        .await?;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["organization_id"], t.seed.primary_organization_id.to_string());

    // Same code is free in another tenant.
    let other_created = t
        .post(
            "/api/shifts",
            &other,
            json!({ "name": "半日", "code": "H", "start_time": "08:30", "end_time": "12:30" }),
        )
        .await?;
    assert_eq!(other_created.status, StatusCode::CREATED);
    assert_eq!(other_created.body["organization_id"], t.seed.other_organization_id.to_string());

    Ok(())
}

#[tokio::test]
async fn references_must_stay_inside_the_tenant() -> Result<()> {
    let t = common::spawn().await?;
    let admin = t.login(ADMIN).await?;
    let other = t.login(OTHER_ADMIN).await?;

    let foreign_staff = t.get("/api/staffs", &other).await?.body[0]["id"].clone();
    let request = t
        .post(
            "/api/requests",
            &admin,
            json!({ "staff_id": foreign_staff, "request_type": "day_off", "target_date": "2025-04-10" }),
        )
        .await?;
    assert_eq!(request.status, StatusCode::NOT_FOUND);

    let team = t.get("/api/teams", &admin).await?.body[0]["id"].clone();
    let staff = t
        .post(
            "/api/staffs",
            &other,
            json!({ "employee_code": "T0002", "last_name": "田中", "first_name": "次郎", "team_id": team }),
        )
        .await?;
    assert_eq!(staff.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn schedules_are_isolated_between_tenants() -> Result<()> {
    let t = common::spawn().await?;
    let manager = t.login(MANAGER).await?;
    let other = t.login(OTHER_ADMIN).await?;

    let created = t
        .post(
            "/api/schedules",
            &manager,
            json!({ "name": "2025年4月 勤務表", "start_date": "2025-04-01", "end_date": "2025-04-30" }),
        )
        .await?;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["id"].as_str().expect("schedule id").to_string();

    assert_eq!(t.get(&format!("/api/schedules/{id}"), &manager).await?.status, StatusCode::OK);
    assert_eq!(t.get(&format!("/api/schedules/{id}"), &other).await?.status, StatusCode::NOT_FOUND);
    assert!(t.get("/api/schedules", &other).await?.body.as_array().is_some_and(|a| a.is_empty()));

    Ok(())
}
