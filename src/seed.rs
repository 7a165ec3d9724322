//! Demo data: two hospitals, one account per role and a few shift types.
//!
//! Re-running is safe; rows that already exist (matched by name, email or
//! code) are left untouched.

use sqlx::SqlitePool;
use uuid::{uuid, Uuid};

use crate::authz::Role;
use crate::errors::AppResult;
use crate::models::user::normalize_email;
use crate::utils::{hash_password, utc_now};

pub const PRIMARY_ORGANIZATION_ID: Uuid = uuid!("109e0070-a30d-46d7-8593-fdfa364a8e37");
pub const PRIMARY_ORGANIZATION_NAME: &str = "サンプル病院";
pub const OTHER_ORGANIZATION_NAME: &str = "テスト医療センター";

struct SeedAccount {
    email: &'static str,
    password: &'static str,
    name: &'static str,
    role: Role,
}

const PRIMARY_ACCOUNTS: &[SeedAccount] = &[
    SeedAccount { email: "admin@example.com", password: "Password123$!", name: "システム 管理者", role: Role::Admin },
    SeedAccount { email: "manager@example.com", password: "Manager123$!", name: "マネージャー 太郎", role: Role::Manager },
    SeedAccount { email: "user@example.com", password: "User123$!", name: "一般 花子", role: Role::User },
];

const OTHER_ACCOUNTS: &[SeedAccount] = &[SeedAccount {
    email: "otheradmin@example.com",
    password: "OtherAdmin123$!",
    name: "他院管理者 次郎",
    role: Role::Admin,
}];

const SUPER_ADMIN: SeedAccount = SeedAccount {
    email: "superadmin@example.com",
    password: "SuperAdmin123$!",
    name: "スーパー 管理者",
    role: Role::SuperAdmin,
};

/// (name, code, color, start, end)
const SHIFT_TYPES: &[(&str, &str, &str, &str, &str)] = &[
    ("日勤", "D", "#4CAF50", "08:30", "17:30"),
    ("夜勤", "N", "#3F51B5", "17:00", "09:00"),
    ("早番", "E", "#FF9800", "06:30", "15:30"),
    ("遅番", "L", "#9C27B0", "12:00", "21:00"),
    ("公休", "O", "#9E9E9E", "00:00", "00:00"),
    ("有給", "Y", "#2196F3", "00:00", "00:00"),
];

#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub primary_organization_id: Uuid,
    pub other_organization_id: Uuid,
}

pub async fn run(pool: &SqlitePool) -> AppResult<SeedSummary> {
    let primary = ensure_organization(pool, PRIMARY_ORGANIZATION_ID, PRIMARY_ORGANIZATION_NAME).await?;
    let other = ensure_organization(pool, Uuid::new_v4(), OTHER_ORGANIZATION_NAME).await?;

    ensure_account(pool, None, &SUPER_ADMIN).await?;
    for account in PRIMARY_ACCOUNTS {
        ensure_account(pool, Some(primary), account).await?;
    }
    for account in OTHER_ACCOUNTS {
        ensure_account(pool, Some(other), account).await?;
    }

    let nursing = ensure_team(pool, primary, "看護部").await?;
    for (name, code, color, start, end) in SHIFT_TYPES {
        ensure_shift_type(pool, primary, name, code, color, start, end).await?;
    }

    ensure_staff(pool, primary, Some(nursing), "N0001", "山田", "花子").await?;
    ensure_staff(pool, other, None, "T0001", "鈴木", "一郎").await?;

    tracing::info!(%primary, %other, "seed data in place");
    Ok(SeedSummary {
        primary_organization_id: primary,
        other_organization_id: other,
    })
}

async fn ensure_organization(pool: &SqlitePool, id: Uuid, name: &str) -> AppResult<Uuid> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM organizations WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let now = utc_now();
    sqlx::query("INSERT INTO organizations (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    tracing::info!(organization_id = %id, name, "organization seeded");
    Ok(id)
}

async fn ensure_account(pool: &SqlitePool, organization_id: Option<Uuid>, account: &SeedAccount) -> AppResult<()> {
    let email = normalize_email(account.email);
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE lower(email) = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        return Ok(());
    }

    let now = utc_now();
    sqlx::query(
        "INSERT INTO users (id, organization_id, email, password_hash, name, role, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(organization_id)
    .bind(&email)
    .bind(hash_password(account.password)?)
    .bind(account.name)
    .bind(account.role)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    tracing::info!(email = %email, role = %account.role, "account seeded");
    Ok(())
}

async fn ensure_team(pool: &SqlitePool, organization_id: Uuid, name: &str) -> AppResult<Uuid> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM teams WHERE organization_id = ? AND name = ?")
        .bind(organization_id)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query("INSERT INTO teams (id, organization_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id)
        .bind(organization_id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(id)
}

async fn ensure_shift_type(
    pool: &SqlitePool,
    organization_id: Uuid,
    name: &str,
    code: &str,
    color: &str,
    start_time: &str,
    end_time: &str,
) -> AppResult<()> {
    let now = utc_now();
    sqlx::query(
        "INSERT OR IGNORE INTO shift_types (id, organization_id, name, code, start_time, end_time, color, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(organization_id)
    .bind(name)
    .bind(code)
    .bind(start_time)
    .bind(end_time)
    .bind(color)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_staff(
    pool: &SqlitePool,
    organization_id: Uuid,
    team_id: Option<Uuid>,
    employee_code: &str,
    last_name: &str,
    first_name: &str,
) -> AppResult<()> {
    let now = utc_now();
    sqlx::query(
        "INSERT OR IGNORE INTO staffs (id, organization_id, team_id, employee_code, last_name, first_name, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(organization_id)
    .bind(team_id)
    .bind(employee_code)
    .bind(last_name)
    .bind(first_name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
