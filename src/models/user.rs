use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{ResourceKind, Role, TenantScoped};
use crate::db::scoped::ScopedTable;
use crate::events::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[schema(example = "テナント管理者")]
    pub role_label: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for User {
    fn entity_type() -> &'static str { "user" }
    fn subject_id(&self) -> Uuid { self.id }
    fn tenant_id(&self) -> Option<Uuid> { self.organization_id }
    fn severity(&self) -> Severity { Severity::Critical }
}

impl TenantScoped for User {
    fn organization_id(&self) -> Option<Uuid> {
        self.organization_id
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for DbUser {
    fn organization_id(&self) -> Option<Uuid> {
        self.organization_id
    }
}

impl ScopedTable for DbUser {
    const KIND: ResourceKind = ResourceKind::User;
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str =
        "id, organization_id, email, password_hash, name, role, is_active, last_login_at, created_at, updated_at";
    const ORDER_BY: &'static str = "email";
    const LABEL: &'static str = "user";
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        User {
            id: value.id,
            organization_id: value.organization_id,
            email: value.email,
            name: value.name,
            role: value.role,
            role_label: value.role.label().to_string(),
            is_active: value.is_active,
            last_login_at: value.last_login_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Emails are unique regardless of case; they are stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "Password123$!")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    #[schema(example = "nurse@example.com")]
    pub email: String,
    #[schema(example = "看護 太郎")]
    pub name: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
    pub role: Role,
    /// Required for a super_admin in the global scope, otherwise defaults
    /// to the caller's organization.
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}
