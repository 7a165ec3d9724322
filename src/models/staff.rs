use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{ResourceKind, TenantScoped};
use crate::db::scoped::ScopedTable;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Staff {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub team_id: Option<Uuid>,
    #[schema(example = "N0001")]
    pub employee_code: String,
    #[schema(example = "山田")]
    pub last_name: String,
    #[schema(example = "花子")]
    pub first_name: String,
    /// Family name first, e.g. "山田 花子".
    pub full_name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbStaff {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub team_id: Option<Uuid>,
    pub employee_code: String,
    pub last_name: String,
    pub first_name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbStaff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

impl TenantScoped for DbStaff {
    fn organization_id(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

impl ScopedTable for DbStaff {
    const KIND: ResourceKind = ResourceKind::Staff;
    const TABLE: &'static str = "staffs";
    const COLUMNS: &'static str =
        "id, organization_id, team_id, employee_code, last_name, first_name, email, is_active, created_at, updated_at";
    const ORDER_BY: &'static str = "employee_code";
    const LABEL: &'static str = "staff";
}

impl From<DbStaff> for Staff {
    fn from(value: DbStaff) -> Self {
        let full_name = value.full_name();
        Staff {
            id: value.id,
            organization_id: value.organization_id,
            team_id: value.team_id,
            employee_code: value.employee_code,
            last_name: value.last_name,
            first_name: value.first_name,
            full_name,
            email: value.email,
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StaffCreateRequest {
    #[schema(example = "N0002")]
    pub employee_code: String,
    #[schema(example = "佐藤")]
    pub last_name: String,
    #[schema(example = "美咲")]
    pub first_name: String,
    pub email: Option<String>,
    pub team_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StaffUpdateRequest {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub team_id: Option<Uuid>,
    pub is_active: Option<bool>,
}
