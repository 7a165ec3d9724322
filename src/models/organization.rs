use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{ResourceKind, TenantScoped};
use crate::db::scoped::ScopedTable;
use crate::events::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Organization {
    pub id: Uuid,
    #[schema(example = "サンプル病院")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An organization is its own tenant.
impl TenantScoped for Organization {
    fn organization_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

impl ScopedTable for Organization {
    const KIND: ResourceKind = ResourceKind::Organization;
    const TABLE: &'static str = "organizations";
    const TENANT_COLUMN: &'static str = "id";
    const COLUMNS: &'static str = "id, name, created_at, updated_at";
    const ORDER_BY: &'static str = "name";
    const LABEL: &'static str = "organization";
}

impl Loggable for Organization {
    fn entity_type() -> &'static str { "organization" }
    fn subject_id(&self) -> Uuid { self.id }
    fn tenant_id(&self) -> Option<Uuid> { Some(self.id) }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrganizationCreateRequest {
    #[schema(example = "テスト医療センター")]
    pub name: String,
}
