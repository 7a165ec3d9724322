use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{ResourceKind, TenantScoped};
use crate::db::scoped::ScopedTable;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "3階東病棟")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for Team {
    fn organization_id(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

impl ScopedTable for Team {
    const KIND: ResourceKind = ResourceKind::Team;
    const TABLE: &'static str = "teams";
    const COLUMNS: &'static str = "id, organization_id, name, description, created_at, updated_at";
    const ORDER_BY: &'static str = "name";
    const LABEL: &'static str = "team";
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TeamCreateRequest {
    #[schema(example = "3階東病棟")]
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<Uuid>,
}
