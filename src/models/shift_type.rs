use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{ResourceKind, TenantScoped};
use crate::db::scoped::ScopedTable;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ShiftType {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "日勤")]
    pub name: String,
    #[schema(example = "D")]
    pub code: String,
    #[schema(example = "08:30")]
    pub start_time: String,
    #[schema(example = "17:30")]
    pub end_time: String,
    #[schema(example = "#4CAF50")]
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for ShiftType {
    fn organization_id(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

impl ScopedTable for ShiftType {
    const KIND: ResourceKind = ResourceKind::ShiftType;
    const TABLE: &'static str = "shift_types";
    const COLUMNS: &'static str =
        "id, organization_id, name, code, start_time, end_time, color, created_at, updated_at";
    const ORDER_BY: &'static str = "code";
    const LABEL: &'static str = "shift type";
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShiftTypeCreateRequest {
    #[schema(example = "夜勤")]
    pub name: String,
    #[schema(example = "N")]
    pub code: String,
    #[schema(example = "17:00")]
    pub start_time: String,
    #[schema(example = "09:00")]
    pub end_time: String,
    #[schema(example = "#3F51B5")]
    pub color: Option<String>,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShiftTypeUpdateRequest {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub color: Option<String>,
}
