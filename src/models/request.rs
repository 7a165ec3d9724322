use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{ResourceKind, TenantScoped};
use crate::db::scoped::ScopedTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum RequestType {
    DayOff,
    PreferredShift,
    AvoidShift,
}

/// A staff member's scheduling request (day off, shift preference).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ShiftRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub staff_id: Uuid,
    pub request_type: RequestType,
    pub target_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for ShiftRequest {
    fn organization_id(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

impl ScopedTable for ShiftRequest {
    const KIND: ResourceKind = ResourceKind::Request;
    const TABLE: &'static str = "requests";
    const COLUMNS: &'static str =
        "id, organization_id, staff_id, request_type, target_date, note, created_at, updated_at";
    const ORDER_BY: &'static str = "target_date";
    const LABEL: &'static str = "request";
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShiftRequestCreateRequest {
    pub staff_id: Uuid,
    pub request_type: RequestType,
    #[schema(example = "2025-04-12")]
    pub target_date: NaiveDate,
    pub note: Option<String>,
}
