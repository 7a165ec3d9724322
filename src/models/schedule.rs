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
pub enum ScheduleStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "2025年4月 勤務表")]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for Schedule {
    fn organization_id(&self) -> Option<Uuid> {
        Some(self.organization_id)
    }
}

impl ScopedTable for Schedule {
    const KIND: ResourceKind = ResourceKind::Schedule;
    const TABLE: &'static str = "schedules";
    const COLUMNS: &'static str = "id, organization_id, name, start_date, end_date, status, created_at, updated_at";
    const ORDER_BY: &'static str = "start_date DESC";
    const LABEL: &'static str = "schedule";
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleCreateRequest {
    #[schema(example = "2025年4月 勤務表")]
    pub name: String,
    #[schema(example = "2025-04-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2025-04-30")]
    pub end_date: NaiveDate,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleUpdateRequest {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ScheduleStatus>,
}
