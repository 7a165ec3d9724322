//! Tenant-scoped persistence helpers.
//!
//! Queries carry an `organization_id` predicate when the caller is scoped,
//! and every row still goes through [`TenantFilter`] before it is returned.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::authz::{ResourceKind, TenantFilter, TenantScoped};
use crate::errors::AppResult;

/// A table whose rows are partitioned by organization.
pub trait ScopedTable: TenantScoped + for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const KIND: ResourceKind;
    const TABLE: &'static str;
    const TENANT_COLUMN: &'static str = "organization_id";
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str;
    /// Used in not-found messages.
    const LABEL: &'static str;
}

pub async fn list_scoped<T: ScopedTable>(pool: &SqlitePool, filter: &TenantFilter) -> AppResult<Vec<T>> {
    let rows = match filter.organization_id() {
        Some(org) => {
            let sql = format!(
                "SELECT {} FROM {} WHERE {} = ? ORDER BY {}",
                T::COLUMNS,
                T::TABLE,
                T::TENANT_COLUMN,
                T::ORDER_BY
            );
            sqlx::query_as::<_, T>(&sql).bind(org).fetch_all(pool).await?
        }
        None => {
            let sql = format!("SELECT {} FROM {} ORDER BY {}", T::COLUMNS, T::TABLE, T::ORDER_BY);
            sqlx::query_as::<_, T>(&sql).fetch_all(pool).await?
        }
    };

    Ok(filter.apply(rows))
}

pub async fn fetch_scoped<T: ScopedTable>(pool: &SqlitePool, filter: &TenantFilter, id: Uuid) -> AppResult<T> {
    let row = match filter.organization_id() {
        Some(org) => {
            let sql = format!(
                "SELECT {} FROM {} WHERE id = ? AND {} = ?",
                T::COLUMNS,
                T::TABLE,
                T::TENANT_COLUMN
            );
            sqlx::query_as::<_, T>(&sql).bind(id).bind(org).fetch_optional(pool).await?
        }
        None => {
            let sql = format!("SELECT {} FROM {} WHERE id = ?", T::COLUMNS, T::TABLE);
            sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(pool).await?
        }
    };

    filter.visible(row, T::LABEL)
}

/// Deletes a visible row and returns it. Foreign rows read as not found.
pub async fn delete_scoped<T: ScopedTable>(pool: &SqlitePool, filter: &TenantFilter, id: Uuid) -> AppResult<T> {
    let row: T = fetch_scoped(pool, filter, id).await?;

    let sql = format!("DELETE FROM {} WHERE id = ? AND {} = ?", T::TABLE, T::TENANT_COLUMN);
    sqlx::query(&sql)
        .bind(id)
        .bind(row.organization_id())
        .execute(pool)
        .await
        .map_err(|err| super::map_constraint(err, &format!("{} is still referenced", T::LABEL)))?;

    Ok(row)
}
