use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub mod scoped;

pub async fn init() -> anyhow::Result<SqlitePool> {
	let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

	let pool = SqlitePoolOptions::new()
		.max_connections(10)
		.min_connections(1)
		.acquire_timeout(Duration::from_secs(10))
		.connect(&database_url)
		.await
		.context("failed to connect to database")?;

	sqlx::migrate!()
		.run(&pool)
		.await
		.context("failed to run migrations")?;

	Ok(pool)
}

/// Maps constraint violations onto 409 so callers see a conflict instead of
/// a storage fault.
pub fn map_constraint(err: sqlx::Error, message: &str) -> crate::errors::AppError {
	match err.as_database_error() {
		Some(db_err) if db_err.is_unique_violation() || db_err.is_foreign_key_violation() => {
			crate::errors::AppError::conflict(message)
		}
		_ => crate::errors::AppError::Database(err),
	}
}
