use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

const SCHEMA_LOCK_ID: i64 = 4_316_702;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &folio_config::Postgres) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.acquire_timeout(ACQUIRE_TIMEOUT)
			.connect(&cfg.dsn)
			.await?;

		Ok(Self { pool })
	}

	/// Applies the bundled schema. Safe to run from several processes at once.
	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let mut tx = self.pool.begin().await?;

		// Transaction-scoped, so the lock is released on commit or rollback.
		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&mut *tx)
			.await?;
		sqlx::raw_sql(&sql).execute(&mut *tx).await?;

		tx.commit().await?;

		tracing::debug!("Knowledge store schema is up to date.");

		Ok(())
	}
}
