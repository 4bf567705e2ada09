//! Throwaway backing services for the live integration tests.
//!
//! A [`TestStack`] owns one freshly created Postgres database and, when `FOLIO_QDRANT_URL` is
//! set, one Qdrant collection. Both are removed by [`TestStack::release`] or, failing that, on
//! drop.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

pub const PG_DSN_VAR: &str = "FOLIO_PG_DSN";
pub const QDRANT_URL_VAR: &str = "FOLIO_QDRANT_URL";

const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const QDRANT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestStack {
	database: String,
	dsn: String,
	maintenance: PgConnectOptions,
	qdrant: Option<TestCollection>,
	released: bool,
}
impl TestStack {
	/// `None` when `FOLIO_PG_DSN` is unset, so callers can skip instead of failing.
	pub async fn from_env() -> Result<Option<Self>> {
		let Some(base_dsn) = env_var(PG_DSN_VAR) else { return Ok(None) };

		Self::create(&base_dsn, env_var(QDRANT_URL_VAR)).await.map(Some)
	}

	pub async fn create(base_dsn: &str, qdrant_url: Option<String>) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Setup(format!("{PG_DSN_VAR} is not a valid DSN: {err}.")))?;
		let (maintenance, mut conn) = connect_maintenance(&base).await?;
		let suffix = Uuid::new_v4().simple().to_string();
		let database = format!("folio_test_{suffix}");

		conn.execute(format!(r#"CREATE DATABASE "{database}""#).as_str()).await?;

		let dsn = base.database(&database).to_url_lossy().to_string();
		let qdrant = qdrant_url
			.map(|url| TestCollection { url, name: format!("folio_knowledge_test_{suffix}") });

		Ok(Self { database, dsn, maintenance, qdrant, released: false })
	}

	/// Postgres settings pointing at the throwaway database.
	pub fn postgres(&self) -> folio_config::Postgres {
		folio_config::Postgres { dsn: self.dsn.clone(), pool_max_conns: 2 }
	}

	/// Qdrant settings for the owned collection, or `None` without `FOLIO_QDRANT_URL`.
	pub fn qdrant(&self, vector_dim: u32) -> Option<folio_config::Qdrant> {
		self.qdrant.as_ref().map(|collection| folio_config::Qdrant {
			url: collection.url.clone(),
			collection: collection.name.clone(),
			vector_dim,
		})
	}

	pub async fn release(mut self) -> Result<()> {
		self.released = true;

		let qdrant = release_collection(self.qdrant.as_ref()).await;

		drop_database(&self.database, &self.maintenance).await?;

		qdrant
	}
}
impl Drop for TestStack {
	fn drop(&mut self) {
		if self.released {
			return;
		}

		let database = self.database.clone();
		let maintenance = self.maintenance.clone();
		let qdrant = self.qdrant.take();
		// The test runtime may already be shutting down, so cleanup gets its own.
		let handle = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Cannot start cleanup runtime for {database}: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(release_collection(qdrant.as_ref())) {
				eprintln!("{err}");
			}
			if let Err(err) = runtime.block_on(drop_database(&database, &maintenance)) {
				eprintln!("{err}");
			}
		});

		let _ = handle.join();
	}
}

struct TestCollection {
	url: String,
	name: String,
}

fn env_var(name: &str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.trim().is_empty())
}

async fn connect_maintenance(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut errors = Vec::new();

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => errors.push(format!("{database}: {err}")),
		}
	}

	Err(Error::Setup(format!("No maintenance database reachable ({}).", errors.join("; "))))
}

async fn drop_database(database: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance)
		.await
		.map_err(|err| Error::Cleanup(format!("{database}: {err}.")))?;

	// Pooled connections from the test may still be open.
	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(database)
	.fetch_all(&mut conn)
	.await
	.map_err(|err| Error::Cleanup(format!("{database}: {err}.")))?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{database}""#).as_str())
		.await
		.map_err(|err| Error::Cleanup(format!("{database}: {err}.")))?;

	Ok(())
}

async fn release_collection(collection: Option<&TestCollection>) -> Result<()> {
	let Some(collection) = collection else { return Ok(()) };
	let client = Qdrant::from_url(&collection.url)
		.build()
		.map_err(|err| Error::Cleanup(format!("Qdrant client for {}: {err}.", collection.url)))?;

	match time::timeout(QDRANT_TIMEOUT, client.delete_collection(collection.name.clone())).await {
		Ok(Ok(_)) => Ok(()),
		Ok(Err(err)) => Err(Error::Cleanup(format!("collection {}: {err}.", collection.name))),
		Err(_) => Err(Error::Cleanup(format!("collection {} timed out.", collection.name))),
	}
}
