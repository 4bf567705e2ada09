use std::sync::Arc;

use folio_service::FolioService;
use folio_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<FolioService>,
}
impl AppState {
	/// Connects Postgres and, when configured, Qdrant. A Qdrant outage at startup is logged and
	/// the service keeps running on the lexical fallback.
	pub async fn new(config: folio_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = match config.storage.qdrant.as_ref() {
			Some(cfg) => {
				let store = QdrantStore::new(cfg)?;

				if let Err(err) = store.ensure_collection().await {
					tracing::warn!(error = %err, "Qdrant collection check failed.");
				}

				Some(store)
			},
			None => {
				tracing::info!("No vector index configured; retrieval uses the lexical fallback.");

				None
			},
		};

		Ok(Self::from_service(FolioService::new(config, db, qdrant)))
	}

	pub fn from_service(service: FolioService) -> Self {
		Self { service: Arc::new(service) }
	}
}
