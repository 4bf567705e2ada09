use qdrant_client::{
	Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
		PointStruct, PointsIdsList, Query, QueryPointsBuilder, SearchParamsBuilder,
		UpsertPointsBuilder, VectorParamsBuilder, point_id::PointIdOptions,
	},
};
use uuid::Uuid;

use folio_domain::{Category, KnowledgeFragment};

use crate::{Error, Result};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &folio_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the cosine collection when it does not exist yet.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine),
				),
			)
			.await?;

		tracing::info!(collection = %self.collection, "Created Qdrant collection.");

		Ok(())
	}

	pub async fn upsert(&self, fragment: &KnowledgeFragment, vector: &[f32]) -> Result<()> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::DimensionMismatch {
				fragment_id: fragment.id,
				expected: self.vector_dim,
				actual: vector.len(),
			});
		}

		let point =
			PointStruct::new(fragment.id.to_string(), vector.to_vec(), point_payload(fragment));

		self.client
			.upsert_points(
				UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true),
			)
			.await?;

		Ok(())
	}

	pub async fn delete(&self, id: Uuid) -> Result<()> {
		let ids = PointsIdsList { ids: vec![PointId::from(id.to_string())] };

		self.client
			.delete_points(DeletePointsBuilder::new(self.collection.clone()).points(ids).wait(true))
			.await?;

		Ok(())
	}

	/// Nearest active points, optionally pre-filtered by category. Scores are raw cosine
	/// similarities in [-1, 1].
	pub async fn search(
		&self,
		vector: &[f32],
		limit: u64,
		num_candidates: u64,
		category: Option<Category>,
	) -> Result<Vec<(Uuid, f32)>> {
		let mut conditions = vec![Condition::matches("is_active", true)];

		if let Some(category) = category {
			conditions.push(Condition::matches("category", category.as_str().to_string()));
		}

		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.filter(Filter::must(conditions))
			.params(SearchParamsBuilder::default().hnsw_ef(num_candidates))
			.limit(limit)
			.with_payload(false);
		let response = self.client.query(search).await?;
		let mut hits = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(id) = point.id.as_ref().and_then(point_id_to_uuid) else {
				tracing::warn!(collection = %self.collection, "Skipping Qdrant point with a non-UUID id.");

				continue;
			};

			hits.push((id, point.score));
		}

		Ok(hits)
	}
}

fn point_payload(fragment: &KnowledgeFragment) -> Payload {
	let mut payload = Payload::new();

	payload.insert("fragment_id", fragment.id.to_string());
	payload.insert("category", fragment.category.as_str().to_string());
	payload.insert("priority", fragment.priority.as_str().to_string());
	payload.insert("is_active", fragment.is_active);

	payload
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}
