//! Storage seams of the retriever and their Postgres/Qdrant implementations.

use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{Category, KnowledgeFragment};
use folio_storage::{db::Db, qdrant::QdrantStore, queries};

use crate::{BoxFuture, Result};

pub trait FragmentStore
where
	Self: Send + Sync,
{
	/// Active fragments, optionally restricted to one category.
	fn list_active(
		&self,
		category: Option<Category>,
	) -> BoxFuture<'_, Result<Vec<KnowledgeFragment>>>;

	/// Active fragments among `ids`, in no particular order. Unknown or inactive ids are skipped.
	fn find_active_by_ids<'a>(
		&'a self,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<KnowledgeFragment>>>;

	fn increment_query_count<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<u64>>;

	fn find_by_id(&self, id: Uuid) -> BoxFuture<'_, Result<Option<KnowledgeFragment>>>;

	fn list_all(&self) -> BoxFuture<'_, Result<Vec<KnowledgeFragment>>>;

	fn insert<'a>(&'a self, fragment: &'a KnowledgeFragment) -> BoxFuture<'a, Result<()>>;

	fn update<'a>(&'a self, fragment: &'a KnowledgeFragment) -> BoxFuture<'a, Result<()>>;

	fn set_embedding<'a>(
		&'a self,
		id: Uuid,
		embedding: Option<&'a [f32]>,
	) -> BoxFuture<'a, Result<()>>;

	fn deactivate(&self, id: Uuid, now: OffsetDateTime) -> BoxFuture<'_, Result<bool>>;

	fn list_missing_embeddings(
		&self,
		dimensions: u32,
	) -> BoxFuture<'_, Result<Vec<KnowledgeFragment>>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Up to `limit` `(id, cosine)` pairs, nearest first. `num_candidates` sizes the ANN beam.
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u64,
		num_candidates: u64,
		category: Option<Category>,
	) -> BoxFuture<'a, Result<Vec<(Uuid, f32)>>>;

	fn upsert<'a>(
		&'a self,
		fragment: &'a KnowledgeFragment,
		vector: &'a [f32],
	) -> BoxFuture<'a, Result<()>>;

	fn remove(&self, id: Uuid) -> BoxFuture<'_, Result<()>>;
}

impl FragmentStore for Db {
	fn list_active(
		&self,
		category: Option<Category>,
	) -> BoxFuture<'_, Result<Vec<KnowledgeFragment>>> {
		Box::pin(async move { Ok(queries::list_active(self, category).await?) })
	}

	fn find_active_by_ids<'a>(
		&'a self,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<KnowledgeFragment>>> {
		Box::pin(async move { Ok(queries::find_active_by_ids(self, ids).await?) })
	}

	fn increment_query_count<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(queries::increment_query_count(self, ids).await?) })
	}

	fn find_by_id(&self, id: Uuid) -> BoxFuture<'_, Result<Option<KnowledgeFragment>>> {
		Box::pin(async move { Ok(queries::find_by_id(self, id).await?) })
	}

	fn list_all(&self) -> BoxFuture<'_, Result<Vec<KnowledgeFragment>>> {
		Box::pin(async move { Ok(queries::list_all(self).await?) })
	}

	fn insert<'a>(&'a self, fragment: &'a KnowledgeFragment) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::insert_fragment(self, fragment).await?) })
	}

	fn update<'a>(&'a self, fragment: &'a KnowledgeFragment) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::update_fragment(self, fragment).await?) })
	}

	fn set_embedding<'a>(
		&'a self,
		id: Uuid,
		embedding: Option<&'a [f32]>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::set_embedding(self, id, embedding).await?) })
	}

	fn deactivate(&self, id: Uuid, now: OffsetDateTime) -> BoxFuture<'_, Result<bool>> {
		Box::pin(async move { Ok(queries::deactivate(self, id, now).await?) })
	}

	fn list_missing_embeddings(
		&self,
		dimensions: u32,
	) -> BoxFuture<'_, Result<Vec<KnowledgeFragment>>> {
		Box::pin(async move { Ok(queries::list_missing_embeddings(self, dimensions).await?) })
	}
}

impl VectorIndex for QdrantStore {
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u64,
		num_candidates: u64,
		category: Option<Category>,
	) -> BoxFuture<'a, Result<Vec<(Uuid, f32)>>> {
		Box::pin(async move {
			Ok(QdrantStore::search(self, vector, limit, num_candidates, category).await?)
		})
	}

	fn upsert<'a>(
		&'a self,
		fragment: &'a KnowledgeFragment,
		vector: &'a [f32],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::upsert(self, fragment, vector).await?) })
	}

	fn remove(&self, id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(self.delete(id).await?) })
	}
}
