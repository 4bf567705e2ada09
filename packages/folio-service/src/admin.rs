use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{
	Category, KnowledgeFragment, Priority,
	writegate::{self, FragmentInput},
};
use folio_providers::retry::{self, RetryPolicy};

use crate::{Error, FolioService, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFragmentRequest {
	pub content: String,
	pub category: Category,
	#[serde(default)]
	pub priority: Priority,
	#[serde(default)]
	pub tags: Vec<String>,
	pub source: String,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFragmentRequest {
	pub content: Option<String>,
	pub category: Option<Category>,
	pub priority: Option<Priority>,
	pub tags: Option<Vec<String>>,
	pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
	pub embedded: u32,
	pub indexed: u32,
	pub failed: u32,
}

impl FolioService {
	pub async fn list_fragments(&self) -> Result<Vec<KnowledgeFragment>> {
		self.store.list_all().await
	}

	/// Validates and stores a new fragment. An embedding failure does not abort the write; the
	/// fragment is stored without a vector and stays reachable through the fallback.
	pub async fn create_fragment(&self, req: CreateFragmentRequest) -> Result<KnowledgeFragment> {
		let content = req.content.trim().to_string();
		let source = req.source.trim().to_string();
		let tags = writegate::normalize_tags(&req.tags);

		check_writegate(&content, &tags, &source)?;

		let now = OffsetDateTime::now_utc();
		let mut fragment = KnowledgeFragment {
			id: Uuid::new_v4(),
			content,
			embedding: None,
			category: req.category,
			priority: req.priority,
			tags,
			source,
			is_active: true,
			query_count: 0,
			version: 1,
			created_at: now,
			updated_at: now,
		};

		fragment.embedding = self.embed_content(fragment.id, &fragment.content).await;

		self.store.insert(&fragment).await?;
		self.sync_index(&fragment).await;

		tracing::info!(
			fragment_id = %fragment.id,
			category = fragment.category.as_str(),
			embedded = fragment.embedding.is_some(),
			"Fragment created."
		);

		Ok(fragment)
	}

	/// Applies `req` to an active fragment. A content change bumps the version and regenerates
	/// the embedding, which is cleared if regeneration fails.
	pub async fn update_fragment(
		&self,
		id: Uuid,
		req: UpdateFragmentRequest,
	) -> Result<KnowledgeFragment> {
		let mut fragment = self.active_fragment(id).await?;
		let mut content_changed = false;

		if let Some(content) = req.content {
			let content = content.trim().to_string();

			if content != fragment.content {
				fragment.content = content;
				content_changed = true;
			}
		}
		if let Some(category) = req.category {
			fragment.category = category;
		}
		if let Some(priority) = req.priority {
			fragment.priority = priority;
		}
		if let Some(tags) = req.tags {
			fragment.tags = writegate::normalize_tags(&tags);
		}
		if let Some(source) = req.source {
			fragment.source = source.trim().to_string();
		}

		check_writegate(&fragment.content, &fragment.tags, &fragment.source)?;

		if content_changed {
			fragment.version += 1;
			fragment.embedding = self.embed_content(fragment.id, &fragment.content).await;
		}

		fragment.updated_at = OffsetDateTime::now_utc();

		self.store.update(&fragment).await?;
		self.sync_index(&fragment).await;

		tracing::info!(
			fragment_id = %fragment.id,
			version = fragment.version,
			content_changed,
			"Fragment updated."
		);

		Ok(fragment)
	}

	/// Soft delete. The index point is removed best-effort; retrieval ignores it either way.
	pub async fn deactivate_fragment(&self, id: Uuid) -> Result<()> {
		if !self.store.deactivate(id, OffsetDateTime::now_utc()).await? {
			return Err(Error::NotFound { message: format!("No active fragment {id}.") });
		}

		if let Some(index) = self.index.as_ref()
			&& let Err(err) = index.remove(id).await
		{
			tracing::warn!(fragment_id = %id, error = %err, "Failed to remove index point.");
		}

		tracing::info!(fragment_id = %id, "Fragment deactivated.");

		Ok(())
	}

	/// Embeds active fragments that lack a usable vector, then pushes every embedded active
	/// fragment into the index.
	pub async fn reindex(&self) -> Result<ReindexReport> {
		let mut report = ReindexReport::default();

		let missing =
			self.store.list_missing_embeddings(self.cfg.providers.embedding.dimensions).await?;

		for fragment in missing {
			match self.embed_content(fragment.id, &fragment.content).await {
				Some(vector) => {
					self.store.set_embedding(fragment.id, Some(&vector)).await?;

					report.embedded += 1;
				},
				None => report.failed += 1,
			}
		}

		if let Some(index) = self.index.as_ref() {
			let dim = self.embedding_dim();

			for fragment in self.store.list_active(None).await? {
				let Some(vector) = fragment.embedding.as_deref().filter(|vec| vec.len() == dim)
				else {
					continue;
				};

				match index.upsert(&fragment, vector).await {
					Ok(()) => report.indexed += 1,
					Err(err) => {
						tracing::warn!(
							fragment_id = %fragment.id,
							error = %err,
							"Failed to index fragment."
						);

						report.failed += 1;
					},
				}
			}
		}

		tracing::info!(
			embedded = report.embedded,
			indexed = report.indexed,
			failed = report.failed,
			"Reindex finished."
		);

		Ok(report)
	}

	async fn active_fragment(&self, id: Uuid) -> Result<KnowledgeFragment> {
		match self.store.find_by_id(id).await? {
			Some(fragment) if fragment.is_active => Ok(fragment),
			_ => Err(Error::NotFound { message: format!("No active fragment {id}.") }),
		}
	}

	/// Embeds with retry. `None` when the provider keeps failing or returns a malformed vector.
	async fn embed_content(&self, id: Uuid, content: &str) -> Option<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let texts = [content.to_string()];
		let texts = texts.as_slice();
		let result = retry::with_backoff(RetryPolicy::default(), move || {
			self.providers.embedding.embed(cfg, texts)
		})
		.await;

		match result {
			Ok(vectors) => {
				let vector = vectors.into_iter().next()?;

				if vector.len() == self.embedding_dim() && vector.iter().all(|v| v.is_finite()) {
					Some(vector)
				} else {
					tracing::warn!(
						fragment_id = %id,
						got = vector.len(),
						expected = self.embedding_dim(),
						"Discarding malformed fragment embedding."
					);

					None
				}
			},
			Err(err) => {
				tracing::warn!(fragment_id = %id, error = %err, "Fragment embedding failed.");

				None
			},
		}
	}

	// Best-effort: a failure here is repaired by the next reindex.
	async fn sync_index(&self, fragment: &KnowledgeFragment) {
		let Some(index) = self.index.as_ref() else { return };
		let result = match fragment.embedding.as_deref() {
			Some(vector) => index.upsert(fragment, vector).await,
			None => index.remove(fragment.id).await,
		};

		if let Err(err) = result {
			tracing::warn!(fragment_id = %fragment.id, error = %err, "Failed to sync index point.");
		}
	}
}

fn check_writegate(content: &str, tags: &[String], source: &str) -> Result<()> {
	writegate::writegate(&FragmentInput { content, tags, source }).map_err(|code| {
		Error::InvalidRequest { message: format!("{}: fragment rejected.", code.as_str()) }
	})
}
