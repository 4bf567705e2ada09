//! The retrieval orchestrator: classify, embed, search or fall back, filter, rerank, truncate.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time;

use folio_config::Retrieval;
use folio_domain::{Category, RetrievalResult, classify};

use crate::{Error, FolioService, Result, rerank};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrieveOptions {
	pub k: u32,
	pub threshold: f32,
	pub use_intent: bool,
	pub rerank_results: bool,
}
impl RetrieveOptions {
	pub fn from_config(cfg: &Retrieval) -> Self {
		Self {
			k: cfg.top_k,
			threshold: cfg.threshold,
			use_intent: cfg.use_intent,
			rerank_results: cfg.rerank_results,
		}
	}

	fn validate(&self) -> Result<()> {
		if self.k == 0 {
			return Err(Error::InvalidRequest { message: "k must be at least 1.".to_string() });
		}
		if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
			return Err(Error::InvalidRequest {
				message: "threshold must be in the range 0.0-1.0.".to_string(),
			});
		}

		Ok(())
	}
}

/// Why the vector path was abandoned for the lexical fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
	EmbeddingFailed,
	EmbeddingTimeout,
	MalformedEmbedding,
	IndexUnavailable,
	SearchTimeout,
	/// The index answered but held no eligible point, e.g. before the first reindex.
	NoIndexedCandidates,
}
impl DegradeReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::EmbeddingFailed => "embedding_failed",
			Self::EmbeddingTimeout => "embedding_timeout",
			Self::MalformedEmbedding => "malformed_embedding",
			Self::IndexUnavailable => "index_unavailable",
			Self::SearchTimeout => "search_timeout",
			Self::NoIndexedCandidates => "no_indexed_candidates",
		}
	}
}

/// Result of the candidate stage.
#[derive(Debug)]
pub enum SearchOutcome {
	Vector(Vec<RetrievalResult>),
	Fallback { results: Vec<RetrievalResult>, reason: DegradeReason },
	/// No corpus could be read at all.
	Failure(Error),
}

impl FolioService {
	/// Ranked fragments for `query`.
	///
	/// Embedding and index failures degrade to the lexical fallback and never surface here.
	/// Only invalid input and an unreadable fragment store are errors. Every returned score is
	/// in [0, 1] and at least the threshold of the path taken: `options.threshold` for vector
	/// results, capped at `retrieval.fallback.min_score` for lexical ones. An empty list means
	/// nothing relevant was found.
	pub async fn retrieve(
		&self,
		query: &str,
		options: RetrieveOptions,
	) -> Result<Vec<RetrievalResult>> {
		let query = query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		options.validate()?;

		let intent = if options.use_intent { classify(query) } else { None };
		let outcome = self.search_candidates(query, options.k, intent).await;
		let (mut results, threshold) = match outcome {
			SearchOutcome::Vector(results) => (results, options.threshold),
			SearchOutcome::Fallback { results, reason } => {
				let threshold = options.threshold.min(self.cfg.retrieval.fallback.min_score);

				tracing::warn!(
					reason = reason.as_str(),
					candidates = results.len(),
					threshold,
					"Vector search degraded to fallback."
				);

				(results, threshold)
			},
			SearchOutcome::Failure(err) => {
				tracing::error!(error = %err, "Retrieval failed without a usable corpus.");

				return Err(err);
			},
		};
		let candidates = results.len();

		results.retain(|result| result.score >= threshold);

		if options.rerank_results {
			results = rerank::rerank(results, query, intent, &self.cfg.retrieval);

			results.retain(|result| result.score >= threshold);
		}

		results.truncate(options.k as usize);

		tracing::debug!(
			intent = intent.map(Category::as_str),
			method = results.first().map(|result| result.method.as_str()),
			candidates,
			returned = results.len(),
			"Retrieval finished."
		);

		if self.cfg.retrieval.record_hits {
			self.record_hits(&results);
		}

		Ok(results)
	}

	/// Embeds the query and runs vector search, or falls back to lexical scoring when either
	/// step fails or times out. Steps run strictly in sequence and the embedding is never
	/// retried here.
	pub async fn search_candidates(
		&self,
		query: &str,
		k: u32,
		intent: Option<Category>,
	) -> SearchOutcome {
		let reason = match self.embed_query(query).await {
			Ok(embedding) => match self.bounded_vector_search(&embedding, k, intent).await {
				Ok(results) if !results.is_empty() => return SearchOutcome::Vector(results),
				Ok(_) => DegradeReason::NoIndexedCandidates,
				Err(VectorStageError::Degraded(reason)) => reason,
				Err(VectorStageError::Fatal(err)) => return SearchOutcome::Failure(err),
			},
			Err(reason) => reason,
		};

		match self.fallback_search(query, k, None, intent).await {
			Ok(results) => SearchOutcome::Fallback { results, reason },
			Err(err) => SearchOutcome::Failure(err),
		}
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DegradeReason> {
		let cfg = &self.cfg.providers.embedding;
		let texts = [query.to_string()];
		let timeout = Duration::from_millis(self.cfg.retrieval.embed_timeout_ms);
		let vectors = match time::timeout(timeout, self.providers.embedding.embed(cfg, &texts)).await
		{
			Ok(Ok(vectors)) => vectors,
			Ok(Err(err)) => {
				tracing::warn!(error = %err, "Query embedding failed.");

				return Err(DegradeReason::EmbeddingFailed);
			},
			Err(_) => return Err(DegradeReason::EmbeddingTimeout),
		};
		let Some(vector) = vectors.into_iter().next() else {
			return Err(DegradeReason::MalformedEmbedding);
		};

		if vector.len() != self.embedding_dim() || vector.iter().any(|value| !value.is_finite()) {
			tracing::warn!(
				got = vector.len(),
				expected = self.embedding_dim(),
				"Query embedding is malformed."
			);

			return Err(DegradeReason::MalformedEmbedding);
		}

		Ok(vector)
	}

	async fn bounded_vector_search(
		&self,
		embedding: &[f32],
		k: u32,
		filter: Option<Category>,
	) -> Result<Vec<RetrievalResult>, VectorStageError> {
		let timeout = Duration::from_millis(self.cfg.retrieval.search_timeout_ms);

		match time::timeout(timeout, self.vector_search(embedding, k, filter)).await {
			Ok(Ok(results)) => Ok(results),
			Ok(Err(Error::Storage { message })) =>
				Err(VectorStageError::Fatal(Error::Storage { message })),
			Ok(Err(err)) => {
				tracing::warn!(error = %err, "Vector search failed.");

				Err(VectorStageError::Degraded(DegradeReason::IndexUnavailable))
			},
			Err(_) => Err(VectorStageError::Degraded(DegradeReason::SearchTimeout)),
		}
	}

	fn record_hits(&self, results: &[RetrievalResult]) {
		if results.is_empty() {
			return;
		}

		let ids = results.iter().map(|result| result.fragment.id).collect::<Vec<_>>();
		let store = Arc::clone(&self.store);

		tokio::spawn(async move {
			if let Err(err) = store.increment_query_count(&ids).await {
				tracing::warn!(error = %err, fragments = ids.len(), "Failed to record fragment hits.");
			}
		});
	}
}

enum VectorStageError {
	Degraded(DegradeReason),
	Fatal(Error),
}
