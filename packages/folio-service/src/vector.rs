use std::{cmp::Ordering, collections::HashMap};

use folio_domain::{Category, RetrievalMethod, RetrievalResult, normalize_cosine};

use crate::{Error, FolioService, Result};

impl FolioService {
	/// Nearest active fragments to `embedding`, at most `k`, scored in [0, 1].
	///
	/// The category filter is pushed into the index query. Any index failure, including a
	/// missing index, is reported as [`Error::IndexUnavailable`] so callers can tell a broken
	/// search apart from an empty one. Candidates whose stored embedding is missing or has the
	/// wrong dimension are skipped.
	pub async fn vector_search(
		&self,
		embedding: &[f32],
		k: u32,
		filter: Option<Category>,
	) -> Result<Vec<RetrievalResult>> {
		let dim = self.embedding_dim();

		if k == 0 {
			return Err(Error::InvalidRequest { message: "k must be at least 1.".to_string() });
		}
		if embedding.len() != dim {
			return Err(Error::InvalidRequest {
				message: format!(
					"Query embedding has {} dimensions; expected {dim}.",
					embedding.len()
				),
			});
		}

		let Some(index) = self.index.as_ref() else {
			return Err(Error::IndexUnavailable {
				message: "No vector index is configured.".to_string(),
			});
		};
		let num_candidates = k as u64 * self.cfg.retrieval.over_fetch_factor.max(1) as u64;
		let hits = index
			.search(embedding, num_candidates, num_candidates, filter)
			.await
			.map_err(|err| Error::IndexUnavailable { message: err.to_string() })?;

		if hits.is_empty() {
			return Ok(Vec::new());
		}

		let ids = hits.iter().map(|(id, _)| *id).collect::<Vec<_>>();
		let mut fragments = self
			.store
			.find_active_by_ids(&ids)
			.await?
			.into_iter()
			.map(|fragment| (fragment.id, fragment))
			.collect::<HashMap<_, _>>();
		let mut results = Vec::with_capacity(hits.len());

		for (id, cosine) in hits {
			// Points can outlive their fragment or its embedding; Postgres is the source of truth.
			let Some(fragment) = fragments.remove(&id) else { continue };

			if !fragment.is_active || !fragment.has_embedding(dim) {
				continue;
			}
			if filter.is_some_and(|category| category != fragment.category) {
				continue;
			}

			results.push(RetrievalResult::new(
				fragment,
				normalize_cosine(cosine),
				RetrievalMethod::Vector,
			));
		}

		sort_ranked(&mut results);
		results.truncate(k as usize);

		Ok(results)
	}
}

/// Score descending, then priority descending, then id for a total order.
pub(crate) fn sort_ranked(results: &mut [RetrievalResult]) {
	results.sort_by(|a, b| {
		b.score
			.partial_cmp(&a.score)
			.unwrap_or(Ordering::Equal)
			.then_with(|| b.fragment.priority.cmp(&a.fragment.priority))
			.then_with(|| a.fragment.id.cmp(&b.fragment.id))
	});
}
