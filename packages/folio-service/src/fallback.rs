//! Lexical scoring used when vector search cannot run.

use std::cmp::Ordering;

use folio_config::RetrievalFallback;
use folio_domain::{Category, KnowledgeFragment, RetrievalMethod, RetrievalResult, text};

use crate::{Error, FolioService, Result};

impl FolioService {
	/// Scores every active fragment (restricted to `filter` when given) against the query and
	/// returns the best `k`. Needs nothing but the fragment store.
	pub async fn fallback_search(
		&self,
		query: &str,
		k: u32,
		filter: Option<Category>,
		intent: Option<Category>,
	) -> Result<Vec<RetrievalResult>> {
		if k == 0 {
			return Err(Error::InvalidRequest { message: "k must be at least 1.".to_string() });
		}

		let weights = &self.cfg.retrieval.fallback;
		let terms = text::tokenize_query(query, weights.max_query_terms as usize);
		let fragments = self.store.list_active(filter).await?;
		let mut results = score_fragments(fragments, &terms, intent, weights);

		results.truncate(k as usize);

		Ok(results)
	}
}

/// Scores and sorts `fragments`. Inactive fragments are dropped.
///
/// `score = (kw * overlap + cw * category_match + pw * priority) / (kw + cw + pw)`, which is
/// the plain weighted sum when the weights add up to one.
pub fn score_fragments(
	fragments: Vec<KnowledgeFragment>,
	query_terms: &[String],
	intent: Option<Category>,
	weights: &RetrievalFallback,
) -> Vec<RetrievalResult> {
	let total = weights.keyword_weight + weights.category_weight + weights.priority_weight;
	let mut results = fragments
		.into_iter()
		.filter(|fragment| fragment.is_active)
		.map(|fragment| {
			let overlap =
				text::keyword_overlap_ratio(query_terms, &fragment.content, &fragment.tags);
			let category_match =
				if intent.is_some_and(|category| category == fragment.category) { 1.0 } else { 0.0 };
			let raw = weights.keyword_weight * overlap
				+ weights.category_weight * category_match
				+ weights.priority_weight * fragment.priority.weight();
			let score = if total > 0.0 { raw / total } else { 0.0 };

			RetrievalResult::new(fragment, score, RetrievalMethod::Fallback)
		})
		.collect::<Vec<_>>();

	results.sort_by(|a, b| {
		b.score
			.partial_cmp(&a.score)
			.unwrap_or(Ordering::Equal)
			.then_with(|| b.fragment.priority.cmp(&a.fragment.priority))
			.then_with(|| b.fragment.query_count.cmp(&a.fragment.query_count))
			.then_with(|| a.fragment.id.cmp(&b.fragment.id))
	});

	results
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;
	use uuid::Uuid;

	use folio_domain::Priority;

	use super::*;

	fn fragment(
		id: u128,
		content: &str,
		category: Category,
		priority: Priority,
	) -> KnowledgeFragment {
		KnowledgeFragment {
			id: Uuid::from_u128(id),
			content: content.to_string(),
			embedding: None,
			category,
			priority,
			tags: Vec::new(),
			source: "resume".to_string(),
			is_active: true,
			query_count: 0,
			version: 1,
			created_at: OffsetDateTime::UNIX_EPOCH,
			updated_at: OffsetDateTime::UNIX_EPOCH,
		}
	}

	fn terms(query: &str) -> Vec<String> {
		text::tokenize_query(query, 16)
	}

	#[test]
	fn priority_breaks_equal_overlap() {
		let fragments = vec![
			fragment(1, "Built a Rust compiler for fun.", Category::Projects, Priority::Low),
			fragment(2, "Built a Rust web server at work.", Category::Projects, Priority::High),
		];
		let results =
			score_fragments(fragments, &terms("rust built"), None, &RetrievalFallback::default());

		assert_eq!(results[0].fragment.id, Uuid::from_u128(2));
		assert!(results[0].score > results[1].score);
	}

	#[test]
	fn query_count_breaks_exact_ties() {
		let quiet = fragment(1, "Enjoys hiking in the alps.", Category::Personal, Priority::Medium);
		let mut popular =
			fragment(2, "Enjoys hiking on weekends.", Category::Personal, Priority::Medium);

		popular.query_count = 12;

		let results = score_fragments(
			vec![quiet, popular],
			&terms("hiking"),
			None,
			&RetrievalFallback::default(),
		);

		assert_eq!(results[0].score, results[1].score);
		assert_eq!(results[0].fragment.id, Uuid::from_u128(2));
	}

	#[test]
	fn nonsense_queries_score_only_priority_and_category() {
		let weights = RetrievalFallback::default();
		let fragments = vec![fragment(
			1,
			"Mai has 3 years of experience with React.",
			Category::Skills,
			Priority::High,
		)];
		let results = score_fragments(fragments, &terms("asdkjfh qpwoeiruqwer"), None, &weights);

		assert!((results[0].score - weights.priority_weight).abs() < 1e-6);
	}

	#[test]
	fn intent_match_adds_category_weight() {
		let weights = RetrievalFallback::default();
		let fragments = vec![
			fragment(1, "Graduated with a CS degree.", Category::Education, Priority::Medium),
			fragment(2, "Graduated from a bootcamp too.", Category::Other, Priority::Medium),
		];
		let results =
			score_fragments(fragments, &terms("graduated"), Some(Category::Education), &weights);

		assert_eq!(results[0].fragment.category, Category::Education);
		assert!((results[0].score - results[1].score - weights.category_weight).abs() < 1e-6);
	}

	#[test]
	fn inactive_fragments_are_dropped() {
		let mut inactive =
			fragment(1, "Unlisted side project.", Category::Projects, Priority::High);

		inactive.is_active = false;

		let results =
			score_fragments(vec![inactive], &terms("project"), None, &RetrievalFallback::default());

		assert!(results.is_empty());
	}
}
