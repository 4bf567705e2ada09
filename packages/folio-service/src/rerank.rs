//! Second-pass scoring over first-pass candidates. Pure; never adds or drops fragments.

use folio_config::{Retrieval, RetrievalRerank};
use folio_domain::{Category, RetrievalMethod, RetrievalResult, clamp_unit, text};

use crate::vector;

/// Re-scores `results` and returns them re-sorted.
///
/// The new score blends the first-pass score with keyword density and, when an intent is known,
/// the intent match. Length and exploration penalties are subtracted afterwards.
pub fn rerank(
	results: Vec<RetrievalResult>,
	query: &str,
	intent: Option<Category>,
	cfg: &Retrieval,
) -> Vec<RetrievalResult> {
	let terms = text::tokenize_query(query, cfg.fallback.max_query_terms as usize);
	let rerank = &cfg.rerank;
	let mut out = results
		.into_iter()
		.map(|result| {
			let score = rerank_score(&result, &terms, intent, rerank);

			RetrievalResult::new(result.fragment, score, RetrievalMethod::Reranked)
		})
		.collect::<Vec<_>>();

	vector::sort_ranked(&mut out);

	out
}

fn rerank_score(
	result: &RetrievalResult,
	terms: &[String],
	intent: Option<Category>,
	cfg: &RetrievalRerank,
) -> f32 {
	let fragment = &result.fragment;
	let keyword = text::keyword_overlap_ratio(terms, &fragment.content, &fragment.tags);
	let (signal, weight) = match intent {
		Some(category) => {
			let matched = if category == fragment.category { 1.0 } else { 0.0 };

			(
				cfg.category_weight * matched + cfg.keyword_weight * keyword,
				cfg.category_weight + cfg.keyword_weight,
			)
		},
		None => (cfg.keyword_weight * keyword, cfg.keyword_weight),
	};
	let secondary = if weight > 0.0 { signal / weight } else { result.score };
	let mut score =
		cfg.similarity_weight * result.score + (1.0 - cfg.similarity_weight) * secondary;
	let chars = fragment.content.chars().count();

	if chars < cfg.short_chars as usize || chars > cfg.long_chars as usize {
		score -= cfg.length_penalty;
	}
	if fragment.query_count as u64 >= cfg.exploration_query_count {
		score -= cfg.exploration_penalty;
	}

	clamp_unit(score)
}
