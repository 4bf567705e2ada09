use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

const STOP_WORDS: [&str; 48] = [
	"a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "could", "did", "do", "does",
	"for", "from", "have", "he", "her", "his", "how", "in", "is", "it", "me", "my", "of", "on",
	"or", "our", "she", "tell", "that", "the", "their", "them", "they", "this", "to", "was",
	"what", "when", "where", "which", "who", "why", "with", "you",
];

/// NFKC-normalized, lowercased copy of `text`.
pub fn normalize(text: &str) -> String {
	text.nfkc().collect::<String>().to_lowercase()
}

/// Splits a query into distinct lowercase terms, dropping punctuation, one-character tokens and
/// stop words. Order of first appearance is kept.
pub fn tokenize_query(query: &str, max_terms: usize) -> Vec<String> {
	let normalized = normalize(query);
	let mut out = Vec::new();
	let mut seen = HashSet::new();

	if max_terms == 0 {
		return out;
	}

	for word in normalized.unicode_words() {
		let token = word.trim_matches(|ch: char| !ch.is_alphanumeric());

		if token.chars().count() < 2 || STOP_WORDS.contains(&token) {
			continue;
		}
		if seen.insert(token) {
			out.push(token.to_string());
		}
		if out.len() >= max_terms {
			break;
		}
	}

	out
}

/// Query terms that occur as substrings of the content or of any tag.
pub fn matched_terms<'a>(query_terms: &'a [String], content: &str, tags: &[String]) -> Vec<&'a str> {
	if query_terms.is_empty() {
		return Vec::new();
	}

	let haystack = normalize(content);
	let tags = tags.iter().map(|tag| normalize(tag)).collect::<Vec<_>>();

	query_terms
		.iter()
		.filter(|term| {
			haystack.contains(term.as_str()) || tags.iter().any(|tag| tag.contains(term.as_str()))
		})
		.map(String::as_str)
		.collect()
}

/// Fraction of query terms found in the content or tags, in [0, 1].
pub fn keyword_overlap_ratio(query_terms: &[String], content: &str, tags: &[String]) -> f32 {
	if query_terms.is_empty() {
		return 0.0;
	}

	matched_terms(query_terms, content, tags).len() as f32 / query_terms.len() as f32
}
