//! Keyword-trigger intent classification.
//!
//! Categories are scanned in table order and the first one with a matching trigger wins, so the
//! order of [`INTENT_RULES`] is the tie-break.

use crate::{fragment::Category, text};

pub struct IntentRule {
	pub category: Category,
	/// Lowercase words or phrases, matched on word boundaries.
	pub triggers: &'static [&'static str],
}

pub const INTENT_RULES: &[IntentRule] = &[
	IntentRule {
		category: Category::Contact,
		triggers: &[
			"contact",
			"email",
			"e-mail",
			"reach you",
			"reach out",
			"get in touch",
			"hire",
			"hiring",
			"linkedin",
			"phone",
			"available for",
			"availability",
			"freelance",
		],
	},
	IntentRule {
		category: Category::Education,
		triggers: &[
			"education",
			"study",
			"studied",
			"studying",
			"degree",
			"university",
			"college",
			"school",
			"graduate",
			"graduated",
			"major",
			"course",
			"courses",
			"certificate",
			"certification",
			"certifications",
			"bootcamp",
		],
	},
	IntentRule {
		category: Category::Achievements,
		triggers: &[
			"achievement",
			"achievements",
			"award",
			"awards",
			"accomplishment",
			"accomplishments",
			"prize",
			"hackathon",
			"won",
			"proud",
			"recognition",
		],
	},
	IntentRule {
		category: Category::Projects,
		triggers: &[
			"project",
			"projects",
			"portfolio",
			"you built",
			"have built",
			"side project",
			"open source",
			"github",
			"app you made",
			"demo",
			"case study",
		],
	},
	IntentRule {
		category: Category::Experience,
		triggers: &[
			"experience",
			"work history",
			"worked",
			"work at",
			"job",
			"jobs",
			"career",
			"company",
			"companies",
			"employer",
			"role",
			"position",
			"intern",
			"internship",
			"years of",
		],
	},
	IntentRule {
		category: Category::Skills,
		triggers: &[
			"skill",
			"skills",
			"tech stack",
			"stack",
			"technology",
			"technologies",
			"framework",
			"frameworks",
			"frontend",
			"front-end",
			"backend",
			"back-end",
			"language",
			"languages",
			"programming",
			"library",
			"libraries",
			"tools",
			"proficient",
			"expertise",
			"react",
			"typescript",
			"javascript",
			"python",
			"rust",
			"database",
		],
	},
	IntentRule {
		category: Category::Personal,
		triggers: &[
			"who are you",
			"about yourself",
			"about you",
			"hobby",
			"hobbies",
			"interests",
			"free time",
			"background",
			"where are you from",
			"where do you live",
			"personality",
			"introduce",
		],
	},
];

/// Maps a free-text query to at most one category. `None` means no bias.
pub fn classify(query: &str) -> Option<Category> {
	let padded = padded_words(query);

	if padded.trim().is_empty() {
		return None;
	}

	INTENT_RULES
		.iter()
		.find(|rule| rule.triggers.iter().any(|trigger| padded.contains(&format!(" {trigger} "))))
		.map(|rule| rule.category)
}

// Lowercased words joined by single spaces with a leading and trailing space, so phrase
// triggers can be matched on word boundaries with a plain substring search.
fn padded_words(query: &str) -> String {
	let normalized = text::normalize(query);
	let mut out = String::with_capacity(normalized.len() + 2);

	out.push(' ');

	for word in normalized.split(|ch: char| !(ch.is_alphanumeric() || ch == '-')) {
		let word = word.trim_matches('-');

		if word.is_empty() {
			continue;
		}

		out.push_str(word);
		out.push(' ');
	}

	out
}
