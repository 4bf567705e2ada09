use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Personal,
	Skills,
	Experience,
	Projects,
	Education,
	Achievements,
	Contact,
	Other,
}
impl Category {
	pub const ALL: [Self; 8] = [
		Self::Personal,
		Self::Skills,
		Self::Experience,
		Self::Projects,
		Self::Education,
		Self::Achievements,
		Self::Contact,
		Self::Other,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Personal => "personal",
			Self::Skills => "skills",
			Self::Experience => "experience",
			Self::Projects => "projects",
			Self::Education => "education",
			Self::Achievements => "achievements",
			Self::Contact => "contact",
			Self::Other => "other",
		}
	}
}
impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Category {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|category| category.as_str() == raw)
			.ok_or_else(|| UnknownVariant { kind: "category", value: raw.to_string() })
	}
}

#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	Low,
	#[default]
	Medium,
	High,
}
impl Priority {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
		}
	}

	/// Normalized ordinal in (0, 1]: low < medium < high.
	pub fn weight(self) -> f32 {
		match self {
			Self::Low => 1.0 / 3.0,
			Self::Medium => 2.0 / 3.0,
			Self::High => 1.0,
		}
	}
}
impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Priority {
	type Err = UnknownVariant;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"low" => Ok(Self::Low),
			"medium" => Ok(Self::Medium),
			"high" => Ok(Self::High),
			_ => Err(UnknownVariant { kind: "priority", value: raw.to_string() }),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
	pub kind: &'static str,
	pub value: String,
}
impl fmt::Display for UnknownVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown {} {:?}.", self.kind, self.value)
	}
}
impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFragment {
	pub id: Uuid,
	pub content: String,
	#[serde(default, skip_serializing)]
	pub embedding: Option<Vec<f32>>,
	pub category: Category,
	pub priority: Priority,
	pub tags: Vec<String>,
	pub source: String,
	pub is_active: bool,
	pub query_count: i64,
	pub version: i32,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl KnowledgeFragment {
	/// Whether the stored vector can take part in vector search at `dimensions`.
	pub fn has_embedding(&self, dimensions: usize) -> bool {
		self.embedding.as_ref().map(|vec| vec.len() == dimensions).unwrap_or(false)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
	Vector,
	Fallback,
	Reranked,
}
impl RetrievalMethod {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vector => "vector",
			Self::Fallback => "fallback",
			Self::Reranked => "reranked",
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
	pub fragment: KnowledgeFragment,
	/// Normalized to 0.0-1.0.
	pub score: f32,
	pub method: RetrievalMethod,
}
impl RetrievalResult {
	pub fn new(fragment: KnowledgeFragment, score: f32, method: RetrievalMethod) -> Self {
		Self { fragment, score: clamp_unit(score), method }
	}

	pub fn content(&self) -> &str {
		&self.fragment.content
	}

	pub fn category(&self) -> Category {
		self.fragment.category
	}
}

pub fn clamp_unit(value: f32) -> f32 {
	if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Cosine similarity mapped from [-1, 1] onto [0, 1].
pub fn normalize_cosine(cosine: f32) -> f32 {
	clamp_unit((cosine + 1.0) / 2.0)
}
