use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	pub chat: Chat,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	/// Optional. Without it every vector search degrades to the lexical fallback.
	pub qdrant: Option<Qdrant>,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_max_tokens")]
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub threshold: f32,
	pub use_intent: bool,
	pub rerank_results: bool,
	/// Multiplier applied to `top_k` to size the ANN candidate pool.
	pub over_fetch_factor: u32,
	pub embed_timeout_ms: u64,
	pub search_timeout_ms: u64,
	pub record_hits: bool,
	pub fallback: RetrievalFallback,
	pub rerank: RetrievalRerank,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			top_k: 5,
			threshold: 0.6,
			use_intent: true,
			rerank_results: false,
			over_fetch_factor: 10,
			embed_timeout_ms: 8_000,
			search_timeout_ms: 8_000,
			record_hits: true,
			fallback: RetrievalFallback::default(),
			rerank: RetrievalRerank::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalFallback {
	pub keyword_weight: f32,
	pub category_weight: f32,
	pub priority_weight: f32,
	pub max_query_terms: u32,
	/// Score floor for lexical results. Stands in for `retrieval.threshold` when it is lower,
	/// since lexical scores do not share the cosine scale.
	pub min_score: f32,
}
impl Default for RetrievalFallback {
	fn default() -> Self {
		Self {
			keyword_weight: 0.6,
			category_weight: 0.25,
			priority_weight: 0.15,
			max_query_terms: 16,
			min_score: 0.3,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalRerank {
	/// Share of the blended score taken by the first-pass similarity.
	pub similarity_weight: f32,
	pub category_weight: f32,
	pub keyword_weight: f32,
	pub short_chars: u32,
	pub long_chars: u32,
	pub length_penalty: f32,
	pub exploration_query_count: u64,
	pub exploration_penalty: f32,
}
impl Default for RetrievalRerank {
	fn default() -> Self {
		Self {
			similarity_weight: 0.8,
			category_weight: 0.7,
			keyword_weight: 0.3,
			short_chars: 40,
			long_chars: 1_500,
			length_penalty: 0.05,
			exploration_query_count: 50,
			exploration_penalty: 0.03,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Chat {
	pub persona_name: String,
	#[serde(default = "default_max_context_fragments")]
	pub max_context_fragments: u32,
	#[serde(default = "default_max_history_turns")]
	pub max_history_turns: u32,
	/// Optional. Map keys are category names, e.g. "skills"; "other" doubles as the generic reply.
	#[serde(default)]
	pub templates: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub admin_auth_token: Option<String>,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true, admin_auth_token: None }
	}
}

fn default_max_tokens() -> u32 {
	512
}

fn default_max_context_fragments() -> u32 {
	5
}

fn default_max_history_turns() -> u32 {
	6
}
