mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chat, Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Providers, Qdrant,
	Retrieval, RetrievalFallback, RetrievalRerank, Security, Service, Storage,
};

use std::{fs, path::Path};

/// Category names accepted as `[chat.templates]` keys.
pub const CATEGORY_NAMES: [&str; 8] =
	["personal", "skills", "experience", "projects", "education", "achievements", "contact", "other"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if let Some(qdrant) = cfg.storage.qdrant.as_ref()
		&& cfg.providers.embedding.dimensions != qdrant.vector_dim
	{
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, timeout_ms) in [
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.llm.timeout_ms", cfg.providers.llm.timeout_ms),
		("retrieval.embed_timeout_ms", cfg.retrieval.embed_timeout_ms),
		("retrieval.search_timeout_ms", cfg.retrieval.search_timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	validate_retrieval(cfg)?;

	if cfg.chat.persona_name.trim().is_empty() {
		return Err(Error::Validation {
			message: "chat.persona_name must be non-empty.".to_string(),
		});
	}
	if cfg.chat.max_context_fragments == 0 {
		return Err(Error::Validation {
			message: "chat.max_context_fragments must be greater than zero.".to_string(),
		});
	}

	for (key, template) in &cfg.chat.templates {
		if !CATEGORY_NAMES.contains(&key.as_str()) {
			return Err(Error::UnknownTemplate {
				key: key.clone(),
				expected: CATEGORY_NAMES.join(", "),
			});
		}
		if template.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("chat.templates.{key} must be non-empty."),
			});
		}
	}

	Ok(())
}

fn validate_retrieval(cfg: &Config) -> Result<()> {
	let retrieval = &cfg.retrieval;

	if retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !retrieval.threshold.is_finite() || !(0.0..=1.0).contains(&retrieval.threshold) {
		return Err(Error::Validation {
			message: "retrieval.threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if retrieval.over_fetch_factor == 0 {
		return Err(Error::Validation {
			message: "retrieval.over_fetch_factor must be greater than zero.".to_string(),
		});
	}

	let fallback = &retrieval.fallback;

	for (label, weight) in [
		("retrieval.fallback.keyword_weight", fallback.keyword_weight),
		("retrieval.fallback.category_weight", fallback.category_weight),
		("retrieval.fallback.priority_weight", fallback.priority_weight),
		("retrieval.rerank.category_weight", retrieval.rerank.category_weight),
		("retrieval.rerank.keyword_weight", retrieval.rerank.keyword_weight),
		("retrieval.rerank.length_penalty", retrieval.rerank.length_penalty),
		("retrieval.rerank.exploration_penalty", retrieval.rerank.exploration_penalty),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if fallback.keyword_weight + fallback.category_weight + fallback.priority_weight <= 0.0 {
		return Err(Error::Validation {
			message: "retrieval.fallback weights must not all be zero.".to_string(),
		});
	}
	if fallback.max_query_terms == 0 {
		return Err(Error::Validation {
			message: "retrieval.fallback.max_query_terms must be greater than zero.".to_string(),
		});
	}
	if !fallback.min_score.is_finite() || !(0.0..=1.0).contains(&fallback.min_score) {
		return Err(Error::Validation {
			message: "retrieval.fallback.min_score must be in the range 0.0-1.0.".to_string(),
		});
	}

	let rerank = &retrieval.rerank;

	if !rerank.similarity_weight.is_finite() || !(0.0..=1.0).contains(&rerank.similarity_weight) {
		return Err(Error::Validation {
			message: "retrieval.rerank.similarity_weight must be in the range 0.0-1.0.".to_string(),
		});
	}
	if rerank.short_chars >= rerank.long_chars {
		return Err(Error::Validation {
			message: "retrieval.rerank.short_chars must be less than retrieval.rerank.long_chars."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.security
		.admin_auth_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.admin_auth_token = None;
	}

	cfg.chat.templates.retain(|_, template| !template.trim().is_empty());
}
