use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use folio_config::Error;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn sample_without(section: &[&str], key: &str) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{name}]."));
	}

	table.remove(key);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("folio_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> folio_config::Result<folio_config::Config> {
	let path = write_temp_config(payload);
	let result = folio_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_error(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected a validation error.");
	let message = err.to_string();

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn folio_example_toml_is_valid() {
	let payload = include_str!("../../../folio.example.toml").to_string();
	let cfg = load_payload(payload).expect("Example config must be valid.");

	assert_eq!(cfg.providers.embedding.dimensions, 768);
	assert_eq!(cfg.chat.persona_name, "Mai");
}

#[test]
fn blank_admin_token_is_normalized_to_none() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must be valid.");

	assert!(cfg.security.admin_auth_token.is_none());
}

#[test]
fn retrieval_section_defaults_when_omitted() {
	let payload = sample_without(&[], "retrieval");
	let cfg = load_payload(payload).expect("Config without [retrieval] must be valid.");

	assert_eq!(cfg.retrieval.top_k, 5);
	assert_eq!(cfg.retrieval.threshold, 0.6);
	assert_eq!(cfg.retrieval.over_fetch_factor, 10);
	assert!(cfg.retrieval.use_intent);
	assert!(!cfg.retrieval.rerank_results);
	assert_eq!(cfg.retrieval.fallback.keyword_weight, 0.6);
	assert_eq!(cfg.retrieval.fallback.min_score, 0.3);
}

#[test]
fn qdrant_section_is_optional() {
	let payload = sample_without(&["storage"], "qdrant");
	let cfg = load_payload(payload).expect("Config without [storage.qdrant] must be valid.");

	assert!(cfg.storage.qdrant.is_none());
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let payload = sample_with(&["storage", "qdrant"], "vector_dim", Value::Integer(1_536));

	expect_validation_error(
		payload,
		"providers.embedding.dimensions must match storage.qdrant.vector_dim.",
	);
}

#[test]
fn threshold_must_be_in_unit_range() {
	let payload = sample_with(&["retrieval"], "threshold", Value::Float(1.5));

	expect_validation_error(payload, "retrieval.threshold must be in the range 0.0-1.0.");
}

#[test]
fn top_k_must_be_positive() {
	let payload = sample_with(&["retrieval"], "top_k", Value::Integer(0));

	expect_validation_error(payload, "retrieval.top_k must be greater than zero.");
}

#[test]
fn fallback_weights_must_be_non_negative() {
	let payload = sample_with(&["retrieval", "fallback"], "keyword_weight", Value::Float(-0.1));

	expect_validation_error(payload, "retrieval.fallback.keyword_weight must be zero or greater.");
}

#[test]
fn fallback_weights_cannot_all_be_zero() {
	let mut payload = sample_with(&["retrieval", "fallback"], "keyword_weight", Value::Float(0.0));

	for key in ["category_weight", "priority_weight"] {
		let mut root: Value = toml::from_str(&payload).expect("Failed to parse payload.");
		let fallback = root
			.get_mut("retrieval")
			.and_then(|value| value.get_mut("fallback"))
			.and_then(Value::as_table_mut)
			.expect("Payload must include [retrieval.fallback].");

		fallback.insert(key.to_string(), Value::Float(0.0));

		payload = toml::to_string(&root).expect("Failed to render payload.");
	}

	expect_validation_error(payload, "retrieval.fallback weights must not all be zero.");
}

#[test]
fn fallback_min_score_must_be_in_unit_range() {
	let payload = sample_with(&["retrieval", "fallback"], "min_score", Value::Float(-0.2));

	expect_validation_error(payload, "retrieval.fallback.min_score must be in the range 0.0-1.0.");
}

#[test]
fn rerank_length_bounds_must_be_ordered() {
	let payload = sample_with(&["retrieval", "rerank"], "short_chars", Value::Integer(2_000));

	expect_validation_error(
		payload,
		"retrieval.rerank.short_chars must be less than retrieval.rerank.long_chars.",
	);
}

#[test]
fn unknown_template_category_is_rejected() {
	let payload =
		sample_with(&["chat", "templates"], "hobbies", Value::String("I like chess.".to_string()));
	let err = load_payload(payload).expect_err("Expected an unknown template error.");

	assert!(matches!(err, Error::UnknownTemplate { ref key, .. } if key == "hobbies"), "{err:?}");
	assert!(err.to_string().contains("expected one of personal, skills"));
}

#[test]
fn provider_api_keys_must_be_non_empty() {
	let payload = sample_with(&["providers", "llm"], "api_key", Value::String("  ".to_string()));

	expect_validation_error(payload, "Provider llm api_key must be non-empty.");
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("folio_config_test_missing_file.toml");

	let err = folio_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
