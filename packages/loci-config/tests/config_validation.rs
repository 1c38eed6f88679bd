use std::path::PathBuf;

use loci_config::Config;

fn example_path() -> PathBuf {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../loci.example.toml");

	path
}

fn base_config() -> Config {
	let raw = std::fs::read_to_string(example_path()).expect("Failed to read example config.");

	toml::from_str(&raw).expect("Failed to parse example config.")
}

#[test]
fn loci_example_toml_is_valid() {
	loci_config::load(&example_path()).expect("Expected loci.example.toml to be a valid config.");
}

#[test]
fn default_weights_sum_to_one() {
	let cfg = base_config();
	let total: f32 = cfg.ranking.weights.as_pairs().iter().map(|(_, weight)| weight).sum();

	assert!((total - 1.0).abs() < 1e-6, "Unexpected weight total: {total}");
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let mut cfg = base_config();

	cfg.storage.qdrant.vector_dim = 512;

	let err = loci_config::validate(&cfg).expect_err("Expected dimension validation error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn candidate_k_must_cover_max_results() {
	let mut cfg = base_config();

	cfg.search.candidate_k = 5;
	cfg.search.max_results = 10;

	let err = loci_config::validate(&cfg).expect_err("Expected candidate_k validation error.");

	assert!(
		err.to_string().contains("search.candidate_k must be at least search.max_results."),
		"Unexpected error: {err}"
	);
}

#[test]
fn ranking_weights_must_be_finite() {
	let mut cfg = base_config();

	cfg.ranking.weights.distance = f32::NAN;

	let err = loci_config::validate(&cfg).expect_err("Expected weight validation error.");

	assert!(
		err.to_string().contains("ranking.weights.distance must be a finite number."),
		"Unexpected error: {err}"
	);
}

#[test]
fn ranking_weights_must_be_non_negative() {
	let mut cfg = base_config();

	cfg.ranking.weights.rating = -0.1;

	let err = loci_config::validate(&cfg).expect_err("Expected weight validation error.");

	assert!(
		err.to_string().contains("ranking.weights.rating must be zero or greater."),
		"Unexpected error: {err}"
	);
}

#[test]
fn disabled_signals_must_be_known() {
	let mut cfg = base_config();

	cfg.ranking.disabled_signals = vec!["sentiment".to_string()];

	let err = loci_config::validate(&cfg).expect_err("Expected disabled signal validation error.");

	assert!(
		err.to_string().contains("ranking.disabled_signals contains unknown signal sentiment."),
		"Unexpected error: {err}"
	);
}

#[test]
fn session_ttl_must_be_positive() {
	let mut cfg = base_config();

	cfg.session.ttl_hours = 0;

	let err = loci_config::validate(&cfg).expect_err("Expected session TTL validation error.");

	assert!(
		err.to_string().contains("session.ttl_hours must be greater than zero."),
		"Unexpected error: {err}"
	);
}
