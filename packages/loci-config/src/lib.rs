mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Postgres, Providers, Qdrant, QdrantCollections, Ranking,
	RankingWeights, SIGNAL_NAMES, Search, Service, Session, Storage,
};

use std::{fs, path::Path};

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
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, collection) in [
		("storage.qdrant.collections.general", &cfg.storage.qdrant.collections.general),
		("storage.qdrant.collections.specific", &cfg.storage.qdrant.collections.specific),
		("storage.qdrant.collections.contextual", &cfg.storage.qdrant.collections.contextual),
	] {
		if collection.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.session.history_max == 0 {
		return Err(Error::Validation {
			message: "session.history_max must be greater than zero.".to_string(),
		});
	}
	if cfg.session.ttl_hours <= 0 {
		return Err(Error::Validation {
			message: "session.ttl_hours must be greater than zero.".to_string(),
		});
	}
	if cfg.session.sweep_interval_seconds == 0 {
		return Err(Error::Validation {
			message: "session.sweep_interval_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_results == 0 {
		return Err(Error::Validation {
			message: "search.max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_k < cfg.search.max_results {
		return Err(Error::Validation {
			message: "search.candidate_k must be at least search.max_results.".to_string(),
		});
	}
	if cfg.search.hours_filter_max == 0 {
		return Err(Error::Validation {
			message: "search.hours_filter_max must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.max_distance_km.is_finite() || cfg.search.max_distance_km <= 0.0 {
		return Err(Error::Validation {
			message: "search.max_distance_km must be a positive finite number.".to_string(),
		});
	}

	for (name, weight) in cfg.ranking.weights.as_pairs() {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("ranking.weights.{name} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation {
				message: format!("ranking.weights.{name} must be zero or greater."),
			});
		}
	}

	if cfg.ranking.weights.as_pairs().iter().all(|(_, weight)| *weight <= 0.0) {
		return Err(Error::Validation {
			message: "At least one ranking weight must be greater than zero.".to_string(),
		});
	}

	for signal in &cfg.ranking.disabled_signals {
		if !SIGNAL_NAMES.contains(&signal.as_str()) {
			return Err(Error::Validation {
				message: format!("ranking.disabled_signals contains unknown signal {signal}."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for signal in &mut cfg.ranking.disabled_signals {
		*signal = signal.trim().to_ascii_lowercase();
	}

	cfg.ranking.disabled_signals.sort();
	cfg.ranking.disabled_signals.dedup();
}
