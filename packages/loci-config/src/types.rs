use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub session: Session,
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub vector_dim: u32,
	pub collections: QdrantCollections,
}

/// Collection per search type. The detector's outcome picks which one a new
/// search queries.
#[derive(Debug, Deserialize)]
pub struct QdrantCollections {
	pub general: String,
	pub specific: String,
	pub contextual: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
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
#[serde(default)]
pub struct Session {
	pub history_max: u32,
	pub ttl_hours: i64,
	pub sweep_interval_seconds: u64,
}
impl Default for Session {
	fn default() -> Self {
		Self { history_max: 50, ttl_hours: 24, sweep_interval_seconds: 300 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub max_results: u32,
	pub candidate_k: u32,
	pub hours_filter_max: u32,
	pub max_distance_km: f32,
}
impl Default for Search {
	fn default() -> Self {
		Self { max_results: 10, candidate_k: 40, hours_filter_max: 20, max_distance_km: 10.0 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub weights: RankingWeights,
	/// Signal names scored as the neutral 0.5 regardless of candidate data.
	pub disabled_signals: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
	pub semantic: f32,
	pub rating: f32,
	pub distance: f32,
	pub freshness: f32,
	pub popularity: f32,
	pub dietary: f32,
	pub category: f32,
	pub intent_boost: f32,
}
impl Default for RankingWeights {
	fn default() -> Self {
		Self {
			semantic: 0.25,
			rating: 0.15,
			distance: 0.15,
			freshness: 0.1,
			popularity: 0.1,
			dietary: 0.1,
			category: 0.1,
			intent_boost: 0.05,
		}
	}
}
impl RankingWeights {
	pub fn as_pairs(&self) -> [(&'static str, f32); 8] {
		[
			("semantic", self.semantic),
			("rating", self.rating),
			("distance", self.distance),
			("freshness", self.freshness),
			("popularity", self.popularity),
			("dietary", self.dietary),
			("category", self.category),
			("intent_boost", self.intent_boost),
		]
	}
}

pub const SIGNAL_NAMES: [&str; 8] = [
	"semantic",
	"rating",
	"distance",
	"freshness",
	"popularity",
	"dietary",
	"category",
	"intent_boost",
];
