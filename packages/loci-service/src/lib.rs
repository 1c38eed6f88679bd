pub mod search;

mod error;

pub use error::{Error, Result};
pub use search::{
	Candidate, DegradedReason, GeoPoint, QueryInterpretation, RetrievedRecord, ScoredPoi,
	SearchOptions, SearchRequest, SearchResponse, SignalValue,
};

use std::{future::Future, pin::Pin, sync::Arc};

use loci_config::{Config, EmbeddingProviderConfig};
use loci_domain::hours::{HoursEvaluator, ScheduleEvaluator};
use loci_providers::embedding;
use loci_storage::{qdrant::QdrantStore, sessions::SessionStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// The backing-index primitive: a named collection queried by vector,
/// answering ranked raw records. The collection name is picked per search
/// type by the caller.
pub trait RetrievalProvider
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		collection: &'a str,
		vector: Vec<f32>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedRecord>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub retrieval: Arc<dyn RetrievalProvider>,
	pub hours: Arc<dyn HoursEvaluator>,
}

pub struct LociService {
	pub cfg: Config,
	pub sessions: SessionStore,
	pub providers: Providers,
}

struct DefaultEmbedding;

impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		retrieval: Arc<dyn RetrievalProvider>,
		hours: Arc<dyn HoursEvaluator>,
	) -> Self {
		Self { embedding, retrieval, hours }
	}
}

impl LociService {
	pub fn new(cfg: Config, sessions: SessionStore, qdrant: QdrantStore) -> Self {
		let providers = Providers {
			embedding: Arc::new(DefaultEmbedding),
			retrieval: Arc::new(search::retrieval::QdrantRetrieval::new(qdrant)),
			hours: Arc::new(ScheduleEvaluator),
		};

		Self { cfg, sessions, providers }
	}

	pub fn with_providers(cfg: Config, sessions: SessionStore, providers: Providers) -> Self {
		Self { cfg, sessions, providers }
	}
}
