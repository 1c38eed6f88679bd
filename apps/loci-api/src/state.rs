use std::sync::Arc;

use loci_service::LociService;
use loci_storage::{db::Db, qdrant::QdrantStore, sessions::SessionStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LociService>,
}
impl AppState {
	pub async fn new(config: loci_config::Config) -> color_eyre::Result<Self> {
		// The durable backend is best-effort: when Postgres is unreachable at
		// startup the store runs in-process and requests still succeed.
		let pool = match Db::connect(&config.storage.postgres).await {
			Ok(db) => {
				db.ensure_schema().await?;

				Some(db.pool)
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Postgres unavailable at startup. Sessions stay in-process."
				);

				None
			},
		};
		let sessions = SessionStore::new(&config.session, pool);
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let service = LociService::new(config, sessions, qdrant);

		Ok(Self { service: Arc::new(service) })
	}
}
