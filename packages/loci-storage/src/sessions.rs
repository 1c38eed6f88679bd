use serde_json::Value;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
	Result,
	memory::MemoryBackend,
	models::{ContextPatch, Session},
};

/// Durable keyed backend. Every read and write refreshes the sliding TTL.
pub struct PgSessionBackend {
	pool: PgPool,
	ttl: Duration,
}

impl PgSessionBackend {
	pub fn new(pool: PgPool, ttl: Duration) -> Self {
		Self { pool, ttl }
	}

	async fn put(&self, session: &Session, now: OffsetDateTime) -> Result<()> {
		let payload = serde_json::to_value(session)?;

		sqlx::query(
			"\
INSERT INTO sessions (session_id, owner_id, payload, created_at, last_accessed, expires_at)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (session_id) DO UPDATE
SET
	payload = EXCLUDED.payload,
	last_accessed = EXCLUDED.last_accessed,
	expires_at = EXCLUDED.expires_at",
		)
		.bind(session.session_id.as_str())
		.bind(session.owner_id.as_str())
		.bind(payload)
		.bind(session.created_at)
		.bind(now)
		.bind(now + self.ttl)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	async fn get(&self, session_id: &str, now: OffsetDateTime) -> Result<Option<Session>> {
		let payload: Option<Value> = sqlx::query_scalar(
			"SELECT payload FROM sessions WHERE session_id = $1 AND expires_at > $2",
		)
		.bind(session_id)
		.bind(now)
		.fetch_optional(&self.pool)
		.await?;
		let Some(payload) = payload else {
			return Ok(None);
		};

		// Old payloads deserialize with defaulted fields; see models::Session.
		let mut session: Session = serde_json::from_value(payload)?;

		session.last_accessed = now;

		sqlx::query(
			"UPDATE sessions SET last_accessed = $1, expires_at = $2 WHERE session_id = $3",
		)
		.bind(now)
		.bind(now + self.ttl)
		.bind(session_id)
		.execute(&self.pool)
		.await?;

		Ok(Some(session))
	}

	async fn delete(&self, session_id: &str) -> Result<bool> {
		let result = sqlx::query("DELETE FROM sessions WHERE session_id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	async fn count_active(&self, now: OffsetDateTime) -> Result<u64> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE expires_at > $1")
			.bind(now)
			.fetch_one(&self.pool)
			.await?;

		Ok(count.max(0) as u64)
	}

	async fn expire_older_than(&self, max_idle: Duration, now: OffsetDateTime) -> Result<u64> {
		let result =
			sqlx::query("DELETE FROM sessions WHERE expires_at <= $1 OR last_accessed < $2")
				.bind(now)
				.bind(now - max_idle)
				.execute(&self.pool)
				.await?;

		Ok(result.rows_affected())
	}
}

/// The one component allowed to persist Session state. Constructed at
/// process start and injected; there is no ambient singleton.
///
/// Durable-backend failures fall back to the in-process store and are logged,
/// never surfaced to the request. Concurrent updates to the same session id
/// are last-write-wins; a conversation issues requests sequentially, so the
/// race is accepted rather than locked around.
pub struct SessionStore {
	history_max: usize,
	durable: Option<PgSessionBackend>,
	fallback: MemoryBackend,
}

impl SessionStore {
	pub fn new(cfg: &loci_config::Session, pool: Option<PgPool>) -> Self {
		let ttl = Duration::hours(cfg.ttl_hours);

		Self {
			history_max: cfg.history_max as usize,
			durable: pool.map(|pool| PgSessionBackend::new(pool, ttl)),
			fallback: MemoryBackend::new(ttl),
		}
	}

	pub async fn create(&self, owner_id: &str) -> String {
		let now = OffsetDateTime::now_utc();
		let session_id = Uuid::new_v4().to_string();
		let session = Session::new(session_id.clone(), owner_id.to_string(), now);

		self.write(session, now).await;

		session_id
	}

	pub async fn get(&self, session_id: &str) -> Option<Session> {
		let now = OffsetDateTime::now_utc();

		if let Some(durable) = &self.durable {
			match durable.get(session_id, now).await {
				Ok(Some(session)) => return Some(session),
				// A durable miss still consults the fallback: sessions created
				// during an outage live there.
				Ok(None) => {},
				Err(err) => {
					tracing::warn!(
						error = %err,
						"Durable session read failed. Falling back to in-process store."
					);
				},
			}
		}

		self.fallback.get(session_id, now)
	}

	/// Read-modify-write as one logical step. A missing or expired session is
	/// recreated so the turn is never lost.
	pub async fn update(&self, session_id: &str, owner_id: &str, patch: ContextPatch) {
		let now = OffsetDateTime::now_utc();
		let mut session = self.get(session_id).await.unwrap_or_else(|| {
			Session::new(session_id.to_string(), owner_id.to_string(), now)
		});

		session.apply_patch(patch, self.history_max);

		self.write(session, now).await;
	}

	pub async fn delete(&self, session_id: &str) {
		if let Some(durable) = &self.durable
			&& let Err(err) = durable.delete(session_id).await
		{
			tracing::warn!(error = %err, "Durable session delete failed.");
		}

		self.fallback.delete(session_id);
	}

	pub async fn count_active(&self) -> u64 {
		let now = OffsetDateTime::now_utc();
		let mut count = self.fallback.count_active(now);

		if let Some(durable) = &self.durable {
			match durable.count_active(now).await {
				Ok(durable_count) => count += durable_count,
				Err(err) => {
					tracing::warn!(error = %err, "Durable session count failed.");
				},
			}
		}

		count
	}

	pub async fn expire_older_than(&self, max_idle: Duration) -> u64 {
		let now = OffsetDateTime::now_utc();
		let mut removed = self.fallback.expire_older_than(max_idle, now);

		if let Some(durable) = &self.durable {
			match durable.expire_older_than(max_idle, now).await {
				Ok(durable_removed) => removed += durable_removed,
				Err(err) => {
					tracing::warn!(error = %err, "Durable session sweep failed.");
				},
			}
		}

		removed
	}

	async fn write(&self, session: Session, now: OffsetDateTime) {
		if let Some(durable) = &self.durable {
			match durable.put(&session, now).await {
				Ok(()) => return,
				Err(err) => {
					tracing::warn!(
						error = %err,
						"Durable session write failed. Falling back to in-process store."
					);
				},
			}
		}

		self.fallback.put(session, now);
	}
}
