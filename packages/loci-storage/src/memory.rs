use std::{
	collections::HashMap,
	sync::RwLock,
};

use time::{Duration, OffsetDateTime};

use crate::models::Session;

struct Entry {
	session: Session,
	expires_at: OffsetDateTime,
}

/// In-process keyed store. The default backend, and the fallback whenever the
/// durable backend is unavailable. Honors the same sliding TTL.
pub struct MemoryBackend {
	ttl: Duration,
	entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, entries: RwLock::new(HashMap::new()) }
	}

	pub fn put(&self, session: Session, now: OffsetDateTime) {
		let mut entries = self.entries.write().expect("Session map lock poisoned.");

		entries.insert(
			session.session_id.clone(),
			Entry { session, expires_at: now + self.ttl },
		);
	}

	/// Reads refresh the TTL and `last_accessed` as a side effect.
	pub fn get(&self, session_id: &str, now: OffsetDateTime) -> Option<Session> {
		let mut entries = self.entries.write().expect("Session map lock poisoned.");
		let entry = entries.get_mut(session_id)?;

		if entry.expires_at <= now {
			entries.remove(session_id);

			return None;
		}

		entry.expires_at = now + self.ttl;
		entry.session.last_accessed = now;

		Some(entry.session.clone())
	}

	pub fn delete(&self, session_id: &str) -> bool {
		let mut entries = self.entries.write().expect("Session map lock poisoned.");

		entries.remove(session_id).is_some()
	}

	pub fn count_active(&self, now: OffsetDateTime) -> u64 {
		let entries = self.entries.read().expect("Session map lock poisoned.");

		entries.values().filter(|entry| entry.expires_at > now).count() as u64
	}

	pub fn expire_older_than(&self, max_idle: Duration, now: OffsetDateTime) -> u64 {
		let mut entries = self.entries.write().expect("Session map lock poisoned.");
		let before = entries.len();

		entries.retain(|_, entry| {
			entry.expires_at > now && entry.session.last_accessed + max_idle > now
		});

		(before - entries.len()) as u64
	}
}
