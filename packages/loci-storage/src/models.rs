use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use loci_domain::followup::SearchType;

/// The context snapshot keeps at most this many ranked results; follow-up
/// references can only target what was actually shown.
pub const LAST_RESULTS_CAP: usize = 5;

/// Result summary carried in the context snapshot. Enough to resolve
/// follow-ups and to answer "is it open" without re-retrieving.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RankedPoi {
	pub poi_id: String,
	pub title: String,
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub rating: f32,
	#[serde(default)]
	pub score: f32,
	#[serde(default)]
	pub hours: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConversationContext {
	#[serde(default)]
	pub last_query: String,
	#[serde(default)]
	pub last_results: Vec<RankedPoi>,
	#[serde(default)]
	pub search_type: SearchType,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HistoryEntry {
	pub query: String,
	pub search_type: SearchType,
	#[serde(default)]
	pub result_count: u32,
	#[serde(with = "crate::time_serde")]
	pub at: OffsetDateTime,
}

/// Per-conversation state. Fields added after the first schema carry
/// `#[serde(default)]` so records written by older builds read back with
/// defaults instead of failing.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
	pub session_id: String,
	pub owner_id: String,
	#[serde(default)]
	pub history: Vec<HistoryEntry>,
	#[serde(default)]
	pub context: ConversationContext,
	#[serde(default)]
	pub shown_poi_ids: Vec<String>,
	#[serde(default)]
	pub turn_count: u64,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub last_accessed: OffsetDateTime,
}

/// One turn's outcome, applied to the session as a single logical step.
/// Structurally identical whether the session lives server-side or the
/// caller holds the context itself.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContextPatch {
	pub last_query: String,
	pub last_results: Vec<RankedPoi>,
	pub search_type: SearchType,
	#[serde(default)]
	pub shown_poi_ids: Vec<String>,
	#[serde(default)]
	pub result_count: u32,
	#[serde(with = "crate::time_serde")]
	pub at: OffsetDateTime,
}

impl Session {
	pub fn new(session_id: String, owner_id: String, now: OffsetDateTime) -> Self {
		Self {
			session_id,
			owner_id,
			history: Vec::new(),
			context: ConversationContext::default(),
			shown_poi_ids: Vec::new(),
			turn_count: 0,
			created_at: now,
			last_accessed: now,
		}
	}

	/// Applies one processed query. The turn counter strictly increases, the
	/// history stays within `history_max` (oldest evicted), the last-results
	/// snapshot within `LAST_RESULTS_CAP`.
	pub fn apply_patch(&mut self, patch: ContextPatch, history_max: usize) {
		self.turn_count += 1;
		self.history.push(HistoryEntry {
			query: patch.last_query.clone(),
			search_type: patch.search_type,
			result_count: patch.result_count,
			at: patch.at,
		});

		while self.history.len() > history_max {
			self.history.remove(0);
		}

		for poi_id in patch.shown_poi_ids {
			if !self.shown_poi_ids.contains(&poi_id) {
				self.shown_poi_ids.push(poi_id);
			}
		}

		let mut last_results = patch.last_results;

		last_results.truncate(LAST_RESULTS_CAP);

		self.context = ConversationContext {
			last_query: patch.last_query,
			last_results,
			search_type: patch.search_type,
		};
		self.last_accessed = patch.at;
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	fn patch(query: &str, at: OffsetDateTime) -> ContextPatch {
		ContextPatch {
			last_query: query.to_string(),
			last_results: Vec::new(),
			search_type: SearchType::General,
			shown_poi_ids: Vec::new(),
			result_count: 0,
			at,
		}
	}

	#[test]
	fn turn_counter_increases_by_one_per_patch() {
		let now = datetime!(2026-08-01 12:00 UTC);
		let mut session = Session::new("s".to_string(), "o".to_string(), now);

		for n in 1..=7 {
			session.apply_patch(patch("query", now), 50);

			assert_eq!(session.turn_count, n);
		}
	}

	#[test]
	fn history_evicts_oldest_beyond_max() {
		let now = datetime!(2026-08-01 12:00 UTC);
		let mut session = Session::new("s".to_string(), "o".to_string(), now);

		for n in 0..5 {
			session.apply_patch(patch(&format!("q{n}"), now), 3);
		}

		assert_eq!(session.history.len(), 3);
		assert_eq!(session.history[0].query, "q2");
		assert_eq!(session.history[2].query, "q4");
	}

	#[test]
	fn last_results_capped_at_five() {
		let now = datetime!(2026-08-01 12:00 UTC);
		let mut session = Session::new("s".to_string(), "o".to_string(), now);
		let results: Vec<RankedPoi> = (0..8)
			.map(|n| RankedPoi {
				poi_id: format!("p{n}"),
				title: format!("P{n}"),
				category: String::new(),
				description: String::new(),
				rating: 0.0,
				score: 0.0,
				hours: None,
			})
			.collect();

		session.apply_patch(
			ContextPatch {
				last_query: "q".to_string(),
				last_results: results,
				search_type: SearchType::General,
				shown_poi_ids: Vec::new(),
				result_count: 8,
				at: now,
			},
			50,
		);

		assert_eq!(session.context.last_results.len(), LAST_RESULTS_CAP);
	}

	#[test]
	fn shown_poi_ids_deduplicate() {
		let now = datetime!(2026-08-01 12:00 UTC);
		let mut session = Session::new("s".to_string(), "o".to_string(), now);
		let mut first = patch("q", now);

		first.shown_poi_ids = vec!["a".to_string(), "b".to_string()];

		session.apply_patch(first, 50);

		let mut second = patch("q2", now);

		second.shown_poi_ids = vec!["b".to_string(), "c".to_string()];

		session.apply_patch(second, 50);

		assert_eq!(session.shown_poi_ids, vec!["a", "b", "c"]);
	}

	#[test]
	fn session_payload_reads_back_with_missing_fields_defaulted() {
		let now = datetime!(2026-08-01 12:00 UTC);
		let mut session = Session::new("s".to_string(), "o".to_string(), now);

		session.turn_count = 4;

		// Simulate a record written before shown_poi_ids, turn_count, and
		// history existed.
		let mut raw = serde_json::to_value(&session).expect("Session must serialize.");
		let map = raw.as_object_mut().expect("Session payload must be an object.");

		map.remove("history");
		map.remove("shown_poi_ids");
		map.remove("turn_count");
		map.remove("context");

		let session: Session =
			serde_json::from_value(raw).expect("Old payloads must deserialize.");

		assert!(session.history.is_empty());
		assert!(session.shown_poi_ids.is_empty());
		assert_eq!(session.turn_count, 0);
	}
}
