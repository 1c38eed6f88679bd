use time::OffsetDateTime;

use super::scoring::Scored;
use loci_domain::hours::{self, HoursBucket, HoursEvaluator};

/// Post-ranking time-sensitive filter: closed entities are dropped, the rest
/// come back bucketed open, closing-soon, then opening-soon, capped at `max`,
/// with relative score order preserved inside each bucket. Candidates with no
/// hours metadata cannot be proven closed and stay in the open bucket.
pub(crate) fn apply(
	scored: Vec<Scored>,
	evaluator: &dyn HoursEvaluator,
	now: OffsetDateTime,
	max: usize,
) -> Vec<Scored> {
	let mut open = Vec::new();
	let mut closing_soon = Vec::new();
	let mut opening_soon = Vec::new();
	let mut dropped = 0_usize;

	for item in scored {
		let Some(hours) = item.candidate.hours.as_ref() else {
			tracing::debug!(poi_id = %item.candidate.poi_id, "No hours metadata. Keeping as open.");
			open.push(item);

			continue;
		};

		match hours::bucket(evaluator, hours, now) {
			HoursBucket::Open => open.push(item),
			HoursBucket::ClosingSoon => closing_soon.push(item),
			HoursBucket::OpeningSoon => opening_soon.push(item),
			HoursBucket::Closed => dropped += 1,
		}
	}

	if dropped > 0 {
		tracing::debug!(count = dropped, "Dropped closed candidates from a time-sensitive query.");
	}

	let mut out = open;

	out.append(&mut closing_soon);
	out.append(&mut opening_soon);
	out.truncate(max);

	out
}

#[cfg(test)]
mod tests {
	use serde_json::{Value, json};
	use time::macros::datetime;

	use super::*;
	use crate::search::Candidate;
	use loci_domain::hours::ScheduleEvaluator;

	fn scored(id: &str, total: f32, hours: Option<Value>) -> Scored {
		Scored {
			candidate: Candidate {
				poi_id: id.to_string(),
				title: id.to_string(),
				category: String::new(),
				description: String::new(),
				location: None,
				rating: 0.0,
				amenities: Vec::new(),
				relevance: 0.0,
				review_count: 0,
				last_reviewed_at: None,
				hours,
			},
			breakdown: Default::default(),
			total,
		}
	}

	fn all_day() -> Value {
		json!({ "mon": ["00:00-23:59"] })
	}

	fn closed_monday() -> Value {
		json!({ "tue": ["09:00-17:00"] })
	}

	fn closing_soon_monday() -> Value {
		json!({ "mon": ["09:00-12:30"] })
	}

	#[test]
	fn closed_candidates_are_dropped() {
		// Monday noon.
		let now = datetime!(2026-08-03 12:00 UTC);
		let items = vec![
			scored("open", 0.9, Some(all_day())),
			scored("closed", 0.8, Some(closed_monday())),
		];
		let filtered = apply(items, &ScheduleEvaluator, now, 20);
		let ids: Vec<&str> =
			filtered.iter().map(|item| item.candidate.poi_id.as_str()).collect();

		assert_eq!(ids, vec!["open"]);
	}

	#[test]
	fn buckets_preserve_score_order_and_precedence() {
		let now = datetime!(2026-08-03 12:00 UTC);
		let items = vec![
			scored("closing_high", 0.95, Some(closing_soon_monday())),
			scored("open_mid", 0.7, Some(all_day())),
			scored("open_low", 0.4, Some(all_day())),
		];
		let filtered = apply(items, &ScheduleEvaluator, now, 20);
		let ids: Vec<&str> =
			filtered.iter().map(|item| item.candidate.poi_id.as_str()).collect();

		// Open bucket first even when a closing-soon entry scored higher.
		assert_eq!(ids, vec!["open_mid", "open_low", "closing_high"]);
	}

	#[test]
	fn missing_hours_stay_in_the_open_bucket() {
		let now = datetime!(2026-08-03 12:00 UTC);
		let items = vec![scored("unknown", 0.5, None)];
		let filtered = apply(items, &ScheduleEvaluator, now, 20);

		assert_eq!(filtered.len(), 1);
	}

	#[test]
	fn cap_applies_after_bucketing() {
		let now = datetime!(2026-08-03 12:00 UTC);
		let items: Vec<Scored> =
			(0..30).map(|n| scored(&format!("p{n}"), 0.5, Some(all_day()))).collect();
		let filtered = apply(items, &ScheduleEvaluator, now, 20);

		assert_eq!(filtered.len(), 20);
	}
}
