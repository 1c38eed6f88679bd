use time::OffsetDateTime;

use super::{ScoredPoi, scoring::Scored};
use loci_domain::followup::{Detection, SearchType};
use loci_storage::models::{ContextPatch, LAST_RESULTS_CAP, RankedPoi};

/// The context patch for the next turn. Identical in shape for server-held
/// sessions and client-held contexts.
pub(crate) fn context_patch(
	query: &str,
	scored: &[Scored],
	search_type: SearchType,
	now: OffsetDateTime,
) -> ContextPatch {
	let last_results: Vec<RankedPoi> = scored
		.iter()
		.take(LAST_RESULTS_CAP)
		.map(|item| RankedPoi {
			poi_id: item.candidate.poi_id.clone(),
			title: item.candidate.title.clone(),
			category: item.candidate.category.clone(),
			description: item.candidate.description.clone(),
			rating: item.candidate.rating,
			score: item.total,
			hours: item.candidate.hours.clone(),
		})
		.collect();

	ContextPatch {
		last_query: query.to_string(),
		shown_poi_ids: scored.iter().map(|item| item.candidate.poi_id.clone()).collect(),
		result_count: scored.len() as u32,
		last_results,
		search_type,
		at: now,
	}
}

pub(crate) fn summary(
	query: &str,
	detection: &Detection,
	resolved: &[String],
	results: &[ScoredPoi],
	hours_filter_applied: bool,
) -> String {
	if detection.is_follow_up {
		if results.is_empty() {
			// The resolver picked something, the time filter dropped it.
			if hours_filter_applied && !resolved.is_empty() {
				return format!("{} appears to be closed right now.", resolved[0]);
			}

			return "Nothing from the previous results matches that.".to_string();
		}
		if results.len() == 1 {
			let top = &results[0];

			if top.category.is_empty() {
				return format!("About {}, rated {:.1} of 5.", top.title, top.rating);
			}

			return format!(
				"About {} ({}), rated {:.1} of 5.",
				top.title, top.category, top.rating
			);
		}

		return format!("Revisiting {} places from the previous results.", results.len());
	}
	if results.is_empty() {
		return format!("No places matched \"{query}\".");
	}

	let top = &results[0];

	if hours_filter_applied {
		format!(
			"Found {} places open now for \"{query}\"; top match: {}.",
			results.len(),
			top.title
		)
	} else {
		format!("Found {} places for \"{query}\"; top match: {}.", results.len(), top.title)
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use crate::search::SignalValue;

	fn result(title: &str) -> ScoredPoi {
		ScoredPoi {
			poi_id: title.to_lowercase(),
			title: title.to_string(),
			category: "restaurant".to_string(),
			description: String::new(),
			rating: 4.5,
			signals: Vec::<SignalValue>::new(),
			total_score: 0.8,
		}
	}

	fn follow_up() -> Detection {
		Detection {
			search_type: SearchType::Specific,
			is_follow_up: true,
			reference: None,
			confidence: 0.9,
		}
	}

	fn new_search() -> Detection {
		Detection {
			search_type: SearchType::General,
			is_follow_up: false,
			reference: None,
			confidence: 0.8,
		}
	}

	#[test]
	fn closed_follow_up_names_the_resolved_entity() {
		let summary =
			summary("is the first one open now", &follow_up(), &["A".to_string()], &[], true);

		assert_eq!(summary, "A appears to be closed right now.");
	}

	#[test]
	fn single_follow_up_describes_the_place() {
		let summary = summary(
			"tell me about the first one",
			&follow_up(),
			&["Cafe Flora".to_string()],
			&[result("Cafe Flora")],
			false,
		);

		assert!(summary.contains("Cafe Flora"));
		assert!(summary.contains("4.5"));
	}

	#[test]
	fn new_search_summary_counts_results() {
		let summary =
			summary("vegetarian restaurant", &new_search(), &[], &[result("A"), result("B")], false);

		assert!(summary.contains("2 places"));
		assert!(summary.contains("vegetarian restaurant"));
	}

	#[test]
	fn patch_caps_last_results() {
		let patch = context_patch(
			"q",
			&[],
			SearchType::General,
			datetime!(2026-08-01 12:00 UTC),
		);

		assert!(patch.last_results.is_empty());
		assert_eq!(patch.last_query, "q");
	}
}
