use serde::{Deserialize, Serialize};

use crate::text;

/// Minimum normalized hit score a category needs to qualify as a candidate.
/// Hit counts gate candidacy only; the reported confidence is the category's
/// fixed base confidence.
const MIN_MATCH_SCORE: f32 = 0.1;

const KEYWORD_WEIGHT: f32 = 1.0;
const PHRASE_WEIGHT: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryKind {
	Vegetarian,
	Vegan,
	GlutenFree,
	Halal,
	Kosher,
	#[default]
	None,
}
impl DietaryKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vegetarian => "vegetarian",
			Self::Vegan => "vegan",
			Self::GlutenFree => "gluten_free",
			Self::Halal => "halal",
			Self::Kosher => "kosher",
			Self::None => "none",
		}
	}
}

/// Dietary intent for one query. Computed fresh per turn, never persisted
/// beyond the turn's context patch.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DietaryMatch {
	pub kind: DietaryKind,
	pub confidence: f32,
	pub matched_terms: Vec<String>,
}
impl DietaryMatch {
	pub fn none() -> Self {
		Self { kind: DietaryKind::None, confidence: 0.0, matched_terms: Vec::new() }
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IntentBoost {
	pub name: String,
	pub factor: f32,
	pub confidence: f32,
}

/// General-purpose intent profile: the winning category, every qualifying
/// category as a boost, and the two flags the time-sensitive filter consumes.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GeneralIntentProfile {
	pub primary: Option<String>,
	pub confidence: f32,
	pub boosts: Vec<IntentBoost>,
	pub time_related: bool,
	pub hours_related: bool,
}

struct DietaryCategory {
	kind: DietaryKind,
	confidence: f32,
	keywords: &'static [&'static str],
	phrases: &'static [&'static str],
}

struct GeneralCategory {
	name: &'static str,
	confidence: f32,
	boost_factor: f32,
	keywords: &'static [&'static str],
	phrases: &'static [&'static str],
}

// Declaration order is the tie-break order.
const DIETARY_CATEGORIES: [DietaryCategory; 5] = [
	DietaryCategory {
		kind: DietaryKind::Vegetarian,
		confidence: 0.9,
		keywords: &["vegetarian", "veggie", "meatless"],
		phrases: &["no meat", "without meat"],
	},
	DietaryCategory {
		kind: DietaryKind::Vegan,
		confidence: 0.9,
		keywords: &["vegan"],
		phrases: &["plant based", "dairy free"],
	},
	DietaryCategory {
		kind: DietaryKind::GlutenFree,
		confidence: 0.85,
		keywords: &["celiac", "coeliac"],
		phrases: &["gluten free", "no gluten"],
	},
	DietaryCategory {
		kind: DietaryKind::Halal,
		confidence: 0.95,
		keywords: &["halal"],
		phrases: &[],
	},
	DietaryCategory {
		kind: DietaryKind::Kosher,
		confidence: 0.95,
		keywords: &["kosher"],
		phrases: &[],
	},
];

const GENERAL_CATEGORIES: [GeneralCategory; 6] = [
	GeneralCategory {
		name: "romantic",
		confidence: 0.8,
		boost_factor: 1.2,
		keywords: &["romantic", "anniversary", "intimate"],
		phrases: &["date night", "for a date"],
	},
	GeneralCategory {
		name: "family",
		confidence: 0.8,
		boost_factor: 1.15,
		keywords: &["family", "kids", "children", "toddler"],
		phrases: &["family friendly", "kid friendly"],
	},
	GeneralCategory {
		name: "budget",
		confidence: 0.75,
		boost_factor: 1.1,
		keywords: &["cheap", "budget", "affordable", "inexpensive"],
		phrases: &["good value", "not expensive"],
	},
	GeneralCategory {
		name: "upscale",
		confidence: 0.75,
		boost_factor: 1.1,
		keywords: &["fancy", "upscale", "luxury", "elegant"],
		phrases: &["fine dining", "special occasion", "michelin star"],
	},
	GeneralCategory {
		name: "quick",
		confidence: 0.7,
		boost_factor: 1.1,
		keywords: &["quick", "fast", "takeaway", "takeout"],
		phrases: &["fast food", "to go", "grab and go"],
	},
	GeneralCategory {
		name: "outdoor",
		confidence: 0.7,
		boost_factor: 1.1,
		keywords: &["patio", "terrace", "outdoor", "garden", "rooftop"],
		phrases: &["outdoor seating", "outside seating"],
	},
];

const TIME_KEYWORDS: [&str; 5] = ["now", "tonight", "today", "currently", "late"];
const TIME_PHRASES: [&str; 3] = ["right now", "at the moment", "this evening"];
const HOURS_KEYWORDS: [&str; 6] = ["open", "opened", "closed", "closing", "opening", "hours"];
const HOURS_PHRASES: [&str; 3] = ["open late", "still open", "opening hours"];

struct CategoryHits {
	score: f32,
	matched_terms: Vec<String>,
}

fn match_category(
	tokens: &[String],
	normalized_query: &str,
	keywords: &[&str],
	phrases: &[&str],
) -> Option<CategoryHits> {
	let mut weight = 0.0_f32;
	let mut matched_terms = Vec::new();

	for keyword in keywords {
		if text::contains_token(tokens, keyword) {
			weight += KEYWORD_WEIGHT;
			matched_terms.push(keyword.to_string());
		}
	}
	for phrase in phrases {
		if text::contains_phrase(normalized_query, phrase) {
			weight += PHRASE_WEIGHT;
			matched_terms.push(phrase.to_string());
		}
	}

	if matched_terms.is_empty() {
		return None;
	}

	let max_weight =
		keywords.len() as f32 * KEYWORD_WEIGHT + phrases.len() as f32 * PHRASE_WEIGHT;
	let score = if max_weight > 0.0 { weight / max_weight } else { 0.0 };

	if score <= MIN_MATCH_SCORE {
		return None;
	}

	Some(CategoryHits { score, matched_terms })
}

/// Pure and deterministic for identical input: same query, same answer.
pub fn classify_dietary(query: &str) -> DietaryMatch {
	let tokens = text::tokenize(query);
	let normalized_query = text::normalized(query);
	let mut best: Option<(&DietaryCategory, CategoryHits)> = None;

	for category in &DIETARY_CATEGORIES {
		let Some(hits) =
			match_category(&tokens, &normalized_query, category.keywords, category.phrases)
		else {
			continue;
		};

		// Winner is the highest base confidence; first declared wins ties.
		let replace = match &best {
			Some((current, _)) => category.confidence > current.confidence,
			None => true,
		};

		if replace {
			best = Some((category, hits));
		}
	}

	match best {
		Some((category, hits)) => DietaryMatch {
			kind: category.kind,
			confidence: category.confidence,
			matched_terms: hits.matched_terms,
		},
		None => DietaryMatch::none(),
	}
}

pub fn classify_general(query: &str) -> GeneralIntentProfile {
	let tokens = text::tokenize(query);
	let normalized_query = text::normalized(query);
	let mut boosts = Vec::new();
	let mut primary: Option<(&GeneralCategory, f32)> = None;

	for category in &GENERAL_CATEGORIES {
		let Some(hits) =
			match_category(&tokens, &normalized_query, category.keywords, category.phrases)
		else {
			continue;
		};

		boosts.push(IntentBoost {
			name: category.name.to_string(),
			factor: category.boost_factor,
			confidence: category.confidence,
		});

		let replace = match &primary {
			Some((current, _)) => category.confidence > current.confidence,
			None => true,
		};

		if replace {
			primary = Some((category, hits.score));
		}
	}

	let time_related = TIME_KEYWORDS.iter().any(|keyword| text::contains_token(&tokens, keyword))
		|| TIME_PHRASES.iter().any(|phrase| text::contains_phrase(&normalized_query, phrase));
	let hours_related = HOURS_KEYWORDS.iter().any(|keyword| text::contains_token(&tokens, keyword))
		|| HOURS_PHRASES.iter().any(|phrase| text::contains_phrase(&normalized_query, phrase));

	GeneralIntentProfile {
		primary: primary.as_ref().map(|(category, _)| category.name.to_string()),
		confidence: primary.map(|(category, _)| category.confidence).unwrap_or(0.0),
		boosts,
		time_related,
		hours_related,
	}
}

/// Fraction of the category's vocabulary present in `text`. Used by the
/// scoring engine for the dietary-match signal; 0.0 when the kind is None or
/// the vocabulary is empty.
pub fn dietary_overlap(kind: DietaryKind, text: &str) -> f32 {
	let Some(category) = DIETARY_CATEGORIES.iter().find(|category| category.kind == kind) else {
		return 0.0;
	};
	let tokens = text::tokenize(text);
	let normalized_text = text::normalized(text);
	let total = category.keywords.len() + category.phrases.len();

	if total == 0 {
		return 0.0;
	}

	let mut matched = 0_usize;

	for keyword in category.keywords {
		if text::contains_token(&tokens, keyword) {
			matched += 1;
		}
	}
	for phrase in category.phrases {
		if text::contains_phrase(&normalized_text, phrase) {
			matched += 1;
		}
	}

	matched as f32 / total as f32
}

/// Whether a general-intent boost's vocabulary appears in `text`.
pub fn boost_applies(name: &str, text: &str) -> bool {
	let Some(category) = GENERAL_CATEGORIES.iter().find(|category| category.name == name) else {
		return false;
	};
	let tokens = text::tokenize(text);
	let normalized_text = text::normalized(text);

	category.keywords.iter().any(|keyword| text::contains_token(&tokens, keyword))
		|| category.phrases.iter().any(|phrase| text::contains_phrase(&normalized_text, phrase))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vegetarian_query_matches_with_base_confidence() {
		let intent = classify_dietary("vegetarian restaurant");

		assert_eq!(intent.kind, DietaryKind::Vegetarian);
		assert_eq!(intent.confidence, 0.9);
		assert_eq!(intent.matched_terms, vec!["vegetarian".to_string()]);
	}

	#[test]
	fn no_dietary_match_returns_none_with_zero_confidence() {
		let intent = classify_dietary("sushi near the station");

		assert_eq!(intent.kind, DietaryKind::None);
		assert_eq!(intent.confidence, 0.0);
		assert!(intent.matched_terms.is_empty());
	}

	#[test]
	fn hit_count_does_not_change_confidence() {
		let single = classify_dietary("vegetarian lunch");
		let several = classify_dietary("vegetarian veggie meatless lunch with no meat");

		assert_eq!(single.confidence, several.confidence);
		assert!(several.matched_terms.len() > single.matched_terms.len());
	}

	#[test]
	fn declaration_order_breaks_confidence_ties() {
		// Vegetarian and vegan share a base confidence; vegetarian is declared
		// first and must win when both match.
		let intent = classify_dietary("vegan or vegetarian options");

		assert_eq!(intent.kind, DietaryKind::Vegetarian);
	}

	#[test]
	fn phrases_match_across_punctuation() {
		let intent = classify_dietary("somewhere gluten-free, please");

		assert_eq!(intent.kind, DietaryKind::GlutenFree);
		assert_eq!(intent.confidence, 0.85);
	}

	#[test]
	fn general_profile_collects_all_qualifying_boosts() {
		let profile = classify_general("cheap family friendly pizza");

		assert_eq!(profile.primary.as_deref(), Some("family"));

		let names: Vec<&str> = profile.boosts.iter().map(|boost| boost.name.as_str()).collect();

		assert!(names.contains(&"family"));
		assert!(names.contains(&"budget"));
	}

	#[test]
	fn time_and_hours_flags_require_their_vocabularies() {
		let profile = classify_general("is it open right now");

		assert!(profile.time_related);
		assert!(profile.hours_related);

		let profile = classify_general("best ramen in town");

		assert!(!profile.time_related);
		assert!(!profile.hours_related);
	}
}
