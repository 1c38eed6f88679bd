use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text;

const ORDINAL_CONFIDENCE: f32 = 0.9;
const NAMED_CONFIDENCE: f32 = 0.85;
const REFERENCE_CONFIDENCE: f32 = 0.7;
const IMPLIED_CONFIDENCE: f32 = 0.6;
const NEW_SEARCH_CONFIDENCE: f32 = 0.8;

static ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"\b(first|1st|second|2nd|third|3rd|fourth|4th|fifth|5th|last|number\s+(\d+))\b",
	)
	.expect("Ordinal pattern must compile.")
});

const REFERENCE_WORDS: [&str; 5] = ["that", "this", "it", "the", "one"];
const DETAIL_KEYWORDS: [&str; 10] =
	["open", "closed", "hours", "phone", "address", "call", "website", "menu", "contact", "email"];
const REFINEMENT_KEYWORDS: [&str; 7] =
	["cheaper", "closer", "instead", "other", "another", "similar", "else"];
const ALL_PREVIOUS_PHRASES: [&str; 4] =
	["all of them", "all of those", "any of them", "which of these"];

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
	#[default]
	General,
	Specific,
	Contextual,
}
impl SearchType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::General => "general",
			Self::Specific => "specific",
			Self::Contextual => "contextual",
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FollowUpReference {
	Ordinal { index: usize },
	Named { title: String },
	AllPrevious,
}

/// Outcome of the query-type decision for one turn. `reference` is `None`
/// for an untargeted follow-up; the resolver then defaults to index 0.
#[derive(Clone, Debug, Serialize)]
pub struct Detection {
	pub search_type: SearchType,
	pub is_follow_up: bool,
	pub reference: Option<FollowUpReference>,
	pub confidence: f32,
}
impl Detection {
	fn new_search(search_type: SearchType) -> Self {
		Self { search_type, is_follow_up: false, reference: None, confidence: NEW_SEARCH_CONFIDENCE }
	}
}

/// The single ordered decision policy. First match wins; there are no
/// overlapping fallback checks after it.
pub fn detect(query: &str, previous_titles: &[String]) -> Detection {
	// 1. Nothing shown yet: never a follow-up, whatever the wording.
	if previous_titles.is_empty() {
		return Detection::new_search(classify_search_type(query));
	}

	let tokens = text::tokenize(query);
	let normalized_query = text::normalized(query);

	for phrase in ALL_PREVIOUS_PHRASES {
		if text::contains_phrase(&normalized_query, phrase) {
			return Detection {
				search_type: SearchType::Contextual,
				is_follow_up: true,
				reference: Some(FollowUpReference::AllPrevious),
				confidence: REFERENCE_CONFIDENCE,
			};
		}
	}

	// 2. Ordinal/positional token.
	if let Some(index) = ordinal_index(&normalized_query, previous_titles.len()) {
		return Detection {
			search_type: SearchType::Specific,
			is_follow_up: true,
			reference: Some(FollowUpReference::Ordinal { index }),
			confidence: ORDINAL_CONFIDENCE,
		};
	}

	// 3. Named entity from the previous turn.
	if let Some(title) = named_match(&normalized_query, previous_titles) {
		return Detection {
			search_type: SearchType::Specific,
			is_follow_up: true,
			reference: Some(FollowUpReference::Named { title }),
			confidence: NAMED_CONFIDENCE,
		};
	}

	// 4. Reference word plus a detail keyword: untargeted follow-up.
	let has_reference_word =
		REFERENCE_WORDS.iter().any(|word| text::contains_token(&tokens, word));
	let has_detail_keyword =
		DETAIL_KEYWORDS.iter().any(|word| text::contains_token(&tokens, word));

	if has_reference_word && has_detail_keyword {
		return Detection {
			search_type: SearchType::Contextual,
			is_follow_up: true,
			reference: None,
			confidence: REFERENCE_CONFIDENCE,
		};
	}

	// 5. New search. A specific-looking query with results on the table must
	// still be reported as a follow-up: search_type == Specific with non-empty
	// previous results implies is_follow_up. This guard is the one place that
	// invariant is enforced.
	let search_type = classify_search_type(query);

	if search_type == SearchType::Specific {
		return Detection {
			search_type,
			is_follow_up: true,
			reference: None,
			confidence: IMPLIED_CONFIDENCE,
		};
	}

	Detection::new_search(search_type)
}

/// Resolves a reference to indices into the previous result list. Never
/// empty while `previous_len > 0`: an unresolved target degrades to index 0.
pub fn resolve(reference: Option<&FollowUpReference>, previous_titles: &[String]) -> Vec<usize> {
	if previous_titles.is_empty() {
		return Vec::new();
	}

	match reference {
		Some(FollowUpReference::Ordinal { index }) =>
			if *index < previous_titles.len() {
				vec![*index]
			} else {
				vec![0]
			},
		Some(FollowUpReference::Named { title }) => {
			let wanted = text::normalized(title);
			let found = previous_titles
				.iter()
				.position(|candidate| text::normalized(candidate) == wanted);

			vec![found.unwrap_or(0)]
		},
		Some(FollowUpReference::AllPrevious) => (0..previous_titles.len()).collect(),
		None => vec![0],
	}
}

/// Search type from linguistic cues alone; knows nothing about the session.
pub fn classify_search_type(query: &str) -> SearchType {
	let tokens = text::tokenize(query);
	let normalized_query = text::normalized(query);

	if ORDINAL_RE.is_match(&normalized_query) {
		return SearchType::Specific;
	}

	let has_reference_word =
		REFERENCE_WORDS.iter().any(|word| text::contains_token(&tokens, word));
	let has_detail_keyword =
		DETAIL_KEYWORDS.iter().any(|word| text::contains_token(&tokens, word));

	if has_reference_word && has_detail_keyword {
		return SearchType::Specific;
	}
	if text::contains_phrase(&normalized_query, "tell me about")
		|| text::contains_phrase(&normalized_query, "more about")
	{
		return SearchType::Specific;
	}
	if REFINEMENT_KEYWORDS.iter().any(|word| text::contains_token(&tokens, word)) {
		return SearchType::Contextual;
	}

	SearchType::General
}

fn ordinal_index(normalized_query: &str, previous_len: usize) -> Option<usize> {
	let captures = ORDINAL_RE.captures(normalized_query)?;
	let token = captures.get(1).map(|group| group.as_str()).unwrap_or_default();
	let index = match token {
		"first" | "1st" => 0,
		"second" | "2nd" => 1,
		"third" | "3rd" => 2,
		"fourth" | "4th" => 3,
		"fifth" | "5th" => 4,
		"last" => previous_len.saturating_sub(1),
		_ => match captures.get(2).and_then(|group| group.as_str().parse::<usize>().ok()) {
			// "number N" is one-indexed in conversation.
			Some(position) if position > 0 => position - 1,
			_ => 0,
		},
	};

	// Out-of-range ordinals fall back to the top result.
	if index >= previous_len { Some(0) } else { Some(index) }
}

fn named_match(normalized_query: &str, previous_titles: &[String]) -> Option<String> {
	for title in previous_titles {
		let wanted = text::normalized(title);

		// Single-character titles would match almost anything as a substring.
		if wanted.len() < 2 {
			continue;
		}
		if normalized_query == wanted || text::contains_phrase(normalized_query, &wanted) {
			return Some(title.clone());
		}
	}

	None
}
