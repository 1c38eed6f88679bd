use std::cmp::Ordering;

use time::OffsetDateTime;

use super::{Candidate, GeoPoint, ScoredPoi, SignalValue};
use loci_config::RankingWeights;
use loci_domain::intent::{self, DietaryKind, DietaryMatch, GeneralIntentProfile};

/// Neutral value for a signal with no data or disabled by configuration.
pub(crate) const NEUTRAL_SIGNAL: f32 = 0.5;

/// Freshness when the last-review timestamp is absent. A stand-in, not
/// ground truth: missing source data is read as stale-ish rather than
/// defaulting the timestamp to "now".
const FRESHNESS_UNKNOWN: f32 = 0.3;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const CAFE_DIETARY_BOOST: f32 = 0.15;
const REVIEW_COUNT_SATURATION: f32 = 200.0;
const AMENITY_COUNT_SATURATION: f32 = 8.0;

// Most specific (longest) matching substring wins; table order breaks ties.
const CATEGORY_RELEVANCE: [(DietaryKind, &str, f32); 18] = [
	(DietaryKind::Vegetarian, "vegetarian", 1.0),
	(DietaryKind::Vegetarian, "vegan", 0.9),
	(DietaryKind::Vegetarian, "salad", 0.8),
	(DietaryKind::Vegetarian, "cafe", 0.7),
	(DietaryKind::Vegetarian, "steakhouse", 0.2),
	(DietaryKind::Vegetarian, "restaurant", 0.6),
	(DietaryKind::Vegan, "vegan", 1.0),
	(DietaryKind::Vegan, "vegetarian", 0.8),
	(DietaryKind::Vegan, "juice", 0.8),
	(DietaryKind::Vegan, "cafe", 0.7),
	(DietaryKind::Vegan, "steakhouse", 0.1),
	(DietaryKind::Vegan, "restaurant", 0.5),
	(DietaryKind::GlutenFree, "bakery", 0.7),
	(DietaryKind::GlutenFree, "restaurant", 0.6),
	(DietaryKind::Halal, "halal", 1.0),
	(DietaryKind::Halal, "restaurant", 0.6),
	(DietaryKind::Kosher, "kosher", 1.0),
	(DietaryKind::Kosher, "restaurant", 0.6),
];

pub(crate) struct ScoringContext<'a> {
	pub dietary: &'a DietaryMatch,
	pub general: &'a GeneralIntentProfile,
	pub user_location: Option<GeoPoint>,
	pub max_distance_km: f32,
	pub disabled_signals: &'a [String],
	pub now: OffsetDateTime,
}

/// Named per-signal values, each clamped to [0,1] before weighting.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SignalBreakdown {
	pub semantic: f32,
	pub rating: f32,
	pub distance: f32,
	pub freshness: f32,
	pub popularity: f32,
	pub dietary: f32,
	pub category: f32,
	pub intent_boost: f32,
}
impl SignalBreakdown {
	pub fn pairs(&self) -> [(&'static str, f32); 8] {
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

	/// A pure function of the breakdown and the weights vector.
	pub fn total(&self, weights: &RankingWeights) -> f32 {
		self.pairs()
			.iter()
			.zip(weights.as_pairs().iter())
			.map(|((_, value), (_, weight))| value * weight)
			.sum()
	}
}

pub(crate) struct Scored {
	pub candidate: Candidate,
	pub breakdown: SignalBreakdown,
	pub total: f32,
}

pub(crate) fn score(
	candidate: Candidate,
	ctx: &ScoringContext<'_>,
	weights: &RankingWeights,
) -> Scored {
	let text = candidate_text(&candidate);
	let mut breakdown = SignalBreakdown {
		semantic: candidate.relevance.clamp(0.0, 1.0),
		rating: rating_signal(&candidate),
		distance: distance_signal(&candidate, ctx),
		freshness: freshness_signal(&candidate, ctx.now),
		popularity: popularity_signal(&candidate),
		dietary: dietary_signal(&candidate, &text, ctx.dietary),
		category: category_signal(&candidate, ctx.dietary),
		intent_boost: intent_boost_signal(&text, ctx.general),
	};

	for signal in ctx.disabled_signals {
		match signal.as_str() {
			"semantic" => breakdown.semantic = NEUTRAL_SIGNAL,
			"rating" => breakdown.rating = NEUTRAL_SIGNAL,
			"distance" => breakdown.distance = NEUTRAL_SIGNAL,
			"freshness" => breakdown.freshness = NEUTRAL_SIGNAL,
			"popularity" => breakdown.popularity = NEUTRAL_SIGNAL,
			"dietary" => breakdown.dietary = NEUTRAL_SIGNAL,
			"category" => breakdown.category = NEUTRAL_SIGNAL,
			"intent_boost" => breakdown.intent_boost = NEUTRAL_SIGNAL,
			_ => {},
		}
	}

	let total = breakdown.total(weights);

	Scored { candidate, breakdown, total }
}

/// Scores and sorts. `Vec::sort_by` is stable, so equal totals keep their
/// retrieval order.
pub(crate) fn rank(
	candidates: Vec<Candidate>,
	ctx: &ScoringContext<'_>,
	weights: &RankingWeights,
) -> Vec<Scored> {
	let mut scored: Vec<Scored> =
		candidates.into_iter().map(|candidate| score(candidate, ctx, weights)).collect();

	scored.sort_by(|left, right| cmp_f32_desc(left.total, right.total));

	scored
}

pub(crate) fn to_response_item(scored: &Scored) -> ScoredPoi {
	ScoredPoi {
		poi_id: scored.candidate.poi_id.clone(),
		title: scored.candidate.title.clone(),
		category: scored.candidate.category.clone(),
		description: scored.candidate.description.clone(),
		rating: scored.candidate.rating,
		signals: scored
			.breakdown
			.pairs()
			.iter()
			.map(|(name, value)| SignalValue { name: name.to_string(), value: *value })
			.collect(),
		total_score: scored.total,
	}
}

pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

fn candidate_text(candidate: &Candidate) -> String {
	let mut text = String::with_capacity(
		candidate.title.len() + candidate.category.len() + candidate.description.len() + 32,
	);

	text.push_str(&candidate.title);
	text.push(' ');
	text.push_str(&candidate.category);
	text.push(' ');
	text.push_str(&candidate.description);

	for amenity in &candidate.amenities {
		text.push(' ');
		text.push_str(amenity);
	}

	text
}

fn rating_signal(candidate: &Candidate) -> f32 {
	// Ratings live on a 1-5 scale; zero means the source had none.
	if candidate.rating <= 0.0 {
		return NEUTRAL_SIGNAL;
	}

	(candidate.rating / 5.0).clamp(0.0, 1.0)
}

fn distance_signal(candidate: &Candidate, ctx: &ScoringContext<'_>) -> f32 {
	let (Some(user), Some(poi)) = (ctx.user_location, candidate.location) else {
		return NEUTRAL_SIGNAL;
	};
	let distance_km = haversine_km(user, poi) as f32;
	let tau = ctx.max_distance_km / 3.0;

	if tau <= 0.0 {
		return NEUTRAL_SIGNAL;
	}

	(-distance_km / tau).exp().clamp(0.0, 1.0)
}

fn freshness_signal(candidate: &Candidate, now: OffsetDateTime) -> f32 {
	let Some(reviewed_at) = candidate.last_reviewed_at else {
		return FRESHNESS_UNKNOWN;
	};
	let days = ((now - reviewed_at).as_seconds_f32() / 86_400.0).max(0.0);

	if days < 30.0 {
		1.0
	} else if days < 90.0 {
		0.8
	} else if days < 365.0 {
		0.6
	} else {
		0.4
	}
}

fn popularity_signal(candidate: &Candidate) -> f32 {
	let review_saturation = (candidate.review_count as f32 / REVIEW_COUNT_SATURATION).min(1.0);
	let amenity_saturation = (candidate.amenities.len() as f32 / AMENITY_COUNT_SATURATION).min(1.0);

	(0.6 * review_saturation + 0.4 * amenity_saturation).clamp(0.0, 1.0)
}

fn dietary_signal(candidate: &Candidate, text: &str, dietary: &DietaryMatch) -> f32 {
	if dietary.kind == DietaryKind::None {
		return NEUTRAL_SIGNAL;
	}

	let overlap = intent::dietary_overlap(dietary.kind, text);
	let mut value = overlap * dietary.confidence;
	let category = candidate.category.to_lowercase();

	// Cafes skew vegetarian/vegan-friendly even without explicit tags.
	if matches!(dietary.kind, DietaryKind::Vegetarian | DietaryKind::Vegan)
		&& (category.contains("cafe") || category.contains("café") || category.contains("coffee"))
	{
		value += CAFE_DIETARY_BOOST;
	}

	value.clamp(0.0, 1.0)
}

fn category_signal(candidate: &Candidate, dietary: &DietaryMatch) -> f32 {
	if dietary.kind == DietaryKind::None {
		return NEUTRAL_SIGNAL;
	}

	let category = candidate.category.to_lowercase();
	let mut best: Option<(usize, f32)> = None;

	for (kind, needle, relevance) in CATEGORY_RELEVANCE {
		if kind != dietary.kind || !category.contains(needle) {
			continue;
		}

		let more_specific = match best {
			Some((len, _)) => needle.len() > len,
			None => true,
		};

		if more_specific {
			best = Some((needle.len(), relevance));
		}
	}

	best.map(|(_, relevance)| relevance).unwrap_or(NEUTRAL_SIGNAL)
}

fn intent_boost_signal(text: &str, general: &GeneralIntentProfile) -> f32 {
	if general.boosts.is_empty() {
		return NEUTRAL_SIGNAL;
	}

	let mut sum = 0.0_f32;

	for boost in &general.boosts {
		if intent::boost_applies(&boost.name, text) {
			sum += (boost.factor * boost.confidence).clamp(0.0, 1.0);
		} else {
			sum += NEUTRAL_SIGNAL;
		}
	}

	(sum / general.boosts.len() as f32).clamp(0.0, 1.0)
}

fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
	let lat_a = a.lat.to_radians();
	let lat_b = b.lat.to_radians();
	let d_lat = (b.lat - a.lat).to_radians();
	let d_lng = (b.lng - a.lng).to_radians();
	let h = (d_lat / 2.0).sin().powi(2)
		+ lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

	2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	fn weights() -> RankingWeights {
		RankingWeights::default()
	}

	fn breakdown() -> SignalBreakdown {
		SignalBreakdown {
			semantic: 0.5,
			rating: 0.5,
			distance: 0.5,
			freshness: 0.5,
			popularity: 0.5,
			dietary: 0.5,
			category: 0.5,
			intent_boost: 0.5,
		}
	}

	fn candidate(id: &str, relevance: f32) -> Candidate {
		Candidate {
			poi_id: id.to_string(),
			title: id.to_string(),
			category: "restaurant".to_string(),
			description: String::new(),
			location: None,
			rating: 4.0,
			amenities: Vec::new(),
			relevance,
			review_count: 0,
			last_reviewed_at: None,
			hours: None,
		}
	}

	fn neutral_ctx<'a>(
		dietary: &'a DietaryMatch,
		general: &'a GeneralIntentProfile,
	) -> ScoringContext<'a> {
		ScoringContext {
			dietary,
			general,
			user_location: None,
			max_distance_km: 10.0,
			disabled_signals: &[],
			now: datetime!(2026-08-01 12:00 UTC),
		}
	}

	#[test]
	fn total_is_monotonic_in_every_signal() {
		let weights = weights();
		let base = breakdown();
		let base_total = base.total(&weights);

		for index in 0..8 {
			let mut raised = breakdown();

			match index {
				0 => raised.semantic = 0.9,
				1 => raised.rating = 0.9,
				2 => raised.distance = 0.9,
				3 => raised.freshness = 0.9,
				4 => raised.popularity = 0.9,
				5 => raised.dietary = 0.9,
				6 => raised.category = 0.9,
				_ => raised.intent_boost = 0.9,
			}

			assert!(
				raised.total(&weights) >= base_total,
				"Raising signal {index} lowered the total."
			);
		}
	}

	#[test]
	fn equal_totals_keep_retrieval_order() {
		let dietary = DietaryMatch::none();
		let general = GeneralIntentProfile::default();
		let ctx = neutral_ctx(&dietary, &general);
		let candidates =
			vec![candidate("a", 0.5), candidate("b", 0.5), candidate("c", 0.5)];
		let ranked = rank(candidates, &ctx, &weights());
		let order: Vec<&str> =
			ranked.iter().map(|scored| scored.candidate.poi_id.as_str()).collect();

		assert_eq!(order, vec!["a", "b", "c"]);
	}

	#[test]
	fn higher_relevance_ranks_first() {
		let dietary = DietaryMatch::none();
		let general = GeneralIntentProfile::default();
		let ctx = neutral_ctx(&dietary, &general);
		let candidates = vec![candidate("low", 0.2), candidate("high", 0.9)];
		let ranked = rank(candidates, &ctx, &weights());

		assert_eq!(ranked[0].candidate.poi_id, "high");
	}

	#[test]
	fn disabled_signals_read_neutral() {
		let dietary = DietaryMatch::none();
		let general = GeneralIntentProfile::default();
		let disabled = vec!["rating".to_string()];
		let ctx = ScoringContext {
			dietary: &dietary,
			general: &general,
			user_location: None,
			max_distance_km: 10.0,
			disabled_signals: &disabled,
			now: datetime!(2026-08-01 12:00 UTC),
		};
		let scored = score(candidate("a", 0.7), &ctx, &weights());

		assert_eq!(scored.breakdown.rating, NEUTRAL_SIGNAL);
	}

	#[test]
	fn distance_decays_exponentially() {
		let dietary = DietaryMatch::none();
		let general = GeneralIntentProfile::default();
		let mut ctx = neutral_ctx(&dietary, &general);

		ctx.user_location = Some(GeoPoint { lat: 47.6, lng: -122.33 });

		let mut near = candidate("near", 0.5);

		near.location = Some(GeoPoint { lat: 47.6, lng: -122.33 });

		let mut far = candidate("far", 0.5);

		// Roughly 110 km north.
		far.location = Some(GeoPoint { lat: 48.6, lng: -122.33 });

		let near_signal = distance_signal(&near, &ctx);
		let far_signal = distance_signal(&far, &ctx);

		assert!(near_signal > 0.99);
		assert!(far_signal < 0.01);
	}

	#[test]
	fn missing_rating_is_neutral() {
		let mut c = candidate("a", 0.5);

		c.rating = 0.0;

		assert_eq!(rating_signal(&c), NEUTRAL_SIGNAL);

		c.rating = 4.0;

		assert_eq!(rating_signal(&c), 0.8);
	}

	#[test]
	fn missing_location_is_neutral() {
		let dietary = DietaryMatch::none();
		let general = GeneralIntentProfile::default();
		let ctx = neutral_ctx(&dietary, &general);

		assert_eq!(distance_signal(&candidate("a", 0.5), &ctx), NEUTRAL_SIGNAL);
	}

	#[test]
	fn freshness_steps_by_age() {
		let now = datetime!(2026-08-01 12:00 UTC);
		let mut c = candidate("a", 0.5);

		c.last_reviewed_at = Some(datetime!(2026-07-20 12:00 UTC));

		assert_eq!(freshness_signal(&c, now), 1.0);

		c.last_reviewed_at = Some(datetime!(2026-06-01 12:00 UTC));

		assert_eq!(freshness_signal(&c, now), 0.8);

		c.last_reviewed_at = Some(datetime!(2026-01-01 12:00 UTC));

		assert_eq!(freshness_signal(&c, now), 0.6);

		c.last_reviewed_at = Some(datetime!(2020-01-01 12:00 UTC));

		assert_eq!(freshness_signal(&c, now), 0.4);

		c.last_reviewed_at = None;

		assert_eq!(freshness_signal(&c, now), FRESHNESS_UNKNOWN);
	}

	#[test]
	fn category_lookup_prefers_most_specific_match() {
		let dietary = DietaryMatch {
			kind: DietaryKind::Vegetarian,
			confidence: 0.9,
			matched_terms: vec!["vegetarian".to_string()],
		};
		let mut c = candidate("a", 0.5);

		c.category = "steakhouse restaurant".to_string();

		// "steakhouse" and "restaurant" are equally long; table order keeps
		// the steakhouse penalty.
		assert_eq!(category_signal(&c, &dietary), 0.2);

		c.category = "vegetarian restaurant".to_string();

		assert_eq!(category_signal(&c, &dietary), 1.0);

		c.category = "tea house".to_string();

		assert_eq!(category_signal(&c, &dietary), NEUTRAL_SIGNAL);
	}

	#[test]
	fn cafes_get_the_vegetarian_boost() {
		let dietary = DietaryMatch {
			kind: DietaryKind::Vegetarian,
			confidence: 0.9,
			matched_terms: vec!["vegetarian".to_string()],
		};
		let mut plain = candidate("plain", 0.5);
		let mut cafe = candidate("cafe", 0.5);

		plain.category = "restaurant".to_string();
		cafe.category = "cafe".to_string();

		let plain_text = candidate_text(&plain);
		let cafe_text = candidate_text(&cafe);

		assert!(
			dietary_signal(&cafe, &cafe_text, &dietary)
				> dietary_signal(&plain, &plain_text, &dietary)
		);
	}
}
