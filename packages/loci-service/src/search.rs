pub(crate) mod retrieval;

mod assemble;
mod hours_filter;
mod scoring;

use serde_json::Value;
use time::OffsetDateTime;

use crate::{Error, LociService, Result};
use loci_domain::{
	followup::{self, FollowUpReference, SearchType},
	intent::{self, DietaryMatch, GeneralIntentProfile},
};
use loci_storage::models::{ContextPatch, ConversationContext, RankedPoi};

const MAX_SESSION_ID_CHARS: usize = 128;

#[derive(Clone, Copy, Debug, serde::Deserialize, serde::Serialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lng: f64,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SearchRequest {
	pub query: String,
	pub owner_id: String,
	pub session_id: Option<String>,
	#[serde(default)]
	pub options: SearchOptions,
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct SearchOptions {
	/// Client-held context: when present the session store is bypassed for
	/// this request and the caller persists the returned patch itself.
	pub client_context: Option<ConversationContext>,
	pub user_location: Option<GeoPoint>,
	pub max_results: Option<u32>,
}

/// Raw record from the backing index: identity, raw document, metadata, and
/// a relevance in 0..1 (higher is closer).
#[derive(Clone, Debug)]
pub struct RetrievedRecord {
	pub id: String,
	pub document: String,
	pub metadata: Value,
	pub relevance: f32,
}

/// A retrieved POI, pre-scoring. Owned by the current request.
#[derive(Clone, Debug)]
pub struct Candidate {
	pub poi_id: String,
	pub title: String,
	pub category: String,
	pub description: String,
	pub location: Option<GeoPoint>,
	pub rating: f32,
	pub amenities: Vec<String>,
	pub relevance: f32,
	pub review_count: u32,
	pub last_reviewed_at: Option<OffsetDateTime>,
	pub hours: Option<Value>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SignalValue {
	pub name: String,
	pub value: f32,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ScoredPoi {
	pub poi_id: String,
	pub title: String,
	pub category: String,
	pub description: String,
	pub rating: f32,
	pub signals: Vec<SignalValue>,
	pub total_score: f32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
	EmbeddingUnavailable,
	RetrievalUnavailable,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct QueryInterpretation {
	pub search_type: SearchType,
	pub is_follow_up: bool,
	pub reference: Option<FollowUpReference>,
	pub confidence: f32,
	pub dietary: DietaryMatch,
	pub intent: GeneralIntentProfile,
	/// Titles the follow-up resolver picked, before any time filtering.
	pub resolved: Vec<String>,
	pub hours_filter_applied: bool,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SearchResponse {
	pub results: Vec<ScoredPoi>,
	pub search_type: SearchType,
	pub query_interpretation: QueryInterpretation,
	pub context: ContextPatch,
	pub session_id: Option<String>,
	pub text_summary: String,
	pub degraded: Option<DegradedReason>,
}

impl LociService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = req.query.trim().to_string();
		let owner_id = req.owner_id.trim().to_string();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query is required.".to_string() });
		}
		if owner_id.is_empty() {
			return Err(Error::InvalidRequest { message: "owner_id is required.".to_string() });
		}
		if let Some(session_id) = req.session_id.as_deref() {
			validate_session_id(session_id)?;
		}

		let now = OffsetDateTime::now_utc();
		let client_held = req.options.client_context.is_some();
		let (context, session_id) = if let Some(context) = req.options.client_context.clone() {
			(context, None)
		} else if let Some(session_id) = req.session_id.clone() {
			let context = self
				.sessions
				.get(&session_id)
				.await
				.map(|session| session.context)
				.unwrap_or_default();

			(context, Some(session_id))
		} else {
			let session_id = self.sessions.create(&owner_id).await;

			(ConversationContext::default(), Some(session_id))
		};

		let previous_titles: Vec<String> =
			context.last_results.iter().map(|poi| poi.title.clone()).collect();
		let detection = followup::detect(&query, &previous_titles);
		let dietary = intent::classify_dietary(&query);
		let general = intent::classify_general(&query);

		let mut resolved = Vec::new();
		let candidates = if detection.is_follow_up {
			let indices = followup::resolve(detection.reference.as_ref(), &previous_titles);
			let mut picked = Vec::with_capacity(indices.len());

			for index in indices {
				if let Some(poi) = context.last_results.get(index) {
					resolved.push(poi.title.clone());
					picked.push(candidate_from_summary(poi));
				}
			}

			picked
		} else {
			match self.retrieve(&query, detection.search_type).await {
				Ok(records) => records.into_iter().map(decode_candidate).collect(),
				Err((reason, message)) => {
					tracing::warn!(
						reason = ?reason,
						error = %message,
						"Upstream search failed. Returning a degraded empty response."
					);

					return Ok(degraded_response(
						&query,
						detection,
						dietary,
						general,
						&context,
						session_id,
						reason,
						now,
					));
				},
			}
		};

		let scoring_ctx = scoring::ScoringContext {
			dietary: &dietary,
			general: &general,
			user_location: req.options.user_location,
			max_distance_km: self.cfg.search.max_distance_km,
			disabled_signals: &self.cfg.ranking.disabled_signals,
			now,
		};
		let mut scored = scoring::rank(candidates, &scoring_ctx, &self.cfg.ranking.weights);
		let hours_filter_applied = general.time_related && general.hours_related;

		if hours_filter_applied {
			scored = hours_filter::apply(
				scored,
				self.providers.hours.as_ref(),
				now,
				self.cfg.search.hours_filter_max as usize,
			);
		}

		let max_results =
			req.options.max_results.unwrap_or(self.cfg.search.max_results).max(1) as usize;

		scored.truncate(max_results);

		let results: Vec<ScoredPoi> = scored.iter().map(scoring::to_response_item).collect();
		let patch = assemble::context_patch(&query, &scored, detection.search_type, now);
		let text_summary = assemble::summary(&query, &detection, &resolved, &results, hours_filter_applied);
		let interpretation = QueryInterpretation {
			search_type: detection.search_type,
			is_follow_up: detection.is_follow_up,
			reference: detection.reference.clone(),
			confidence: detection.confidence,
			dietary,
			intent: general,
			resolved,
			hours_filter_applied,
		};

		if !client_held && let Some(session_id) = &session_id {
			self.sessions.update(session_id, &owner_id, patch.clone()).await;
		}

		Ok(SearchResponse {
			results,
			search_type: detection.search_type,
			query_interpretation: interpretation,
			context: patch,
			session_id,
			text_summary,
			degraded: None,
		})
	}

	async fn retrieve(
		&self,
		query: &str,
		search_type: SearchType,
	) -> std::result::Result<Vec<RetrievedRecord>, (DegradedReason, String)> {
		let texts = vec![query.to_string()];
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &texts)
			.await
			.map_err(|err| (DegradedReason::EmbeddingUnavailable, err.to_string()))?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err((
				DegradedReason::EmbeddingUnavailable,
				"Embedding provider returned no vectors.".to_string(),
			));
		};

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err((
				DegradedReason::EmbeddingUnavailable,
				"Embedding vector dimension mismatch.".to_string(),
			));
		}

		let collection = match search_type {
			SearchType::General => self.cfg.storage.qdrant.collections.general.as_str(),
			SearchType::Specific => self.cfg.storage.qdrant.collections.specific.as_str(),
			SearchType::Contextual => self.cfg.storage.qdrant.collections.contextual.as_str(),
		};

		self.providers
			.retrieval
			.query(collection, vector, self.cfg.search.candidate_k)
			.await
			.map_err(|err| (DegradedReason::RetrievalUnavailable, err.to_string()))
	}
}

fn validate_session_id(session_id: &str) -> Result<()> {
	if session_id.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "session_id must be non-empty.".to_string() });
	}
	if session_id.chars().count() > MAX_SESSION_ID_CHARS {
		return Err(Error::InvalidRequest {
			message: "session_id exceeds the supported length.".to_string(),
		});
	}
	if session_id.chars().any(char::is_control) {
		return Err(Error::InvalidRequest {
			message: "session_id contains control characters.".to_string(),
		});
	}

	Ok(())
}

/// A degraded upstream turn returns zero results and echoes the caller's
/// context unchanged; the session is not advanced.
#[allow(clippy::too_many_arguments)]
fn degraded_response(
	query: &str,
	detection: followup::Detection,
	dietary: DietaryMatch,
	general: GeneralIntentProfile,
	context: &ConversationContext,
	session_id: Option<String>,
	reason: DegradedReason,
	now: OffsetDateTime,
) -> SearchResponse {
	let patch = ContextPatch {
		last_query: context.last_query.clone(),
		last_results: context.last_results.clone(),
		search_type: context.search_type,
		shown_poi_ids: Vec::new(),
		result_count: 0,
		at: now,
	};

	SearchResponse {
		results: Vec::new(),
		search_type: detection.search_type,
		query_interpretation: QueryInterpretation {
			search_type: detection.search_type,
			is_follow_up: detection.is_follow_up,
			reference: detection.reference,
			confidence: detection.confidence,
			dietary,
			intent: general,
			resolved: Vec::new(),
			hours_filter_applied: false,
		},
		context: patch,
		session_id,
		text_summary: format!("Search is temporarily unavailable for \"{query}\". Please retry."),
		degraded: Some(reason),
	}
}

/// Rehydrates a stored result summary into a candidate so a follow-up turn
/// flows through the same scoring path as a fresh retrieval. Missing data
/// lands on the neutral defaults.
fn candidate_from_summary(poi: &RankedPoi) -> Candidate {
	Candidate {
		poi_id: poi.poi_id.clone(),
		title: poi.title.clone(),
		category: poi.category.clone(),
		description: poi.description.clone(),
		location: None,
		rating: poi.rating,
		amenities: Vec::new(),
		relevance: poi.score.clamp(0.0, 1.0),
		review_count: 0,
		last_reviewed_at: None,
		hours: poi.hours.clone(),
	}
}

fn decode_candidate(record: RetrievedRecord) -> Candidate {
	let metadata = &record.metadata;
	let title = metadata_str(metadata, "title").unwrap_or_else(|| record.id.clone());
	let category = metadata_str(metadata, "category").unwrap_or_default();
	let description =
		metadata_str(metadata, "description").unwrap_or_else(|| record.document.clone());
	let location = match (metadata_f64(metadata, "lat"), metadata_f64(metadata, "lng")) {
		(Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
		_ => None,
	};
	let rating = metadata_f64(metadata, "rating").unwrap_or(0.0).clamp(0.0, 5.0) as f32;
	let amenities = metadata
		.get("amenities")
		.and_then(Value::as_array)
		.map(|values| {
			values.iter().filter_map(Value::as_str).map(|value| value.to_string()).collect()
		})
		.unwrap_or_default();
	let review_count = metadata.get("review_count").and_then(Value::as_u64).unwrap_or(0) as u32;
	let last_reviewed_at = metadata_str(metadata, "last_reviewed_at").and_then(|raw| {
		OffsetDateTime::parse(&raw, &time::format_description::well_known::Rfc3339).ok()
	});
	let hours = metadata.get("hours").filter(|value| !value.is_null()).cloned();

	Candidate {
		poi_id: record.id,
		title,
		category,
		description,
		location,
		rating,
		amenities,
		relevance: record.relevance.clamp(0.0, 1.0),
		review_count,
		last_reviewed_at,
		hours,
	}
}

fn metadata_str(metadata: &Value, key: &str) -> Option<String> {
	metadata.get(key).and_then(Value::as_str).map(|value| value.to_string())
}

fn metadata_f64(metadata: &Value, key: &str) -> Option<f64> {
	metadata.get(key).and_then(Value::as_f64)
}
