use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;
use loci_service::{Error as ServiceError, SearchRequest, SearchResponse};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/sessions/count", get(session_count))
		.route("/v1/sessions/{session_id}", delete(delete_session))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct SessionCountBody {
	active: u64,
}

async fn session_count(State(state): State<AppState>) -> Json<SessionCountBody> {
	let active = state.service.sessions.count_active().await;

	Json(SessionCountBody { active })
}

async fn delete_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> StatusCode {
	state.service.sessions.delete(&session_id).await;

	StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::Provider { .. } => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
			ServiceError::Qdrant { .. } => (StatusCode::BAD_GATEWAY, "retrieval_unavailable"),
			ServiceError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
