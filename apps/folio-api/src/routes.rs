use axum::{
	Json, Router,
	body::Body,
	extract::{Path, State},
	http::{HeaderMap, Request, StatusCode, header},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_domain::{KnowledgeFragment, RetrievalResult};
use folio_service::{
	ChatRequest, ChatResponse, CreateFragmentRequest, Error as ServiceError, ReindexReport,
	RetrieveOptions, UpdateFragmentRequest,
};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
	pub query: String,
	pub k: Option<u32>,
	pub threshold: Option<f32>,
	pub use_intent: Option<bool>,
	pub rerank_results: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
	pub results: Vec<RetrievalResult>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
	pub fragments: Vec<KnowledgeFragment>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::NotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "not_found", message),
			ServiceError::Provider { message } =>
				Self::new(StatusCode::BAD_GATEWAY, "provider_error", message),
			ServiceError::IndexUnavailable { message } =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "index_unavailable", message),
			ServiceError::Timeout { message } =>
				Self::new(StatusCode::GATEWAY_TIMEOUT, "timeout", message),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage error.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "Storage error.")
			},
			ServiceError::Qdrant { message } => {
				tracing::error!(error = %message, "Vector index error.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "index_error", "Vector index error.")
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/assistant/chat", post(chat))
		.route("/v1/assistant/retrieve", post(retrieve))
		.with_state(state)
}

/// Fragment management. Guarded by a bearer token when `security.admin_auth_token` is set.
pub fn admin_router(state: AppState) -> Router {
	let router = Router::new()
		.route("/v1/admin/fragments", get(list_fragments).post(create_fragment))
		.route("/v1/admin/fragments/{id}", post(update_fragment).delete(deactivate_fragment))
		.route("/v1/admin/reindex", post(reindex));

	match state.service.cfg.security.admin_auth_token.clone() {
		Some(token) => router
			.layer(middleware::from_fn_with_state(token, admin_auth_middleware))
			.with_state(state),
		None => router.with_state(state),
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.chat(payload).await?;

	Ok(Json(response))
}

async fn retrieve(
	State(state): State<AppState>,
	Json(payload): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
	let defaults = RetrieveOptions::from_config(&state.service.cfg.retrieval);
	let options = RetrieveOptions {
		k: payload.k.unwrap_or(defaults.k),
		threshold: payload.threshold.unwrap_or(defaults.threshold),
		use_intent: payload.use_intent.unwrap_or(defaults.use_intent),
		rerank_results: payload.rerank_results.unwrap_or(defaults.rerank_results),
	};
	let results = state.service.retrieve(&payload.query, options).await?;

	Ok(Json(RetrieveResponse { results }))
}

async fn list_fragments(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
	let fragments = state.service.list_fragments().await?;

	Ok(Json(ListResponse { fragments }))
}

async fn create_fragment(
	State(state): State<AppState>,
	Json(payload): Json<CreateFragmentRequest>,
) -> Result<(StatusCode, Json<KnowledgeFragment>), ApiError> {
	let fragment = state.service.create_fragment(payload).await?;

	Ok((StatusCode::CREATED, Json(fragment)))
}

async fn update_fragment(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
	Json(payload): Json<UpdateFragmentRequest>,
) -> Result<Json<KnowledgeFragment>, ApiError> {
	let fragment = state.service.update_fragment(id, payload).await?;

	Ok(Json(fragment))
}

async fn deactivate_fragment(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	state.service.deactivate_fragment(id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexReport>, ApiError> {
	let report = state.service.reindex().await?;

	Ok(Json(report))
}

async fn admin_auth_middleware(
	State(token): State<String>,
	req: Request<Body>,
	next: Next,
) -> Response {
	if !read_bearer_token(req.headers()).is_some_and(|value| value == token) {
		return ApiError::new(
			StatusCode::UNAUTHORIZED,
			"unauthorized",
			"A valid Bearer token is required.",
		)
		.into_response();
	}

	next.run(req).await
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(header::AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}
