use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use hush_core::{CreateError, Secret, Store};

/// Maximum allowed secret length (1 MB)
const MAX_SECRET_LENGTH: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/secret", post(create_secret))
        .route("/v1/secret/{hash}", get(fetch_secret))
        .route("/healthz", get(health))
        .with_state(state)
}

/// Submission form; the field names are part of the wire format
#[derive(Debug, Deserialize)]
pub struct CreateSecretForm {
    pub secret: String,
    #[serde(rename = "expireAfterViews")]
    pub expire_after_views: u32,
    /// TTL in minutes; 0 means the secret never expires by time
    #[serde(rename = "expireAfter")]
    pub expire_after: u32,
}

/// Client-facing representation of a secret
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
    pub hash: String,
    pub secret_text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub remaining_views: u32,
}

impl From<Secret> for SecretResponse {
    fn from(secret: Secret) -> Self {
        Self {
            hash: secret.key,
            secret_text: secret.text.to_string(),
            created_at: secret.created_at,
            expires_at: secret.expires_at,
            remaining_views: secret.remaining_views,
        }
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response()
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn create_secret(
    State(state): State<AppState>,
    Form(form): Form<CreateSecretForm>,
) -> Response {
    if form.secret.is_empty() {
        return bad_request("secret must not be empty");
    }
    if form.secret.len() > MAX_SECRET_LENGTH {
        return bad_request("secret exceeds maximum length");
    }
    if form.expire_after_views == 0 {
        return bad_request("expireAfterViews must be greater than 0");
    }

    match state
        .store
        .create(form.secret, form.expire_after_views, form.expire_after)
    {
        Ok(secret) => {
            tracing::debug!(hash = %secret.key, "secret created");
            (StatusCode::OK, Json(SecretResponse::from(secret))).into_response()
        }
        Err(err @ CreateError::ZeroMaxViews) => bad_request(&err.to_string()),
    }
}

pub async fn fetch_secret(State(state): State<AppState>, Path(hash): Path<String>) -> Response {
    match state.store.consume(&hash) {
        Ok(secret) => Json(SecretResponse::from(secret)).into_response(),
        Err(err) => {
            // The three failure reasons surface identically; only the log tells them apart
            tracing::debug!(hash = %hash, reason = err.reason(), "secret not readable");
            not_found()
        }
    }
}
