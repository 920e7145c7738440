pub mod auth;
pub mod discovery;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use leadscout_common::{LeadScoutError, Platform};

use crate::AppState;

// --- Errors ---

/// Maps domain errors onto HTTP statuses with a `{"error": ...}` body.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub LeadScoutError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            LeadScoutError::ClientInput(_) | LeadScoutError::CredentialUnusable { .. } => {
                StatusCode::BAD_REQUEST
            }
            LeadScoutError::CollaboratorUnavailable(_) => StatusCode::BAD_GATEWAY,
            LeadScoutError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            LeadScoutError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            LeadScoutError::Storage(_) | LeadScoutError::Anyhow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<LeadScoutError>() {
            Ok(domain) => ApiError(domain),
            Err(other) => ApiError(LeadScoutError::Anyhow(other)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(LeadScoutError::ClientInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_terminal() {
            warn!(%status, error = %self.0, "Request rejected");
        } else {
            error!(%status, error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

// --- Health ---

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "Lead discovery API is running",
    }))
}

// --- Users ---

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    email: String,
}

pub async fn api_create_user(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let email = body.email.trim();
    if email.is_empty() {
        return Err(LeadScoutError::ClientInput("email is required".into()).into());
    }
    let user = state
        .users
        .create_user(email)
        .await
        .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
    info!(user_id = %user.id, "User created");
    Ok(Json(serde_json::json!({ "user_id": user.id, "email": user.email })))
}

pub async fn api_connections(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let connections = state.credentials.connection_status(user_id).await?;
    Ok(Json(serde_json::json!({
        "user_id": user_id,
        "connections": connections,
    })))
}

pub async fn api_usage(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let twitter = state.usage.usage(user_id, Platform::Twitter, 30).await?;
    let linkedin = state.usage.usage(user_id, Platform::Linkedin, 1).await?;
    Ok(Json(serde_json::json!({
        "user_id": user_id,
        "usage": {
            "twitter": twitter,
            "linkedin": linkedin,
        },
    })))
}
