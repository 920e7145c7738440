use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Redirect},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use leadscout_common::{LeadScoutError, Platform};

use super::ApiError;
use crate::AppState;

const ANONYMOUS_STATE: &str = "anonymous";

#[derive(Deserialize)]
pub struct AuthStartQuery {
    user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct AuthCallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// Redirect the browser to the platform's consent page. The user id rides
/// along in `state`.
pub async fn auth_start(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(query): Query<AuthStartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let platform: Platform = platform.parse()?;
    let oauth_state = query
        .user_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| ANONYMOUS_STATE.to_string());
    let url = state.oauth.authorize_url(platform, &oauth_state)?;
    Ok(Redirect::temporary(&url))
}

/// Exchange the authorization code and store the token for the user named
/// in `state`. Anonymous flows complete without storing anything; any other
/// state that is not a user id is rejected before the code is spent.
pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(query): Query<AuthCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let platform: Platform = platform.parse()?;
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| LeadScoutError::ClientInput("authorization failed: no code".into()))?;
    let user_id = match query.state.as_deref() {
        None | Some(ANONYMOUS_STATE) => None,
        Some(raw) => Some(
            raw.parse::<Uuid>()
                .map_err(|_| LeadScoutError::ClientInput("invalid state".into()))?,
        ),
    };

    let payload = state
        .oauth
        .exchange_code(platform, &code)
        .await
        .map_err(|e| match e.downcast::<LeadScoutError>() {
            Ok(domain) => domain,
            Err(other) => {
                LeadScoutError::ClientInput(format!("failed to get access token: {other}"))
            }
        })?;

    if let Some(user_id) = user_id {
        state.credentials.store(user_id, platform, payload).await?;
        info!(%user_id, %platform, "Platform connected");
    }

    Ok(Json(serde_json::json!({
        "message": format!("{platform} connected successfully"),
        "user_id": user_id,
        "platform": platform,
    })))
}
