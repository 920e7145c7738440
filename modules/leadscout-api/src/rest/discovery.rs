use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use leadscout_common::{DiscoveryRequest, DiscoveryResult};

use super::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct LeadDiscoveryRequest {
    #[serde(default)]
    emails: Vec<String>,
    #[serde(default)]
    company_info: String,
    #[serde(default)]
    goal: String,
    target: Option<i64>,
    user_id: Option<Uuid>,
    user_email: Option<String>,
}

pub async fn api_lead_discovery(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LeadDiscoveryRequest>, JsonRejection>,
) -> Result<Json<DiscoveryResult>, ApiError> {
    let Json(body) = body?;
    let request = DiscoveryRequest {
        emails: body.emails,
        company_info: body.company_info,
        goal: body.goal,
        target_count: body.target.unwrap_or(i64::from(state.default_target)),
        user_id: body.user_id,
        user_email: body.user_email,
    };
    info!(
        emails = request.emails.len(),
        target = request.target_count,
        "Lead discovery requested"
    );
    let result = state.pipeline.discover(request).await?;
    Ok(Json(result))
}
