pub mod rest;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use leadscout_scout::traits::{OAuthExchange, UserRepository};
use leadscout_scout::{CredentialStore, LeadScoutServices, PipelineController, UsageTracker};

/// Shared handler state.
pub struct AppState {
    pub pipeline: Arc<PipelineController>,
    pub users: Arc<dyn UserRepository>,
    pub credentials: Arc<CredentialStore>,
    pub usage: Arc<UsageTracker>,
    pub oauth: Arc<dyn OAuthExchange>,
    /// Used when a discovery request omits `target`.
    pub default_target: u32,
}

impl AppState {
    pub fn from_services(services: &LeadScoutServices) -> Self {
        Self {
            pipeline: services.pipeline.clone(),
            users: services.repositories.users.clone(),
            credentials: services.credentials.clone(),
            usage: services.usage.clone(),
            oauth: services.oauth.clone(),
            default_target: services.default_target,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(rest::health))
        .route("/api/lead-discovery", post(rest::discovery::api_lead_discovery))
        .route("/api/user/create", post(rest::api_create_user))
        .route("/api/user/{user_id}/connections", get(rest::api_connections))
        .route("/api/usage/{user_id}", get(rest::api_usage))
        .route("/auth/{platform}", get(rest::auth::auth_start))
        .route("/auth/{platform}/callback", get(rest::auth::auth_callback))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path only: query strings can carry OAuth codes.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
