pub mod auth;
pub mod config;
pub mod database;
pub mod directions;
pub mod error;
pub mod image;
pub mod llm;
pub mod parse;
pub mod planner;
pub mod prompt;
pub mod saved_routes_handlers;
pub mod weather;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use shared::{ApiError, GenerateRequest, Itinerary};
use tower_http::cors::CorsLayer;

use crate::auth::AuthUser;
use crate::config::Config;
use crate::database::Database;
use crate::error::PlanError;
use crate::planner::TripPlanner;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub planner: Arc<TripPlanner>,
    pub http: reqwest::Client,
    pub config: Arc<Config>,
}

pub fn create_router(state: AppState) -> Router {
    let origin = state
        .config
        .client_url
        .parse::<HeaderValue>()
        .expect("valid CLIENT_URL origin");
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/generate", post(generate_handler))
        .route(
            "/api/routes",
            get(saved_routes_handlers::list_routes).post(saved_routes_handlers::save_route),
        )
        .route("/api/routes/:id", delete(saved_routes_handlers::delete_route))
        .route("/api/weather", get(weather::forecast_handler))
        .route("/api/image", get(image::image_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// POST /api/generate - Run the planning pipeline for the authenticated user
async fn generate_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Itinerary>, (StatusCode, Json<ApiError>)> {
    state
        .planner
        .plan(&req, &user.user_id.to_string())
        .await
        .map(Json)
        .map_err(plan_error_to_api_error)
}

fn plan_error_to_api_error(err: PlanError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        PlanError::MissingInput(_) => StatusCode::BAD_REQUEST,
        PlanError::Model(_) | PlanError::MalformedModelOutput { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let message = err.to_string();
    let raw = match err {
        PlanError::MalformedModelOutput { raw } => Some(raw),
        _ => None,
    };

    (status, Json(ApiError { message, raw }))
}
