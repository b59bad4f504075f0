// Handlers for the saved-routes API. Every operation runs as the
// authenticated owner; a route belonging to someone else is indistinguishable
// from a missing one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{ApiError, Itinerary};
use uuid::Uuid;

use crate::database::{DatabaseError, SavedRoute};
use crate::AppState;

use crate::auth::AuthUser;

/// POST /api/routes - Persist a generated itinerary
pub async fn save_route(
    State(state): State<AppState>,
    user: AuthUser,
    Json(itinerary): Json<Itinerary>,
) -> Result<(StatusCode, Json<SavedRoute>), (StatusCode, Json<ApiError>)> {
    state
        .db
        .save_route(user.user_id, &itinerary)
        .await
        .map(|saved| (StatusCode::CREATED, Json(saved)))
        .map_err(db_error_to_api_error)
}

/// GET /api/routes - List the caller's saved routes, newest first
pub async fn list_routes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SavedRoute>>, (StatusCode, Json<ApiError>)> {
    state
        .db
        .list_routes(user.user_id)
        .await
        .map(Json)
        .map_err(db_error_to_api_error)
}

/// DELETE /api/routes/:id - Delete one of the caller's routes
pub async fn delete_route(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    state
        .db
        .delete_route(user.user_id, id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(db_error_to_api_error)
}

fn db_error_to_api_error(err: DatabaseError) -> (StatusCode, Json<ApiError>) {
    let (status, message) = match err {
        DatabaseError::RouteNotFound(id) => {
            (StatusCode::NOT_FOUND, format!("route {id} not found"))
        }
        DatabaseError::EmailTaken => (
            StatusCode::CONFLICT,
            "a user with this email already exists".to_string(),
        ),
        DatabaseError::InvalidData(msg) => (StatusCode::BAD_REQUEST, msg),
        DatabaseError::Connection(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("database connection error: {e}"),
        ),
    };

    (status, Json(ApiError::new(message)))
}
