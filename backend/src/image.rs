//! Representative destination photo: Unsplash when a key is configured, a
//! deterministic picsum URL otherwise. This endpoint never 500s — the
//! fallback is always available.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::ApiError;

use crate::AppState;

const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashResponse {
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

/// GET /api/image?query
pub async fn image_handler(
    State(state): State<AppState>,
    Query(params): Query<ImageQuery>,
) -> Result<Json<ImageResponse>, (StatusCode, Json<ApiError>)> {
    let query = params.query.filter(|q| !q.trim().is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        Json(ApiError::new("missing search query")),
    ))?;

    if let Some(key) = state.config.unsplash_access_key.as_deref() {
        if let Some(url) = search_unsplash(&state.http, key, &query).await {
            return Ok(Json(ImageResponse { url }));
        }
    }

    Ok(Json(ImageResponse {
        url: fallback_image(&query),
    }))
}

async fn search_unsplash(http: &reqwest::Client, key: &str, query: &str) -> Option<String> {
    let response = http
        .get(UNSPLASH_SEARCH_URL)
        .header("Authorization", format!("Client-ID {key}"))
        .query(&[
            ("query", query),
            ("orientation", "landscape"),
            ("per_page", "1"),
        ])
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        tracing::debug!("image search returned {}", response.status());
        return None;
    }

    let parsed: UnsplashResponse = response.json().await.ok()?;
    parsed.results.into_iter().next().map(|photo| photo.urls.regular)
}

/// Stable placeholder keyed by the query so repeated lookups for the same
/// destination render the same photo.
fn fallback_image(query: &str) -> String {
    let seed: String = query
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let seed = if seed.is_empty() { "travel" } else { &seed };
    format!("https://picsum.photos/seed/{seed}/1200/600")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(fallback_image("Tuscany"), fallback_image("Tuscany"));
    }

    #[test]
    fn fallback_strips_non_alphanumerics() {
        assert_eq!(
            fallback_image("New York!"),
            "https://picsum.photos/seed/NewYork/1200/600"
        );
    }

    #[test]
    fn fallback_never_produces_an_empty_seed() {
        assert_eq!(
            fallback_image("!!!"),
            "https://picsum.photos/seed/travel/1200/600"
        );
    }
}
