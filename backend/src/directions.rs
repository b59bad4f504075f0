// Geometry enrichment against the openrouteservice directions API.
// Best-effort by contract: every failure path collapses to an empty polyline
// and the day falls back to straight lines between its waypoints.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shared::Waypoint;

const ORS_BASE_URL: &str = "https://api.openrouteservice.org/v2/directions";

/// Seam between the planner and the directions service, so tests can stub
/// enrichment per day.
#[async_trait]
pub trait Directions: Send + Sync {
    /// Trace the real-world route through `waypoints` for the given travel
    /// profile. Returns `[lat, lng]` pairs, or an empty vec when enrichment
    /// is impossible (fewer than two waypoints, no API key, transport error,
    /// non-success status, or no usable geometry in the reply).
    async fn route_geometry(&self, waypoints: &[Waypoint], profile: &str) -> Vec<[f64; 2]>;
}

#[derive(Deserialize)]
struct GeoJsonResponse {
    features: Vec<GeoJsonFeature>,
}

#[derive(Deserialize)]
struct GeoJsonFeature {
    geometry: GeoJsonGeometry,
}

#[derive(Deserialize)]
struct GeoJsonGeometry {
    /// ORS emits `[lng, lat]` or `[lng, lat, ele]` positions.
    coordinates: Vec<Vec<f64>>,
}

pub struct OrsDirections {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl OrsDirections {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    async fn fetch(&self, waypoints: &[Waypoint], profile: &str) -> Option<Vec<[f64; 2]>> {
        let api_key = self.api_key.as_deref()?;
        // ORS expects [lng, lat] pairs.
        let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|wp| [wp.lng, wp.lat]).collect();

        let response = self
            .http
            .post(format!("{ORS_BASE_URL}/{profile}/geojson"))
            .header("Authorization", api_key)
            .json(&json!({ "coordinates": coordinates }))
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!("directions service returned {}", response.status());
            return None;
        }

        let parsed: GeoJsonResponse = response.json().await.ok()?;
        let line = parsed.features.into_iter().next()?.geometry.coordinates;

        // Back to [lat, lng] for the client.
        Some(flip_positions(&line))
    }
}

fn flip_positions(line: &[Vec<f64>]) -> Vec<[f64; 2]> {
    line.iter()
        .filter_map(|position| match position.as_slice() {
            [lng, lat, ..] => Some([*lat, *lng]),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl Directions for OrsDirections {
    async fn route_geometry(&self, waypoints: &[Waypoint], profile: &str) -> Vec<[f64; 2]> {
        if waypoints.len() < 2 {
            return Vec::new();
        }

        match self.fetch(waypoints, profile).await {
            Some(geometry) => geometry,
            None => {
                tracing::debug!(
                    "geometry enrichment unavailable for {} waypoints ({profile})",
                    waypoints.len()
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(lat: f64, lng: f64) -> Waypoint {
        Waypoint {
            lat,
            lng,
            name: "wp".to_string(),
        }
    }

    #[tokio::test]
    async fn too_few_waypoints_short_circuit_to_empty() {
        let client = OrsDirections::new(reqwest::Client::new(), Some("key".to_string()));
        let geometry = client
            .route_geometry(&[waypoint(43.7, 11.2)], "cycling-regular")
            .await;
        assert!(geometry.is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_yields_empty_without_network() {
        let client = OrsDirections::new(reqwest::Client::new(), None);
        let geometry = client
            .route_geometry(
                &[waypoint(43.7, 11.2), waypoint(43.5, 11.3)],
                "foot-hiking",
            )
            .await;
        assert!(geometry.is_empty());
    }

    #[test]
    fn geojson_positions_flip_to_lat_lng() {
        let body = r#"{
            "features": [
                {"geometry": {"coordinates": [[11.2558, 43.7696], [11.30, 43.75, 210.0]]}}
            ]
        }"#;
        let parsed: GeoJsonResponse = serde_json::from_str(body).unwrap();
        let flipped = flip_positions(&parsed.features[0].geometry.coordinates);
        assert_eq!(flipped[0], [43.7696, 11.2558]);
        assert_eq!(flipped[1], [43.75, 11.30]);
    }
}
