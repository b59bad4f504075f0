use serde::{Deserialize, Serialize};

/// WGS84 coordinate pair. Route geometry travels the wire as `[lat, lng]`
/// arrays, so geometry fields use `[f64; 2]` rather than this struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// A named routing hint the language model places along a day's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Cycling,
    Trekking,
}

impl TripType {
    /// Travel profile token understood by the directions service.
    pub fn directions_profile(self) -> &'static str {
        match self {
            TripType::Cycling => "cycling-regular",
            TripType::Trekking => "foot-hiking",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripType::Cycling => "cycling",
            TripType::Trekking => "trekking",
        }
    }
}

/// One segment of an itinerary: a point-to-point cycling leg or a closed
/// trekking loop (start and end labels equal, first and last waypoint
/// coordinate-identical).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRoute {
    pub day: u32,
    pub start_location: String,
    pub end_location: String,
    #[serde(rename = "distance_km")]
    pub distance_km: f64,
    pub description: String,
    pub waypoints: Vec<Waypoint>,
    /// Road/trail-following polyline as `[lat, lng]` pairs. Empty when
    /// geometry enrichment failed or was skipped; the client then falls back
    /// to straight lines between waypoints.
    #[serde(default)]
    pub route_geometry: Vec<[f64; 2]>,
}

/// Full multi-day trip plan. Created transiently by the planner; gains a
/// persistent id and timestamp only when explicitly saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub destination: String,
    pub trip_type: TripType,
    pub duration_days: u32,
    pub daily_routes: Vec<DayRoute>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Client request for itinerary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub destination: String,
    pub trip_type: TripType,
    /// Days for cycling, loop-route count for trekking.
    pub duration_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherDay {
    pub date: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub description: String,
    pub icon: String,
    pub humidity: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location: String,
    pub days: Vec<WeatherDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    /// Raw model output, attached only to malformed-output failures so an
    /// operator can diagnose what the model actually returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw: None,
        }
    }
}
