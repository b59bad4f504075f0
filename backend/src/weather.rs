//! Proxy over the OpenWeather 5-day/3-hour forecast. The 3-hourly slots are
//! folded into per-date aggregates and trimmed to the next three days.
//! Decorative by contract: a failure here never affects itinerary
//! generation, the UI simply renders without a forecast.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{ApiError, WeatherDay, WeatherForecast};
use std::collections::BTreeMap;

use crate::AppState;

const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
const FORECAST_DAYS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    main: SlotMain,
    weather: Vec<SlotWeather>,
    wind: SlotWind,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct SlotMain {
    temp_min: f64,
    temp_max: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct SlotWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct SlotWind {
    speed: f64,
}

/// GET /api/weather?lat&lng&location
pub async fn forecast_handler(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherForecast>, (StatusCode, Json<ApiError>)> {
    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("missing coordinates")),
        ));
    };

    let api_key = state.config.openweather_api_key.as_deref().ok_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("weather API key not configured")),
    ))?;

    let upstream_error = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new("failed to fetch weather forecast")),
        )
    };

    let response = state
        .http
        .get(FORECAST_URL)
        .query(&[
            ("lat", lat.to_string()),
            ("lon", lng.to_string()),
            ("appid", api_key.to_string()),
            ("units", "metric".to_string()),
        ])
        .send()
        .await
        .map_err(|err| {
            tracing::warn!("weather request failed: {err}");
            upstream_error()
        })?;

    if !response.status().is_success() {
        tracing::warn!("weather service returned {}", response.status());
        return Err(upstream_error());
    }

    let forecast: ForecastResponse = response.json().await.map_err(|err| {
        tracing::warn!("weather response failed to decode: {err}");
        upstream_error()
    })?;

    let today = chrono::Utc::now().date_naive();
    let days = fold_forecast(forecast.list, today);

    Ok(Json(WeatherForecast {
        location: query.location.unwrap_or_else(|| "Unknown".to_string()),
        days,
    }))
}

/// Fold 3-hourly slots into one aggregate per calendar date: min/max over all
/// slots, remaining fields from the first slot of the date. Only dates after
/// `today` are kept, capped at [`FORECAST_DAYS`].
fn fold_forecast(slots: Vec<ForecastSlot>, today: NaiveDate) -> Vec<WeatherDay> {
    let mut daily: BTreeMap<NaiveDate, WeatherDay> = BTreeMap::new();

    for slot in slots {
        let Some(date) = slot
            .dt_txt
            .split(' ')
            .next()
            .and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if date <= today {
            continue;
        }

        match daily.get_mut(&date) {
            Some(existing) => {
                existing.temp_min = existing.temp_min.min(slot.main.temp_min);
                existing.temp_max = existing.temp_max.max(slot.main.temp_max);
            }
            None => {
                let (description, icon) = slot
                    .weather
                    .first()
                    .map(|w| (w.description.clone(), w.icon.clone()))
                    .unwrap_or_default();
                daily.insert(
                    date,
                    WeatherDay {
                        date: date.format("%a %-d %b").to_string(),
                        temp_min: slot.main.temp_min,
                        temp_max: slot.main.temp_max,
                        description,
                        icon,
                        humidity: slot.main.humidity,
                        wind_speed: slot.wind.speed,
                    },
                );
            }
        }
    }

    daily.into_values().take(FORECAST_DAYS).collect()
}
