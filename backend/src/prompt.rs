//! Prompt construction for the itinerary model. Pure string building; the
//! JSON shape embedded here is the contract `parse::parse_itinerary` expects
//! back.

use shared::TripType;

pub fn build_prompt(trip_type: TripType, destination: &str, duration: u32) -> String {
    match trip_type {
        TripType::Cycling => build_cycling_prompt(destination, duration),
        TripType::Trekking => build_trekking_prompt(destination, duration),
    }
}

fn build_cycling_prompt(destination: &str, days: u32) -> String {
    format!(
        r#"You are a travel route planner. Plan a {days}-day cycling route in/near {destination}.

Requirements:
- Each day covers 30-70 km of cycling
- Route goes from city/town to city/town (consecutive days, continuous route)
- Provide REAL waypoints with accurate GPS coordinates on actual cycling roads
- Waypoints should follow real roads, not straight lines
- Include 4-6 waypoints per day along the route
- The route should be realistic and bikeable

Respond ONLY with valid JSON (no markdown, no explanation) in this exact format:
{{
  "destination": "{destination}",
  "tripType": "cycling",
  "durationDays": {days},
  "dailyRoutes": [
    {{
      "day": 1,
      "startLocation": "City A",
      "endLocation": "City B",
      "distance_km": 45,
      "description": "Brief route description",
      "waypoints": [
        {{"lat": 43.7696, "lng": 11.2558, "name": "City A"}},
        {{"lat": 43.75, "lng": 11.30, "name": "Intermediate point"}},
        {{"lat": 43.72, "lng": 11.35, "name": "City B"}}
      ]
    }}
  ]
}}"#
    )
}

fn build_trekking_prompt(destination: &str, num_routes: u32) -> String {
    format!(
        r#"You are a travel route planner. Plan {num_routes} circular trekking route(s) in/near {destination}.

Requirements:
- Each route is 5-10 km long
- Each route STARTS and ENDS at the same point (circular/loop)
- Provide REAL waypoints with accurate GPS coordinates on actual hiking trails
- Waypoints should follow real trails/paths, not straight lines
- Include 5-8 waypoints per route forming a loop
- The first and last waypoint must be the same location
- Routes should be realistic and hikeable

Respond ONLY with valid JSON (no markdown, no explanation) in this exact format:
{{
  "destination": "{destination}",
  "tripType": "trekking",
  "durationDays": {num_routes},
  "dailyRoutes": [
    {{
      "day": 1,
      "startLocation": "Trail Start",
      "endLocation": "Trail Start",
      "distance_km": 7,
      "description": "Brief route description",
      "waypoints": [
        {{"lat": 43.7696, "lng": 11.2558, "name": "Trail Start"}},
        {{"lat": 43.77, "lng": 11.26, "name": "Scenic Point"}},
        {{"lat": 43.7696, "lng": 11.2558, "name": "Trail Start"}}
      ]
    }}
  ]
}}"#
    )
}
