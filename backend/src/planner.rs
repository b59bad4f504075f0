//! End-to-end itinerary assembly: prompt → model → parse → per-day geometry
//! enrichment → attach owner. One attempt per invocation, no retries and no
//! persistence; saving is a separate, explicit action by the caller.

use std::sync::Arc;

use futures::future::join_all;
use shared::{DayRoute, GenerateRequest, Itinerary};

use crate::directions::Directions;
use crate::error::PlanError;
use crate::llm::{ChatModel, LlmError};
use crate::parse::parse_itinerary;
use crate::prompt::build_prompt;

pub struct TripPlanner {
    model: Arc<dyn ChatModel>,
    directions: Arc<dyn Directions>,
}

impl TripPlanner {
    pub fn new(model: Arc<dyn ChatModel>, directions: Arc<dyn Directions>) -> Self {
        Self { model, directions }
    }

    /// Generate a complete itinerary for `req`, owned by `user_id`.
    ///
    /// # Errors
    /// - `MissingInput` when destination or duration is absent (no network
    ///   calls have been made at that point)
    /// - `Model` when the completion service fails or returns nothing
    /// - `MalformedModelOutput` when the reply is not the expected JSON
    ///
    /// Geometry-enrichment failures are not errors: the affected day keeps an
    /// empty polyline while the other days are unaffected.
    pub async fn plan(&self, req: &GenerateRequest, user_id: &str) -> Result<Itinerary, PlanError> {
        if req.destination.trim().is_empty() {
            return Err(PlanError::MissingInput("destination"));
        }
        if req.duration_days == 0 {
            return Err(PlanError::MissingInput("durationDays"));
        }

        let prompt = build_prompt(req.trip_type, &req.destination, req.duration_days);
        let content = self.model.complete(&prompt).await?;
        if content.trim().is_empty() {
            return Err(PlanError::Model(LlmError::EmptyCompletion));
        }

        let mut itinerary = parse_itinerary(&content)?;

        // Fan out one enrichment per day, join on all of them. Days share no
        // state, so a failed lookup only empties that day's polyline.
        let profile = req.trip_type.directions_profile();
        let enriched = join_all(
            itinerary
                .daily_routes
                .into_iter()
                .map(|day| self.enrich_day(day, profile)),
        )
        .await;

        itinerary.daily_routes = enriched;
        itinerary.user_id = user_id.to_string();

        tracing::info!(
            "planned {} itinerary for {:?}: {} day(s)",
            req.trip_type.as_str(),
            req.destination,
            itinerary.daily_routes.len()
        );

        Ok(itinerary)
    }

    async fn enrich_day(&self, mut day: DayRoute, profile: &str) -> DayRoute {
        day.route_geometry = self.directions.route_geometry(&day.waypoints, profile).await;
        day
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use shared::{TripType, Waypoint};

    use super::*;

    struct CannedModel {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl CannedModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| LlmError::EmptyCompletion)
        }
    }

    /// Returns a fixed polyline, except for days whose first waypoint name is
    /// listed in `fail_for`, which degrade to empty geometry.
    struct StubDirections {
        fail_for: Vec<String>,
        calls: AtomicUsize,
    }

    impl StubDirections {
        fn succeeding() -> Self {
            Self {
                fail_for: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_for(name: &str) -> Self {
            Self {
                fail_for: vec![name.to_string()],
                calls: AtomicUsize::new(0),
            }
        }

        fn always_failing() -> Self {
            Self {
                fail_for: vec!["*".to_string()],
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Directions for StubDirections {
        async fn route_geometry(&self, waypoints: &[Waypoint], _profile: &str) -> Vec<[f64; 2]> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let first = waypoints.first().map(|wp| wp.name.as_str()).unwrap_or("");
            let fails = self
                .fail_for
                .iter()
                .any(|name| name == "*" || name == first);
            if fails {
                Vec::new()
            } else {
                vec![[43.7696, 11.2558], [43.75, 11.30], [43.72, 11.35]]
            }
        }
    }

    fn cycling_day(day: u32, start: &str, end: &str) -> serde_json::Value {
        serde_json::json!({
            "day": day,
            "startLocation": start,
            "endLocation": end,
            "distance_km": 48,
            "description": "test leg",
            "waypoints": [
                {"lat": 43.7696, "lng": 11.2558, "name": start},
                {"lat": 43.70, "lng": 11.30, "name": "Midpoint"},
                {"lat": 43.60, "lng": 11.33, "name": "Climb"},
                {"lat": 43.3188, "lng": 11.3308, "name": end}
            ]
        })
    }

    fn two_day_reply() -> String {
        serde_json::json!({
            "destination": "Tuscany",
            "tripType": "cycling",
            "durationDays": 2,
            "dailyRoutes": [
                cycling_day(1, "Florence", "Siena"),
                cycling_day(2, "Siena", "Montepulciano")
            ]
        })
        .to_string()
    }

    fn trekking_reply(routes: usize) -> String {
        let days: Vec<_> = (1..=routes)
            .map(|day| {
                serde_json::json!({
                    "day": day,
                    "startLocation": "Trailhead",
                    "endLocation": "Trailhead",
                    "distance_km": 7.5,
                    "description": "loop",
                    "waypoints": [
                        {"lat": 46.41, "lng": 11.84, "name": "Trailhead"},
                        {"lat": 46.42, "lng": 11.86, "name": "Ridge"},
                        {"lat": 46.43, "lng": 11.85, "name": "Lake"},
                        {"lat": 46.42, "lng": 11.83, "name": "Saddle"},
                        {"lat": 46.41, "lng": 11.84, "name": "Trailhead"}
                    ]
                })
            })
            .collect();
        serde_json::json!({
            "destination": "Dolomites",
            "tripType": "trekking",
            "durationDays": routes,
            "dailyRoutes": days
        })
        .to_string()
    }

    fn request(trip_type: TripType, destination: &str, duration: u32) -> GenerateRequest {
        GenerateRequest {
            destination: destination.to_string(),
            trip_type,
            duration_days: duration,
        }
    }

    fn planner(model: CannedModel, directions: StubDirections) -> TripPlanner {
        TripPlanner::new(Arc::new(model), Arc::new(directions))
    }

    #[tokio::test]
    async fn blank_destination_fails_before_any_call() {
        let model = Arc::new(CannedModel::replying(&two_day_reply()));
        let directions = Arc::new(StubDirections::succeeding());
        let planner = TripPlanner::new(model.clone(), directions.clone());

        let result = planner
            .plan(&request(TripType::Cycling, "   ", 2), "user-1")
            .await;

        assert!(matches!(result, Err(PlanError::MissingInput("destination"))));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(directions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_duration_is_a_client_error() {
        let planner = planner(
            CannedModel::replying(&two_day_reply()),
            StubDirections::succeeding(),
        );
        let result = planner
            .plan(&request(TripType::Cycling, "Tuscany", 0), "user-1")
            .await;
        assert!(matches!(result, Err(PlanError::MissingInput("durationDays"))));
    }

    #[tokio::test]
    async fn cycling_plan_keeps_day_count_and_distance_range() {
        for days in [2u32, 3] {
            let reply = match days {
                2 => two_day_reply(),
                _ => serde_json::json!({
                    "destination": "Tuscany",
                    "tripType": "cycling",
                    "durationDays": 3,
                    "dailyRoutes": [
                        cycling_day(1, "Florence", "Siena"),
                        cycling_day(2, "Siena", "Montepulciano"),
                        cycling_day(3, "Montepulciano", "Pienza")
                    ]
                })
                .to_string(),
            };
            let planner = planner(CannedModel::replying(&reply), StubDirections::succeeding());
            let itinerary = planner
                .plan(&request(TripType::Cycling, "Tuscany", days), "user-1")
                .await
                .expect("plan");

            assert_eq!(itinerary.daily_routes.len(), days as usize);
            for day in &itinerary.daily_routes {
                assert!((30.0..=70.0).contains(&day.distance_km));
            }
        }
    }

    #[tokio::test]
    async fn trekking_days_are_closed_loops() {
        for routes in [1usize, 2, 3] {
            let planner = planner(
                CannedModel::replying(&trekking_reply(routes)),
                StubDirections::succeeding(),
            );
            let itinerary = planner
                .plan(
                    &request(TripType::Trekking, "Dolomites", routes as u32),
                    "user-1",
                )
                .await
                .expect("plan");

            assert_eq!(itinerary.daily_routes.len(), routes);
            for day in &itinerary.daily_routes {
                let first = day.waypoints.first().expect("waypoints");
                let last = day.waypoints.last().expect("waypoints");
                assert_eq!((first.lat, first.lng), (last.lat, last.lng));
            }
        }
    }

    #[tokio::test]
    async fn model_failure_skips_enrichment_entirely() {
        let directions = Arc::new(StubDirections::succeeding());
        let planner = TripPlanner::new(Arc::new(CannedModel::failing()), directions.clone());

        let result = planner
            .plan(&request(TripType::Cycling, "Tuscany", 2), "user-1")
            .await;

        assert!(matches!(result, Err(PlanError::Model(_))));
        assert_eq!(directions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unparseable_reply_carries_raw_text() {
        let planner = planner(
            CannedModel::replying("here is your route: Florence to Siena"),
            StubDirections::succeeding(),
        );
        let result = planner
            .plan(&request(TripType::Cycling, "Tuscany", 2), "user-1")
            .await;
        match result {
            Err(PlanError::MalformedModelOutput { raw }) => {
                assert!(raw.contains("Florence to Siena"));
            }
            other => panic!("expected MalformedModelOutput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_failed_day_does_not_touch_the_others() {
        let planner = planner(
            CannedModel::replying(&two_day_reply()),
            StubDirections::failing_for("Siena"),
        );
        let itinerary = planner
            .plan(&request(TripType::Cycling, "Tuscany", 2), "user-1")
            .await
            .expect("plan");

        assert_eq!(itinerary.daily_routes.len(), 2);
        assert!(!itinerary.daily_routes[0].route_geometry.is_empty());
        assert!(itinerary.daily_routes[1].route_geometry.is_empty());
    }

    #[tokio::test]
    async fn tuscany_two_days_with_geometry() {
        let planner = planner(
            CannedModel::replying(&two_day_reply()),
            StubDirections::succeeding(),
        );
        let itinerary = planner
            .plan(&request(TripType::Cycling, "Tuscany", 2), "user-7")
            .await
            .expect("plan");

        assert_eq!(itinerary.daily_routes.len(), 2);
        assert!(itinerary
            .daily_routes
            .iter()
            .all(|day| !day.route_geometry.is_empty()));
        assert_eq!(itinerary.user_id, "user-7");
    }

    #[tokio::test]
    async fn tuscany_two_days_survives_total_enrichment_outage() {
        let planner = planner(
            CannedModel::replying(&two_day_reply()),
            StubDirections::always_failing(),
        );
        let itinerary = planner
            .plan(&request(TripType::Cycling, "Tuscany", 2), "user-7")
            .await
            .expect("plan despite directions outage");

        assert_eq!(itinerary.daily_routes.len(), 2);
        assert!(itinerary
            .daily_routes
            .iter()
            .all(|day| day.route_geometry.is_empty()));
    }

    #[tokio::test]
    async fn empty_model_reply_is_an_upstream_failure() {
        let planner = planner(CannedModel::replying("   "), StubDirections::succeeding());
        let result = planner
            .plan(&request(TripType::Cycling, "Tuscany", 2), "user-1")
            .await;
        assert!(matches!(
            result,
            Err(PlanError::Model(LlmError::EmptyCompletion))
        ));
    }
}
