use std::{net::SocketAddr, sync::Arc};

use backend::{
    config::Config, database::Database, directions::OrsDirections, llm::OpenAiChat,
    planner::TripPlanner, AppState, create_router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("load configuration");

    let db = Database::new(&config.database_url)
        .await
        .expect("connect to PostgreSQL");
    db.migrate().await.expect("run database migrations");

    let http = reqwest::Client::new();
    let planner = TripPlanner::new(
        Arc::new(OpenAiChat::new(http.clone(), config.openai_api_key.clone())),
        Arc::new(OrsDirections::new(http.clone(), config.ors_api_key.clone())),
    );

    let addr: SocketAddr = config.bind_addr.parse().expect("valid socket address");
    let state = AppState {
        db: Arc::new(db),
        planner: Arc::new(planner),
        http,
        config: Arc::new(config),
    };
    let app = create_router(state);

    tracing::info!("starting backend on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}
