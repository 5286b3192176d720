use std::sync::Arc;

use order_tracker::api;
use order_tracker::clients::directions::GoogleDirections;
use order_tracker::clients::order_service::HttpOrderService;
use order_tracker::config::Config;
use order_tracker::error::AppError;
use order_tracker::observability::metrics::Metrics;
use order_tracker::pubsub::stomp::StompFeed;
use order_tracker::state::AppState;
use order_tracker::tracking::session::TrackingContext;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let http = reqwest::Client::builder()
        .build()
        .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

    let feed = StompFeed::new(config.pubsub_url.clone())
        .map_err(|err| AppError::Internal(err.to_string()))?;

    let tracking = TrackingContext {
        orders: Arc::new(HttpOrderService::new(
            http.clone(),
            config.order_service_url.clone(),
        )),
        directions: Arc::new(GoogleDirections::new(
            http,
            config.directions_url.clone(),
            config.directions_api_key.clone(),
        )),
        feed: Arc::new(feed),
        metrics: Metrics::new(),
        config: config.tracking.clone(),
        depot: config.depot,
        actor_id: config.actor_id,
    };

    if config.actor_id.is_nil() {
        tracing::warn!("ACTOR_ID is not set; delivery updates will carry the nil identity");
    }

    let shared_state = Arc::new(AppState::new(tracking));
    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        order_service = %config.order_service_url,
        pubsub = %config.pubsub_url,
        "order tracker started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    shared_state.close_all();
    tracing::info!("all tracking sessions closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
