use std::env;
use std::time::Duration;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::location::GeoPoint;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub order_service_url: String,
    pub directions_url: String,
    pub directions_api_key: String,
    pub pubsub_url: String,
    pub depot: GeoPoint,
    pub actor_id: Uuid,
    pub tracking: TrackingConfig,
}

/// Timing knobs shared by every tracking session.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub poll_interval: Duration,
    pub tick_interval: Duration,
    pub step_size: f64,
    pub reconnect_delay: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10_000),
            tick_interval: Duration::from_millis(300),
            step_size: 0.000_05,
            reconnect_delay: Duration::from_millis(5_000),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let step_size: f64 = parse_or_default("STEP_SIZE", 0.000_05)?;
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(AppError::Internal(format!(
                "invalid STEP_SIZE: {step_size} must be a positive number"
            )));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            order_service_url: string_or_default("ORDER_SERVICE_URL", "http://localhost:8084/api"),
            directions_url: string_or_default(
                "DIRECTIONS_URL",
                "https://maps.googleapis.com/maps/api/directions/json",
            ),
            directions_api_key: string_or_default("DIRECTIONS_API_KEY", ""),
            pubsub_url: string_or_default("PUBSUB_URL", "ws://localhost:8084/ws/websocket"),
            depot: GeoPoint {
                lat: parse_or_default("DEPOT_LAT", 46.770439)?,
                lng: parse_or_default("DEPOT_LNG", 23.591423)?,
            },
            actor_id: parse_or_default("ACTOR_ID", Uuid::nil())?,
            tracking: TrackingConfig {
                poll_interval: Duration::from_millis(parse_or_default("POLL_INTERVAL_MS", 10_000)?),
                tick_interval: Duration::from_millis(parse_or_default("TICK_INTERVAL_MS", 300)?),
                step_size,
                reconnect_delay: Duration::from_millis(parse_or_default(
                    "RECONNECT_DELAY_MS",
                    5_000,
                )?),
            },
        })
    }
}

fn string_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
