use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::geo::polyline::{self, PolylineError};
use crate::models::location::GeoPoint;

#[derive(Debug, Error)]
pub enum DirectionsError {
    #[error("directions request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("directions provider returned status {0}")]
    Rejected(String),

    #[error("directions provider returned no routes")]
    NoRoute,

    #[error("malformed route geometry: {0}")]
    Geometry(#[from] PolylineError),
}

/// Source of driving routes between two points.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn driving_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<Vec<GeoPoint>, DirectionsError>;
}

/// Client for the Google Directions JSON endpoint.
pub struct GoogleDirections {
    client: Client,
    url: String,
    api_key: String,
}

impl GoogleDirections {
    pub fn new(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    overview_polyline: EncodedPolyline,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

fn format_point(point: &GeoPoint) -> String {
    format!("{},{}", point.lat, point.lng)
}

#[async_trait]
impl DirectionsProvider for GoogleDirections {
    async fn driving_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<Vec<GeoPoint>, DirectionsError> {
        let response: DirectionsResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("origin", format_point(&origin)),
                ("destination", format_point(&destination)),
                ("mode", "driving".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(DirectionsError::Rejected(response.status));
        }

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(DirectionsError::NoRoute)?;

        Ok(polyline::decode(&route.overview_polyline.points)?)
    }
}
