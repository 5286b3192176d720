use serde::{Deserialize, Serialize};

use crate::models::location::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[serde(alias = "PENDING")]
    Placed,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

/// Order snapshot as served by the order service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub status: OrderStatus,
    pub destination_lat: f64,
    pub destination_lng: f64,
    #[serde(default)]
    pub current_lat: Option<f64>,
    #[serde(default)]
    pub current_lng: Option<f64>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub shipping_address: String,
}

impl Order {
    pub fn destination(&self) -> GeoPoint {
        GeoPoint {
            lat: self.destination_lat,
            lng: self.destination_lng,
        }
    }

    /// Last courier position known to the order service, if tracking has begun.
    pub fn current_position(&self) -> Option<GeoPoint> {
        match (self.current_lat, self.current_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }

    pub fn is_in_transit(&self) -> bool {
        self.status == OrderStatus::Shipped
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
