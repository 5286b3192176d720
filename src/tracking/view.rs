use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geo::haversine_km;
use crate::models::location::GeoPoint;
use crate::models::order::Order;
use crate::tracking::position::LivePosition;
use crate::tracking::simulator::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    RouteLoaded,
    Simulating,
    Delivered,
    Cancelled,
}

/// Everything a viewer of one tracking session can see.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub order_id: u64,
    pub phase: SessionPhase,
    pub order: Option<Order>,
    pub origin: Option<GeoPoint>,
    pub route: Vec<GeoPoint>,
    pub route_lookup_in_flight: bool,
    pub cursor: Option<Cursor>,
    pub live: LivePosition,
    pub remaining_km: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl TrackingView {
    pub fn new(order_id: u64) -> Self {
        Self {
            order_id,
            phase: SessionPhase::Idle,
            order: None,
            origin: None,
            route: Vec::new(),
            route_lookup_in_flight: false,
            cursor: None,
            live: LivePosition::default(),
            remaining_km: None,
            updated_at: Utc::now(),
        }
    }

    pub fn replace_order(&mut self, order: Order) {
        self.order = Some(order);
        self.touch();
    }

    pub fn apply_simulated(&mut self, seq: u64, point: GeoPoint) -> bool {
        let applied = self.live.apply_simulated(seq, point);
        if applied {
            self.touch();
        }
        applied
    }

    pub fn apply_subscribed(&mut self, point: GeoPoint) {
        self.live.apply_subscribed(point);
        self.touch();
    }

    fn touch(&mut self) {
        self.remaining_km = match (&self.live.current, &self.order) {
            (Some(position), Some(order)) => Some(haversine_km(position, &order.destination())),
            _ => None,
        };
        self.updated_at = Utc::now();
    }
}
