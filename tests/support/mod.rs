#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use order_tracker::clients::directions::{DirectionsError, DirectionsProvider};
use order_tracker::clients::order_service::{OrderService, ServiceError};
use order_tracker::config::TrackingConfig;
use order_tracker::models::location::{GeoPoint, LocationEvent};
use order_tracker::models::order::{Order, OrderStatus};
use order_tracker::observability::metrics::Metrics;
use order_tracker::pubsub::{FeedError, LocationFeed, LocationStream};
use order_tracker::tracking::session::TrackingContext;
use reqwest::StatusCode;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

pub const DEPOT: GeoPoint = GeoPoint {
    lat: 46.770439,
    lng: 23.591423,
};

pub fn shipped_order(id: u64) -> Order {
    Order {
        id,
        status: OrderStatus::Shipped,
        destination_lat: 46.7743731,
        destination_lng: 23.6120002,
        current_lat: None,
        current_lng: None,
        total_amount: 89.9,
        shipping_address: "Strada Memorandumului 28, Cluj-Napoca".to_string(),
    }
}

/// Three waypoints, about 0.002 degrees end to end.
pub fn short_route() -> Vec<GeoPoint> {
    vec![
        DEPOT,
        GeoPoint {
            lat: 46.7710,
            lng: 23.5920,
        },
        GeoPoint {
            lat: 46.7720,
            lng: 23.5930,
        },
    ]
}

/// Long enough that a few seconds of ticks cannot finish it.
pub fn long_route() -> Vec<GeoPoint> {
    vec![
        DEPOT,
        GeoPoint {
            lat: 46.8704,
            lng: 23.6914,
        },
    ]
}

#[derive(Default)]
pub struct FakeOrderService {
    pub orders: Mutex<HashMap<u64, Order>>,
    pub fetches: AtomicUsize,
    pub deliver_on_fetch: Mutex<Option<usize>>,
    pub fail_fetch: AtomicBool,
    pub fail_reports: AtomicBool,
    pub fail_status: AtomicBool,
    pub status_delay: Mutex<Option<Duration>>,
    pub reports: Mutex<Vec<(u64, GeoPoint)>>,
    pub status_updates: Mutex<Vec<(u64, OrderStatus, Uuid)>>,
}

impl FakeOrderService {
    pub fn with_order(order: Order) -> Arc<Self> {
        let service = Self::default();
        service.orders.lock().unwrap().insert(order.id, order);
        Arc::new(service)
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn status_updates(&self) -> Vec<(u64, OrderStatus, Uuid)> {
        self.status_updates.lock().unwrap().clone()
    }

    fn failure(path: String) -> ServiceError {
        ServiceError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            path,
        }
    }
}

#[async_trait]
impl OrderService for FakeOrderService {
    async fn fetch_order(&self, order_id: u64) -> Result<Order, ServiceError> {
        let count = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::failure(format!("/orders/details/{order_id}")));
        }

        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(ServiceError::Status {
            status: StatusCode::NOT_FOUND,
            path: format!("/orders/details/{order_id}"),
        })?;

        if *self.deliver_on_fetch.lock().unwrap() == Some(count) {
            order.status = OrderStatus::Delivered;
        }
        Ok(order.clone())
    }

    async fn update_status(
        &self,
        order_id: u64,
        status: OrderStatus,
        actor_id: Uuid,
    ) -> Result<Order, ServiceError> {
        let delay = *self.status_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        self.status_updates
            .lock()
            .unwrap()
            .push((order_id, status, actor_id));
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Self::failure(format!("/orders/{order_id}/status")));
        }

        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(ServiceError::Status {
            status: StatusCode::NOT_FOUND,
            path: format!("/orders/{order_id}/status"),
        })?;
        order.status = status;
        Ok(order.clone())
    }

    async fn report_location(&self, order_id: u64, point: GeoPoint) -> Result<(), ServiceError> {
        self.reports.lock().unwrap().push((order_id, point));
        if self.fail_reports.load(Ordering::SeqCst) {
            return Err(Self::failure(format!("/orders/{order_id}/location")));
        }
        Ok(())
    }
}

pub struct FakeDirections {
    pub route: Mutex<Result<Vec<GeoPoint>, String>>,
    pub calls: AtomicUsize,
    pub origins: Mutex<Vec<GeoPoint>>,
    pub delay: Mutex<Option<Duration>>,
}

impl FakeDirections {
    pub fn returning(route: Vec<GeoPoint>) -> Arc<Self> {
        Arc::new(Self {
            route: Mutex::new(Ok(route)),
            calls: AtomicUsize::new(0),
            origins: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        })
    }

    pub fn failing(status: &str) -> Arc<Self> {
        Arc::new(Self {
            route: Mutex::new(Err(status.to_string())),
            calls: AtomicUsize::new(0),
            origins: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectionsProvider for FakeDirections {
    async fn driving_route(
        &self,
        origin: GeoPoint,
        _destination: GeoPoint,
    ) -> Result<Vec<GeoPoint>, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.origins.lock().unwrap().push(origin);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        self.route
            .lock()
            .unwrap()
            .clone()
            .map_err(DirectionsError::Rejected)
    }
}

pub struct FakeFeed {
    pub events: broadcast::Sender<LocationEvent>,
    pub subscriptions: AtomicUsize,
}

impl FakeFeed {
    pub fn new() -> Arc<Self> {
        let (events, _unused_rx) = broadcast::channel(64);
        Arc::new(Self {
            events,
            subscriptions: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LocationFeed for FakeFeed {
    async fn subscribe(&self, _order_id: u64) -> Result<LocationStream, FeedError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let stream = BroadcastStream::new(self.events.subscribe())
            .filter_map(|event| async move { event.ok().map(Ok::<LocationEvent, FeedError>) });
        Ok(Box::pin(stream))
    }
}

pub struct Harness {
    pub ctx: TrackingContext,
    pub orders: Arc<FakeOrderService>,
    pub directions: Arc<FakeDirections>,
    pub feed: Arc<FakeFeed>,
}

pub const ACTOR: Uuid = Uuid::from_u128(0x3273c1b2_b42e_4449_a6f1_a81b53facf08);

pub fn tracking_config() -> TrackingConfig {
    TrackingConfig {
        poll_interval: Duration::from_secs(10),
        tick_interval: Duration::from_millis(300),
        step_size: 0.000_05,
        reconnect_delay: Duration::from_secs(5),
    }
}

pub fn harness(orders: Arc<FakeOrderService>, directions: Arc<FakeDirections>) -> Harness {
    let feed = FakeFeed::new();
    let ctx = TrackingContext {
        orders: orders.clone(),
        directions: directions.clone(),
        feed: feed.clone(),
        metrics: Metrics::new(),
        config: tracking_config(),
        depot: DEPOT,
        actor_id: ACTOR,
    };

    Harness {
        ctx,
        orders,
        directions,
        feed,
    }
}
