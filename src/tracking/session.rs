use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clients::directions::{DirectionsError, DirectionsProvider};
use crate::clients::order_service::{OrderService, ServiceError};
use crate::config::TrackingConfig;
use crate::models::location::GeoPoint;
use crate::models::order::OrderStatus;
use crate::observability::metrics::Metrics;
use crate::pubsub::LocationFeed;
use crate::tracking::poller::run_order_poller;
use crate::tracking::simulator::{RouteSimulator, Tick};
use crate::tracking::subscriber::run_location_subscriber;
use crate::tracking::view::{SessionPhase, TrackingView};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {phase:?}")]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },

    #[error("a route lookup is already in flight")]
    LookupInFlight,

    #[error("route has no waypoints")]
    EmptyRoute,

    #[error("order {0} is not in transit")]
    NotInTransit(u64),

    #[error("order {0} has not been loaded")]
    NoOrder(u64),

    #[error(transparent)]
    Directions(#[from] DirectionsError),
}

/// Collaborators and settings shared by every session.
#[derive(Clone)]
pub struct TrackingContext {
    pub orders: Arc<dyn OrderService>,
    pub directions: Arc<dyn DirectionsProvider>,
    pub feed: Arc<dyn LocationFeed>,
    pub metrics: Metrics,
    pub config: TrackingConfig,
    pub depot: GeoPoint,
    pub actor_id: Uuid,
}

/// One order's tracking session.
///
/// Owns the view channel and every task working on the order. Dropping the
/// session ends it: the phase moves to `cancelled` (unless already delivered)
/// and the timer, poller and subscriber are aborted together.
pub struct TrackingSession {
    order_id: u64,
    view: Arc<watch::Sender<TrackingView>>,
    poller: Option<JoinHandle<()>>,
    subscriber: Option<JoinHandle<()>>,
    simulation: Option<JoinHandle<()>>,
    metrics: Metrics,
}

impl TrackingSession {
    /// Loads the order and starts the poller and location subscriber.
    pub async fn open(ctx: &TrackingContext, order_id: u64) -> Result<Self, ServiceError> {
        let order = match ctx.orders.fetch_order(order_id).await {
            Ok(order) => {
                ctx.metrics.order_fetches_total.with_label_values(&["success"]).inc();
                order
            }
            Err(err) => {
                ctx.metrics.order_fetches_total.with_label_values(&["error"]).inc();
                warn!(order_id, error = %err, "initial order fetch failed; session not opened");
                return Err(err);
            }
        };

        let mut initial = TrackingView::new(order_id);
        initial.replace_order(order);
        let (view, _unused_rx) = watch::channel(initial);
        let view = Arc::new(view);

        let poller = tokio::spawn(run_order_poller(
            ctx.orders.clone(),
            order_id,
            ctx.config.poll_interval,
            view.clone(),
            ctx.metrics.clone(),
        ));
        let subscriber = tokio::spawn(run_location_subscriber(
            ctx.feed.clone(),
            order_id,
            ctx.config.reconnect_delay,
            view.clone(),
            ctx.metrics.clone(),
        ));

        ctx.metrics.active_sessions.inc();
        info!(order_id, "tracking session opened");

        Ok(Self {
            order_id,
            view,
            poller: Some(poller),
            subscriber: Some(subscriber),
            simulation: None,
            metrics: ctx.metrics.clone(),
        })
    }

    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    pub fn view(&self) -> Arc<watch::Sender<TrackingView>> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> TrackingView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<TrackingView> {
        self.view.subscribe()
    }

    /// Moves `route_loaded → simulating` and starts the tick timer.
    ///
    /// Refused unless a non-empty route is loaded and the order is shipped.
    pub fn start_simulation(
        &mut self,
        ctx: &TrackingContext,
        actor_id: Uuid,
    ) -> Result<(), SessionError> {
        let order_id = self.order_id;
        let mut outcome = Err(SessionError::NoOrder(order_id));

        self.view.send_if_modified(|view| {
            if view.phase != SessionPhase::RouteLoaded {
                outcome = Err(SessionError::InvalidPhase {
                    action: "start the simulation",
                    phase: view.phase,
                });
                return false;
            }
            match &view.order {
                Some(order) if order.is_in_transit() => {}
                Some(_) => {
                    outcome = Err(SessionError::NotInTransit(order_id));
                    return false;
                }
                None => return false,
            }
            let Some(simulator) = RouteSimulator::new(view.route.clone(), ctx.config.step_size)
            else {
                outcome = Err(SessionError::EmptyRoute);
                return false;
            };

            view.phase = SessionPhase::Simulating;
            view.cursor = Some(simulator.cursor());
            outcome = Ok(simulator);
            true
        });

        let simulator = outcome?;
        self.simulation = Some(tokio::spawn(run_simulation(
            simulator,
            ctx.clone(),
            order_id,
            actor_id,
            self.view.clone(),
        )));

        info!(order_id, actor_id = %actor_id, "simulation started");
        Ok(())
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.view.send_if_modified(|view| {
            if view.phase == SessionPhase::Delivered {
                return false;
            }
            view.phase = SessionPhase::Cancelled;
            true
        });

        for handle in [
            self.simulation.take(),
            self.poller.take(),
            self.subscriber.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }

        self.metrics.active_sessions.dec();
        info!(order_id = self.order_id, "tracking session closed");
    }
}

/// Holds `route_lookup_in_flight` for one lookup and releases it when dropped,
/// so an abandoned request never leaves the session unable to retry.
struct LookupClaim<'a> {
    view: &'a watch::Sender<TrackingView>,
}

impl Drop for LookupClaim<'_> {
    fn drop(&mut self) {
        self.view
            .send_if_modified(|view| std::mem::replace(&mut view.route_lookup_in_flight, false));
    }
}

/// Requests the driving route for a session still in `idle`.
///
/// The lookup starts from the courier's last known position, or the depot
/// when the order service has none. Failures leave the session idle; there is
/// no automatic retry.
pub async fn load_route(
    ctx: &TrackingContext,
    view: &watch::Sender<TrackingView>,
) -> Result<(), SessionError> {
    let order_id = view.borrow().order_id;
    let mut claim = Err(SessionError::NoOrder(order_id));

    view.send_if_modified(|view| {
        if view.phase != SessionPhase::Idle {
            claim = Err(SessionError::InvalidPhase {
                action: "look up a route",
                phase: view.phase,
            });
            return false;
        }
        if view.route_lookup_in_flight {
            claim = Err(SessionError::LookupInFlight);
            return false;
        }
        let Some(order) = &view.order else {
            return false;
        };

        let origin = order.current_position().unwrap_or(ctx.depot);
        claim = Ok((origin, order.destination()));
        view.route_lookup_in_flight = true;
        true
    });

    let (origin, destination) = claim?;
    let _claim = LookupClaim { view };
    let result = ctx.directions.driving_route(origin, destination).await;

    match result {
        Ok(route) => {
            ctx.metrics.route_lookups_total.with_label_values(&["success"]).inc();
            info!(order_id, waypoints = route.len(), "route loaded");

            view.send_modify(|view| {
                view.route_lookup_in_flight = false;
                if view.phase == SessionPhase::Idle {
                    view.origin = Some(origin);
                    view.route = route;
                    view.phase = SessionPhase::RouteLoaded;
                }
            });
            Ok(())
        }
        Err(err) => {
            ctx.metrics.route_lookups_total.with_label_values(&["error"]).inc();
            warn!(order_id, error = %err, "route lookup failed; tracking unavailable");
            Err(err.into())
        }
    }
}

async fn run_simulation(
    mut simulator: RouteSimulator,
    ctx: TrackingContext,
    order_id: u64,
    actor_id: Uuid,
    view: Arc<watch::Sender<TrackingView>>,
) {
    let mut ticker = interval(ctx.config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if view.borrow().phase != SessionPhase::Simulating {
            debug!(order_id, "tick after simulation ended; ignoring");
            return;
        }
        ctx.metrics.simulation_ticks_total.inc();

        match simulator.tick() {
            Tick::Report { seq, point } => {
                let cursor = simulator.cursor();
                view.send_modify(|view| view.cursor = Some(cursor));
                tokio::spawn(report_location(ctx.clone(), order_id, seq, point, view.clone()));
            }
            Tick::Advanced { index } => {
                debug!(order_id, waypoint = index, "reached waypoint");
                let cursor = simulator.cursor();
                view.send_modify(|view| view.cursor = Some(cursor));
            }
            Tick::Arrived => break,
            Tick::Finished => return,
        }
    }

    drop(ticker);
    let cursor = simulator.cursor();
    view.send_modify(|view| {
        view.phase = SessionPhase::Delivered;
        view.cursor = Some(cursor);
    });
    info!(order_id, "simulated courier reached destination");

    tokio::spawn(mark_delivered(ctx, order_id, actor_id, view));
}

async fn report_location(
    ctx: TrackingContext,
    order_id: u64,
    seq: u64,
    point: GeoPoint,
    view: Arc<watch::Sender<TrackingView>>,
) {
    match ctx.orders.report_location(order_id, point).await {
        Ok(()) => {
            ctx.metrics.location_reports_total.with_label_values(&["success"]).inc();
            if !view.send_if_modified(|view| view.apply_simulated(seq, point)) {
                debug!(order_id, seq, "discarding stale location report");
            }
        }
        Err(err) => {
            ctx.metrics.location_reports_total.with_label_values(&["error"]).inc();
            warn!(order_id, seq, error = %err, "failed to report simulated location");
        }
    }
}

async fn mark_delivered(
    ctx: TrackingContext,
    order_id: u64,
    actor_id: Uuid,
    view: Arc<watch::Sender<TrackingView>>,
) {
    match ctx
        .orders
        .update_status(order_id, OrderStatus::Delivered, actor_id)
        .await
    {
        Ok(order) => {
            ctx.metrics.status_updates_total.with_label_values(&["success"]).inc();
            info!(order_id, "order marked as delivered");
            view.send_modify(|view| view.replace_order(order));
        }
        Err(err) => {
            ctx.metrics.status_updates_total.with_label_values(&["error"]).inc();
            error!(
                order_id,
                error = %err,
                "failed to mark order delivered; it stays shipped until an operator intervenes"
            );
        }
    }
}
