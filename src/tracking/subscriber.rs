use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::observability::metrics::Metrics;
use crate::pubsub::{FeedError, LocationFeed};
use crate::tracking::view::TrackingView;

/// Keeps one subscription to the order's location topic alive for as long as
/// the task runs, writing every event into the view.
///
/// Reconnects after a fixed delay whenever the connection drops or cannot be
/// opened.
pub async fn run_location_subscriber(
    feed: Arc<dyn LocationFeed>,
    order_id: u64,
    reconnect_delay: Duration,
    view: Arc<watch::Sender<TrackingView>>,
    metrics: Metrics,
) {
    loop {
        match feed.subscribe(order_id).await {
            Ok(mut events) => {
                while let Some(event) = events.next().await {
                    match event {
                        Ok(event) if event.order_id.is_some_and(|id| id != order_id) => {
                            warn!(order_id, other = ?event.order_id, "ignoring event for another order");
                        }
                        Ok(event) => {
                            metrics.location_events_total.inc();
                            debug!(
                                order_id,
                                lat = event.latitude,
                                lng = event.longitude,
                                "location event received"
                            );
                            view.send_modify(|view| view.apply_subscribed(event.point()));
                        }
                        Err(FeedError::Broker { message, body }) => {
                            error!(order_id, message = %message, details = %body, "broker error");
                        }
                        Err(err) => {
                            warn!(order_id, error = %err, "dropping location message");
                        }
                    }
                }
                warn!(order_id, "location feed closed");
            }
            Err(err) => {
                error!(order_id, error = %err, "failed to subscribe to location feed");
            }
        }

        sleep(reconnect_delay).await;
    }
}
