use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clients::order_service::OrderService;
use crate::observability::metrics::Metrics;
use crate::tracking::view::TrackingView;

/// Re-fetches the order every `interval` while its last-known status is
/// `SHIPPED`. Each fetch replaces the order in the view wholesale.
pub async fn run_order_poller(
    orders: Arc<dyn OrderService>,
    order_id: u64,
    interval: Duration,
    view: Arc<watch::Sender<TrackingView>>,
    metrics: Metrics,
) {
    debug!(order_id, "order poller started");

    loop {
        sleep(interval).await;

        let in_transit = view
            .borrow()
            .order
            .as_ref()
            .is_some_and(|order| order.is_in_transit());
        if !in_transit {
            break;
        }

        match orders.fetch_order(order_id).await {
            Ok(order) => {
                metrics.order_fetches_total.with_label_values(&["success"]).inc();
                view.send_modify(|view| view.replace_order(order));
            }
            Err(err) => {
                metrics.order_fetches_total.with_label_values(&["error"]).inc();
                warn!(order_id, error = %err, "failed to refresh order");
            }
        }
    }

    info!(order_id, "order no longer in transit; poller stopped");
}
