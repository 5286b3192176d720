use dashmap::DashMap;

use crate::observability::metrics::Metrics;
use crate::tracking::session::{TrackingContext, TrackingSession};

pub struct AppState {
    pub sessions: DashMap<u64, TrackingSession>,
    pub tracking: TrackingContext,
}

impl AppState {
    pub fn new(tracking: TrackingContext) -> Self {
        Self {
            sessions: DashMap::new(),
            tracking,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.tracking.metrics
    }

    /// Ends every open session, releasing their timers and connections.
    pub fn close_all(&self) {
        self.sessions.clear();
    }
}
