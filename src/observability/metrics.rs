use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub order_fetches_total: IntCounterVec,
    pub location_reports_total: IntCounterVec,
    pub status_updates_total: IntCounterVec,
    pub route_lookups_total: IntCounterVec,
    pub location_events_total: IntCounter,
    pub simulation_ticks_total: IntCounter,
    pub active_sessions: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn outcome_counter(name: &str, help: &str) -> IntCounterVec {
    IntCounterVec::new(Opts::new(name, help), &["outcome"])
        .expect("valid outcome counter metric")
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let order_fetches_total =
            outcome_counter("order_fetches_total", "Order snapshot fetches by outcome");
        let location_reports_total = outcome_counter(
            "location_reports_total",
            "Simulated location reports sent to the order service by outcome",
        );
        let status_updates_total = outcome_counter(
            "status_updates_total",
            "Terminal status updates issued by outcome",
        );
        let route_lookups_total =
            outcome_counter("route_lookups_total", "Directions requests by outcome");

        let location_events_total = IntCounter::new(
            "location_events_total",
            "Location events received from the pub/sub feed",
        )
        .expect("valid location_events_total metric");

        let simulation_ticks_total =
            IntCounter::new("simulation_ticks_total", "Simulation timer ticks processed")
                .expect("valid simulation_ticks_total metric");

        let active_sessions = IntGauge::new("active_sessions", "Currently open tracking sessions")
            .expect("valid active_sessions metric");

        registry
            .register(Box::new(order_fetches_total.clone()))
            .expect("register order_fetches_total");
        registry
            .register(Box::new(location_reports_total.clone()))
            .expect("register location_reports_total");
        registry
            .register(Box::new(status_updates_total.clone()))
            .expect("register status_updates_total");
        registry
            .register(Box::new(route_lookups_total.clone()))
            .expect("register route_lookups_total");
        registry
            .register(Box::new(location_events_total.clone()))
            .expect("register location_events_total");
        registry
            .register(Box::new(simulation_ticks_total.clone()))
            .expect("register simulation_ticks_total");
        registry
            .register(Box::new(active_sessions.clone()))
            .expect("register active_sessions");

        Self {
            registry,
            order_fetches_total,
            location_reports_total,
            status_updates_total,
            route_lookups_total,
            location_events_total,
            simulation_ticks_total,
            active_sessions,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
