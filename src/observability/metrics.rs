use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dispatches_total: IntCounterVec,
    pub ride_transitions_total: IntCounterVec,
    pub vehicles_available: IntGauge,
    pub vehicles_assigned: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dispatches_total = IntCounterVec::new(
            Opts::new("dispatches_total", "Total ride dispatch attempts by outcome"),
            &["outcome"],
        )
        .expect("valid dispatches_total metric");

        let ride_transitions_total = IntCounterVec::new(
            Opts::new(
                "ride_transitions_total",
                "Total ride status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid ride_transitions_total metric");

        let vehicles_available = IntGauge::new(
            "vehicles_available",
            "Current number of available vehicles",
        )
        .expect("valid vehicles_available metric");

        let vehicles_assigned = IntGauge::new(
            "vehicles_assigned",
            "Current number of assigned vehicles",
        )
        .expect("valid vehicles_assigned metric");

        registry
            .register(Box::new(dispatches_total.clone()))
            .expect("register dispatches_total");
        registry
            .register(Box::new(ride_transitions_total.clone()))
            .expect("register ride_transitions_total");
        registry
            .register(Box::new(vehicles_available.clone()))
            .expect("register vehicles_available");
        registry
            .register(Box::new(vehicles_assigned.clone()))
            .expect("register vehicles_assigned");

        Self {
            registry,
            dispatches_total,
            ride_transitions_total,
            vehicles_available,
            vehicles_assigned,
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
