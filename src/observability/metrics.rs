use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounter,
    pub status_transitions_total: IntCounterVec,
    pub confirmations_total: IntCounterVec,
    pub sos_alerts_total: IntCounterVec,
    pub drivers_with_active_order: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders created or seeded")
                .expect("valid orders_created_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Order status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let confirmations_total = IntCounterVec::new(
            Opts::new("confirmations_total", "Delivery confirmations by method"),
            &["method"],
        )
        .expect("valid confirmations_total metric");

        let sos_alerts_total = IntCounterVec::new(
            Opts::new("sos_alerts_total", "SOS alerts by severity group"),
            &["severity"],
        )
        .expect("valid sos_alerts_total metric");

        let drivers_with_active_order = IntGauge::new(
            "drivers_with_active_order",
            "Drivers currently holding an active order",
        )
        .expect("valid drivers_with_active_order metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(confirmations_total.clone()))
            .expect("register confirmations_total");
        registry
            .register(Box::new(sos_alerts_total.clone()))
            .expect("register sos_alerts_total");
        registry
            .register(Box::new(drivers_with_active_order.clone()))
            .expect("register drivers_with_active_order");

        Self {
            registry,
            orders_created_total,
            status_transitions_total,
            confirmations_total,
            sos_alerts_total,
            drivers_with_active_order,
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
