use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::engine::fleet::FleetRegistry;
use crate::engine::ledger::DispatchLedger;
use crate::models::ride::RideRequest;
use crate::models::vehicle::Vehicle;
use crate::observability::metrics::Metrics;

/// Published to WebSocket observers after successful engine calls. Each
/// event carries a point-in-time clone, never a handle into engine state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum DispatchEvent {
    VehicleRegistered(Vehicle),
    RideAssigned(RideRequest),
    RideUpdated(RideRequest),
}

pub struct AppState {
    pub fleet: Arc<FleetRegistry>,
    pub ledger: DispatchLedger,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        let fleet = Arc::new(FleetRegistry::new());
        let ledger = DispatchLedger::new(fleet.clone());
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            fleet,
            ledger,
            events_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn publish(&self, event: DispatchEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn refresh_vehicle_gauges(&self) {
        self.metrics
            .vehicles_available
            .set(self.fleet.available_count() as i64);
        self.metrics
            .vehicles_assigned
            .set(self.fleet.assigned_count() as i64);
    }
}
