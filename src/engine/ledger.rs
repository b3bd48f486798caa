use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::fleet::FleetRegistry;
use crate::error::DispatchError;
use crate::geo::GeoPoint;
use crate::models::ride::{RideRequest, RideStatus};

/// Creates rides and drives them through their lifecycle, delegating
/// vehicle acquisition and release to the fleet registry.
///
/// The ride list and the per-status partitions change together under the
/// ledger's own lock. The fleet lock and the ledger lock are never held
/// at the same time: `request_ride` finishes the acquisition before
/// storing the ride, and terminal transitions drop the ledger lock
/// before releasing the vehicle.
pub struct DispatchLedger {
    fleet: Arc<FleetRegistry>,
    inner: Mutex<LedgerInner>,
}

struct LedgerInner {
    /// All rides ever created, in creation order. Rides are never
    /// removed, so indices into this list stay valid.
    rides: Vec<RideRequest>,
    by_status: HashMap<RideStatus, Vec<usize>>,
}

impl DispatchLedger {
    pub fn new(fleet: Arc<FleetRegistry>) -> Self {
        let by_status = RideStatus::ALL
            .into_iter()
            .map(|status| (status, Vec::new()))
            .collect();
        Self {
            fleet,
            inner: Mutex::new(LedgerInner {
                rides: Vec::new(),
                by_status,
            }),
        }
    }

    pub fn fleet(&self) -> &FleetRegistry {
        &self.fleet
    }

    fn locked(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().expect("dispatch ledger lock poisoned")
    }

    /// Creates a ride and immediately assigns a vehicle, nearest-first or
    /// FIFO. There is no pending state: if no vehicle can be acquired the
    /// ride is not stored and the error propagates.
    pub fn request_ride(
        &self,
        customer_name: &str,
        pickup: GeoPoint,
        dropoff: GeoPoint,
        use_nearest: bool,
    ) -> Result<RideRequest, DispatchError> {
        let mut ride = RideRequest::new(customer_name, pickup, dropoff);

        let vehicle = if use_nearest {
            self.fleet.acquire_nearest(&ride.pickup)?
        } else {
            self.fleet.acquire_fifo()?
        };

        ride.vehicle_id = Some(vehicle.id);
        ride.assigned_at = Some(Utc::now());
        ride.status = RideStatus::Assigned;

        let mut inner = self.locked();
        let idx = inner.rides.len();
        inner.rides.push(ride.clone());
        inner.partition_mut(RideStatus::Assigned).push(idx);
        drop(inner);

        info!(
            ride_id = %ride.id,
            vehicle_id = %vehicle.id,
            customer = %ride.customer_name,
            nearest = use_nearest,
            "ride assigned"
        );
        Ok(ride)
    }

    /// Moves a ride to `new_status` if the state machine allows it.
    ///
    /// Entering `Completed` stamps `completed_at`; both terminal statuses
    /// hand the assigned vehicle (if any) back to the registry. The
    /// release is best-effort: a registry error is logged and swallowed,
    /// the status change stands either way.
    pub fn transition(
        &self,
        ride_id: Uuid,
        new_status: RideStatus,
    ) -> Result<RideRequest, DispatchError> {
        let mut inner = self.locked();
        let idx = inner
            .rides
            .iter()
            .position(|ride| ride.id == ride_id)
            .ok_or_else(|| DispatchError::InvalidArgument(format!("unknown ride {ride_id}")))?;

        let from = inner.rides[idx].status;
        if !from.can_transition_to(new_status) {
            return Err(DispatchError::InvalidTransition {
                from,
                to: new_status,
            });
        }

        let bucket = inner.partition_mut(from);
        if let Some(pos) = bucket.iter().position(|i| *i == idx) {
            bucket.remove(pos);
        }

        let ride = &mut inner.rides[idx];
        ride.status = new_status;
        if new_status == RideStatus::Completed {
            ride.completed_at = Some(Utc::now());
        }
        let updated = ride.clone();
        inner.partition_mut(new_status).push(idx);
        drop(inner);

        if new_status.is_terminal() {
            if let Some(vehicle_id) = updated.vehicle_id {
                if let Err(err) = self.fleet.release(vehicle_id) {
                    warn!(
                        ride_id = %ride_id,
                        vehicle_id = %vehicle_id,
                        error = %err,
                        "vehicle release failed during terminal transition"
                    );
                }
            }
        }

        info!(ride_id = %ride_id, from = ?from, to = ?new_status, "ride transitioned");
        Ok(updated)
    }

    /// Snapshot of all rides currently in `status`, oldest first.
    pub fn get_by_status(&self, status: RideStatus) -> Vec<RideRequest> {
        let inner = self.locked();
        inner
            .by_status
            .get(&status)
            .map(|indices| indices.iter().map(|i| inner.rides[*i].clone()).collect())
            .unwrap_or_default()
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<RideRequest> {
        self.locked()
            .rides
            .iter()
            .find(|ride| ride.id == id)
            .cloned()
    }

    pub fn all_rides(&self) -> Vec<RideRequest> {
        self.locked().rides.clone()
    }

    pub fn total_count(&self) -> usize {
        self.locked().rides.len()
    }

    pub fn count_by_status(&self, status: RideStatus) -> usize {
        self.locked()
            .by_status
            .get(&status)
            .map_or(0, |indices| indices.len())
    }
}

impl LedgerInner {
    fn partition_mut(&mut self, status: RideStatus) -> &mut Vec<usize> {
        self.by_status.entry(status).or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::DispatchLedger;
    use crate::engine::fleet::FleetRegistry;
    use crate::error::DispatchError;
    use crate::geo::GeoPoint;
    use crate::models::ride::RideStatus;
    use crate::models::vehicle::VehicleSpec;

    fn zurich_hb() -> GeoPoint {
        GeoPoint::new(47.3769, 8.5417, "Zurich HB")
    }

    fn zurich_airport() -> GeoPoint {
        GeoPoint::new(47.4515, 8.5646, "Zurich Airport")
    }

    fn fleet_with(vehicles: &[(&str, &str, f64, f64)]) -> Arc<FleetRegistry> {
        let fleet = Arc::new(FleetRegistry::new());
        for (driver, plate, lat, lng) in vehicles {
            fleet
                .register(VehicleSpec {
                    driver_name: driver.to_string(),
                    plate: plate.to_string(),
                    model: "Tesla Model 3".to_string(),
                    location: GeoPoint::new(*lat, *lng, "start"),
                })
                .unwrap();
        }
        fleet
    }

    #[test]
    fn failed_request_stores_no_ride() {
        let ledger = DispatchLedger::new(Arc::new(FleetRegistry::new()));
        let err = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoVehicleAvailable));
        assert_eq!(ledger.total_count(), 0);
    }

    #[test]
    fn successful_request_assigns_and_stores() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet.clone());

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();

        assert_eq!(ride.status, RideStatus::Assigned);
        assert!(ride.vehicle_id.is_some());
        assert!(ride.assigned_at.is_some());
        assert_eq!(fleet.available_count(), 0);
        assert_eq!(ledger.count_by_status(RideStatus::Assigned), 1);
        assert_eq!(ledger.total_count(), 1);
    }

    #[test]
    fn nearest_request_picks_closest_vehicle() {
        let fleet = fleet_with(&[
            ("Far", "QR1000", 47.50, 8.70),
            ("Near", "QR1001", 47.37, 8.54),
        ]);
        let ledger = DispatchLedger::new(fleet.clone());

        let pickup = GeoPoint::new(47.38, 8.55, "pickup");
        let ride = ledger
            .request_ride("Alice", pickup, zurich_airport(), true)
            .unwrap();

        let vehicle = fleet.lookup(ride.vehicle_id.unwrap()).unwrap();
        assert_eq!(vehicle.plate, "QR1001");
        assert_eq!(ride.status, RideStatus::Assigned);
        assert!(fleet.available_vehicles().iter().all(|v| v.plate != "QR1001"));
    }

    #[test]
    fn completing_a_ride_returns_vehicle_to_available() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet.clone());

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();
        ledger.transition(ride.id, RideStatus::InProgress).unwrap();
        let done = ledger.transition(ride.id, RideStatus::Completed).unwrap();

        assert_eq!(done.status, RideStatus::Completed);
        assert!(done.completed_at.is_some());
        assert_eq!(fleet.available_count(), 1);
        assert_eq!(fleet.assigned_count(), 0);
        assert_eq!(ledger.count_by_status(RideStatus::Completed), 1);
        assert_eq!(ledger.count_by_status(RideStatus::InProgress), 0);
    }

    #[test]
    fn cancelling_an_assigned_ride_releases_the_vehicle() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet.clone());

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();
        let cancelled = ledger.transition(ride.id, RideStatus::Cancelled).unwrap();

        assert_eq!(cancelled.status, RideStatus::Cancelled);
        assert!(cancelled.completed_at.is_none());
        assert_eq!(fleet.available_count(), 1);
    }

    #[test]
    fn invalid_transition_leaves_ride_untouched() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet);

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();

        // Assigned -> Completed skips InProgress and must be rejected.
        let err = ledger
            .transition(ride.id, RideStatus::Completed)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidTransition {
                from: RideStatus::Assigned,
                to: RideStatus::Completed,
            }
        ));

        let stored = ledger.get_by_id(ride.id).unwrap();
        assert_eq!(stored.status, RideStatus::Assigned);
        assert_eq!(ledger.count_by_status(RideStatus::Assigned), 1);
        assert_eq!(ledger.count_by_status(RideStatus::Completed), 0);
    }

    #[test]
    fn explicit_assignment_is_rejected() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet);

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();
        assert!(matches!(
            ledger.transition(ride.id, RideStatus::Assigned),
            Err(DispatchError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn terminal_rides_reject_every_further_transition() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet);

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();
        ledger.transition(ride.id, RideStatus::Cancelled).unwrap();

        for target in RideStatus::ALL {
            assert!(
                matches!(
                    ledger.transition(ride.id, target),
                    Err(DispatchError::InvalidTransition { .. })
                ),
                "Cancelled -> {target:?} should be rejected"
            );
        }
        assert_eq!(ledger.count_by_status(RideStatus::Cancelled), 1);
    }

    #[test]
    fn transition_on_unknown_ride_is_invalid_argument() {
        let ledger = DispatchLedger::new(Arc::new(FleetRegistry::new()));
        assert!(matches!(
            ledger.transition(uuid::Uuid::new_v4(), RideStatus::Cancelled),
            Err(DispatchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn release_failure_does_not_block_the_transition() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet.clone());

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();
        ledger.transition(ride.id, RideStatus::InProgress).unwrap();

        // Pull the vehicle out from under the ledger; completing the
        // ride now hits NotAssigned on release, which is swallowed.
        fleet.release(ride.vehicle_id.unwrap()).unwrap();
        fleet.acquire_fifo().unwrap();
        fleet.release(ride.vehicle_id.unwrap()).unwrap();

        let done = ledger.transition(ride.id, RideStatus::Completed).unwrap();
        assert_eq!(done.status, RideStatus::Completed);
    }

    #[test]
    fn get_by_status_returns_point_in_time_snapshot() {
        let fleet = fleet_with(&[
            ("Ada", "QR1000", 47.37, 8.54),
            ("Grace", "QR1001", 47.38, 8.55),
        ]);
        let ledger = DispatchLedger::new(fleet);

        let first = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();
        ledger
            .request_ride("Bob", zurich_hb(), zurich_airport(), false)
            .unwrap();

        let snapshot = ledger.get_by_status(RideStatus::Assigned);
        assert_eq!(snapshot.len(), 2);

        ledger.transition(first.id, RideStatus::Cancelled).unwrap();

        // The snapshot taken earlier is unaffected by the mutation.
        assert_eq!(snapshot.len(), 2);
        assert_eq!(ledger.get_by_status(RideStatus::Assigned).len(), 1);
    }

    #[test]
    fn fare_uses_base_plus_per_km_rate() {
        let fleet = fleet_with(&[("Ada", "QR1000", 47.37, 8.54)]);
        let ledger = DispatchLedger::new(fleet);

        let ride = ledger
            .request_ride("Alice", zurich_hb(), zurich_airport(), false)
            .unwrap();
        let expected = 5.0 + ride.distance_km() * 2.0;
        assert!((ride.fare() - expected).abs() < 1e-9);
        assert!(ride.distance_km() > 0.0);
    }
}
