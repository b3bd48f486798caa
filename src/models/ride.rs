use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{GeoPoint, haversine_km};

const BASE_FARE: f64 = 5.0;
const FARE_PER_KM: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideStatus {
    Requested,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub const ALL: [RideStatus; 5] = [
        RideStatus::Requested,
        RideStatus::Assigned,
        RideStatus::InProgress,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    /// No further transitions are accepted out of a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// The ride state machine, as seen by external callers. `Requested`
    /// can never be re-entered, and `Assigned` is reachable only through
    /// `DispatchLedger::request_ride`, never by an explicit transition.
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Assigned, RideStatus::InProgress)
                | (RideStatus::InProgress, RideStatus::Completed)
                | (
                    RideStatus::Requested | RideStatus::Assigned | RideStatus::InProgress,
                    RideStatus::Cancelled,
                )
        )
    }
}

/// A single trip. `vehicle_id` is an identifier into the fleet registry,
/// not a live reference; it is set exactly when the ride reaches
/// `Assigned` and survives into terminal states reached from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: Uuid,
    pub customer_name: String,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub requested_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub vehicle_id: Option<Uuid>,
    pub status: RideStatus,
}

impl RideRequest {
    pub fn new(customer_name: impl Into<String>, pickup: GeoPoint, dropoff: GeoPoint) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_name: customer_name.into(),
            pickup,
            dropoff,
            requested_at: Utc::now(),
            assigned_at: None,
            completed_at: None,
            vehicle_id: None,
            status: RideStatus::Requested,
        }
    }

    /// Trip length as the crow flies, pickup to dropoff.
    pub fn distance_km(&self) -> f64 {
        haversine_km(&self.pickup, &self.dropoff)
    }

    /// Base fare plus a flat per-kilometer rate.
    pub fn fare(&self) -> f64 {
        BASE_FARE + self.distance_km() * FARE_PER_KM
    }
}
