use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// A registered taxi. The `FleetRegistry` is the single owner of vehicle
/// state; everything handed out of the registry is a point-in-time clone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub driver_name: String,
    pub plate: String,
    pub model: String,
    pub location: GeoPoint,
    pub available: bool,
}

/// Registration payload: everything but the id and availability, which
/// the registry assigns itself.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleSpec {
    pub driver_name: String,
    pub plate: String,
    pub model: String,
    pub location: GeoPoint,
}

impl Vehicle {
    pub fn from_spec(spec: VehicleSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_name: spec.driver_name,
            plate: spec.plate,
            model: spec.model,
            location: spec.location,
            available: true,
        }
    }
}
