use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::geo::{GeoPoint, haversine_km};
use crate::models::vehicle::{Vehicle, VehicleSpec};

/// Authoritative bookkeeping of which vehicles exist and which are
/// currently available.
///
/// All three collections move together under one lock: a vehicle is in
/// exactly one of the available/assigned partitions at every externally
/// visible point, and its `available` flag flips inside the same
/// critical section that moves it. Everything handed out is a clone, so
/// callers never iterate live internal state.
pub struct FleetRegistry {
    inner: Mutex<FleetInner>,
}

#[derive(Default)]
struct FleetInner {
    vehicles: HashMap<Uuid, Vehicle>,
    /// FIFO queue of available vehicle ids, oldest first.
    available: VecDeque<Uuid>,
    assigned: Vec<Uuid>,
    /// Plates ever registered; never shrinks, so a plate is unique
    /// across the fleet's entire history.
    plates: HashSet<String>,
}

impl FleetRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FleetInner::default()),
        }
    }

    fn locked(&self) -> MutexGuard<'_, FleetInner> {
        self.inner.lock().expect("fleet registry lock poisoned")
    }

    /// Registers a new vehicle and appends it to the available queue.
    pub fn register(&self, spec: VehicleSpec) -> Result<Vehicle, DispatchError> {
        if spec.driver_name.trim().is_empty() {
            return Err(DispatchError::InvalidVehicle(
                "driver name cannot be empty".to_string(),
            ));
        }
        if spec.plate.trim().is_empty() {
            return Err(DispatchError::InvalidVehicle(
                "plate cannot be empty".to_string(),
            ));
        }

        let mut inner = self.locked();
        if inner.plates.contains(&spec.plate) {
            return Err(DispatchError::DuplicateIdentifier(spec.plate));
        }

        let vehicle = Vehicle::from_spec(spec);
        inner.plates.insert(vehicle.plate.clone());
        inner.available.push_back(vehicle.id);
        inner.vehicles.insert(vehicle.id, vehicle.clone());

        info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "vehicle registered");
        Ok(vehicle)
    }

    /// Takes the vehicle that has been available longest. O(1).
    pub fn acquire_fifo(&self) -> Result<Vehicle, DispatchError> {
        let mut inner = self.locked();
        let id = inner
            .available
            .pop_front()
            .ok_or(DispatchError::NoVehicleAvailable)?;
        Ok(inner.mark_assigned(id))
    }

    /// Takes the available vehicle closest to `point` by great-circle
    /// distance. Ties go to the earliest-registered vehicle: the queue is
    /// scanned in FIFO order and only a strictly smaller distance
    /// replaces the current best. O(n) in the available pool.
    pub fn acquire_nearest(&self, point: &GeoPoint) -> Result<Vehicle, DispatchError> {
        let mut inner = self.locked();
        if inner.available.is_empty() {
            return Err(DispatchError::NoVehicleAvailable);
        }

        let mut best: Option<(usize, f64)> = None;
        for (pos, id) in inner.available.iter().enumerate() {
            let vehicle = &inner.vehicles[id];
            let distance = haversine_km(&vehicle.location, point);
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((pos, distance));
            }
        }

        // Unreachable with finite coordinates; NaN distances never win a
        // comparison, so a fleet of NaN positions yields no candidate.
        let (pos, distance) = best.ok_or(DispatchError::NoVehicleAvailable)?;
        let id = inner
            .available
            .remove(pos)
            .ok_or(DispatchError::NoVehicleAvailable)?;

        debug!(vehicle_id = %id, distance_km = distance, "nearest vehicle selected");
        Ok(inner.mark_assigned(id))
    }

    /// Moves an assigned vehicle back to the end of the available queue.
    /// O(n) in the assigned partition.
    pub fn release(&self, id: Uuid) -> Result<Vehicle, DispatchError> {
        let mut inner = self.locked();
        if !inner.vehicles.contains_key(&id) {
            return Err(DispatchError::InvalidVehicle(format!(
                "unknown vehicle {id}"
            )));
        }

        let pos = inner
            .assigned
            .iter()
            .position(|assigned_id| *assigned_id == id)
            .ok_or(DispatchError::NotAssigned)?;
        inner.assigned.remove(pos);
        inner.available.push_back(id);

        let vehicle = inner
            .vehicles
            .get_mut(&id)
            .expect("vehicle present in assigned partition");
        vehicle.available = true;

        debug!(vehicle_id = %id, "vehicle released");
        Ok(vehicle.clone())
    }

    pub fn lookup(&self, id: Uuid) -> Option<Vehicle> {
        self.locked().vehicles.get(&id).cloned()
    }

    /// Snapshot of the available queue, oldest first.
    pub fn available_vehicles(&self) -> Vec<Vehicle> {
        let inner = self.locked();
        inner
            .available
            .iter()
            .map(|id| inner.vehicles[id].clone())
            .collect()
    }

    pub fn assigned_vehicles(&self) -> Vec<Vehicle> {
        let inner = self.locked();
        inner
            .assigned
            .iter()
            .map(|id| inner.vehicles[id].clone())
            .collect()
    }

    pub fn all_vehicles(&self) -> Vec<Vehicle> {
        self.locked().vehicles.values().cloned().collect()
    }

    pub fn available_count(&self) -> usize {
        self.locked().available.len()
    }

    pub fn assigned_count(&self) -> usize {
        self.locked().assigned.len()
    }

    pub fn total_count(&self) -> usize {
        self.locked().vehicles.len()
    }
}

impl Default for FleetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetInner {
    /// Finishes an acquisition: the id has already been removed from the
    /// available queue, still inside the caller's critical section.
    fn mark_assigned(&mut self, id: Uuid) -> Vehicle {
        self.assigned.push(id);
        let vehicle = self
            .vehicles
            .get_mut(&id)
            .expect("vehicle present in available queue");
        vehicle.available = false;
        vehicle.clone()
    }
}
