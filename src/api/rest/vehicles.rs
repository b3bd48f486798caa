use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::vehicle::{Vehicle, VehicleSpec};
use crate::state::{AppState, DispatchEvent};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", post(register_vehicle).get(list_vehicles))
        .route("/vehicles/available", get(list_available))
        .route("/vehicles/assigned", get(list_assigned))
        .route("/vehicles/:id", get(get_vehicle))
}

async fn register_vehicle(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VehicleSpec>,
) -> Result<Json<Vehicle>, DispatchError> {
    let vehicle = state.fleet.register(payload)?;
    state.refresh_vehicle_gauges();
    state.publish(DispatchEvent::VehicleRegistered(vehicle.clone()));
    Ok(Json(vehicle))
}

async fn list_vehicles(State(state): State<Arc<AppState>>) -> Json<Vec<Vehicle>> {
    Json(state.fleet.all_vehicles())
}

async fn list_available(State(state): State<Arc<AppState>>) -> Json<Vec<Vehicle>> {
    Json(state.fleet.available_vehicles())
}

async fn list_assigned(State(state): State<Arc<AppState>>) -> Json<Vec<Vehicle>> {
    Json(state.fleet.assigned_vehicles())
}

async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, DispatchError> {
    let vehicle = state
        .fleet
        .lookup(id)
        .ok_or_else(|| DispatchError::NotFound(format!("vehicle {id} not found")))?;
    Ok(Json(vehicle))
}
