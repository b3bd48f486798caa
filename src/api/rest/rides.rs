use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::geo::GeoPoint;
use crate::models::ride::{RideRequest, RideStatus};
use crate::state::{AppState, DispatchEvent};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rides", post(create_ride).get(list_rides))
        .route("/rides/:id", get(get_ride))
        .route("/rides/:id/status", patch(transition_ride))
}

#[derive(Deserialize)]
pub struct CreateRideRequest {
    pub customer_name: String,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    #[serde(default)]
    pub use_nearest: bool,
}

#[derive(Deserialize)]
pub struct ListRidesParams {
    pub status: Option<RideStatus>,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: RideStatus,
}

async fn create_ride(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRideRequest>,
) -> Result<Json<RideRequest>, DispatchError> {
    let result = state.ledger.request_ride(
        &payload.customer_name,
        payload.pickup,
        payload.dropoff,
        payload.use_nearest,
    );

    let outcome = match &result {
        Ok(_) => "success",
        Err(DispatchError::NoVehicleAvailable) => "no_vehicle",
        Err(_) => "error",
    };
    state
        .metrics
        .dispatches_total
        .with_label_values(&[outcome])
        .inc();

    let ride = result?;
    state.refresh_vehicle_gauges();
    state.publish(DispatchEvent::RideAssigned(ride.clone()));
    Ok(Json(ride))
}

async fn list_rides(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRidesParams>,
) -> Json<Vec<RideRequest>> {
    let rides = match params.status {
        Some(status) => state.ledger.get_by_status(status),
        None => state.ledger.all_rides(),
    };
    Json(rides)
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, DispatchError> {
    let ride = state
        .ledger
        .get_by_id(id)
        .ok_or_else(|| DispatchError::NotFound(format!("ride {id} not found")))?;
    Ok(Json(ride))
}

async fn transition_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<RideRequest>, DispatchError> {
    let ride = state.ledger.transition(id, payload.status)?;

    let status_label = format!("{:?}", payload.status);
    state
        .metrics
        .ride_transitions_total
        .with_label_values(&[status_label.as_str()])
        .inc();
    state.refresh_vehicle_gauges();
    state.publish(DispatchEvent::RideUpdated(ride.clone()));
    Ok(Json(ride))
}
