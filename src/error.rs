use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::ride::RideStatus;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid vehicle: {0}")]
    InvalidVehicle(String),

    #[error("a vehicle with plate {0} already exists")]
    DuplicateIdentifier(String),

    #[error("no vehicle available")]
    NoVehicleAvailable,

    #[error("vehicle is not currently assigned")]
    NotAssigned,

    #[error("invalid ride transition: {from:?} -> {to:?}")]
    InvalidTransition { from: RideStatus, to: RideStatus },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            DispatchError::InvalidVehicle(_) | DispatchError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::DuplicateIdentifier(_)
            | DispatchError::NotAssigned
            | DispatchError::InvalidTransition { .. } => StatusCode::CONFLICT,
            DispatchError::NoVehicleAvailable => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
