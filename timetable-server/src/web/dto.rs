//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::conflict::Conflict;
use crate::domain::{ClockTime, LocomotiveId, StationId, Train, TrainId, TrainNumber};
use crate::network::RouteResult;

/// Query for route validation.
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    /// Origin station code (case-insensitive)
    pub from: String,

    /// Destination station code (case-insensitive)
    pub to: String,
}

/// Query for a locomotive availability check.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Time in HH:MM format
    pub time: String,
}

/// A validated route.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub path: Vec<StationId>,
    pub total_distance_km: f64,
    pub segments: usize,
}

impl RouteResponse {
    pub fn from_route(route: &RouteResult) -> Self {
        Self {
            path: route.path.clone(),
            total_distance_km: route.total_distance_km,
            segments: route.connections.len(),
        }
    }
}

/// One row of the train listing.
#[derive(Debug, Serialize)]
pub struct TrainSummary {
    pub id: TrainId,
    pub number: TrainNumber,
    pub train_type: String,
    pub departure_station: StationId,
    pub arrival_station: StationId,
    pub departure_time: ClockTime,
    pub arrival_time: ClockTime,
    pub locomotive: Option<LocomotiveId>,
    pub stops: usize,
    pub is_active: bool,
}

impl TrainSummary {
    pub fn from_train(train: &Train) -> Self {
        Self {
            id: train.id,
            number: train.number.clone(),
            train_type: train.train_type.clone(),
            departure_station: train.departure_station,
            arrival_station: train.arrival_station,
            departure_time: train.departure_time,
            arrival_time: train.arrival_time,
            locomotive: train.lead_locomotive(),
            stops: train.stops.len(),
            is_active: train.is_active,
        }
    }
}

/// Response listing trains.
#[derive(Debug, Serialize)]
pub struct TrainListResponse {
    pub trains: Vec<TrainSummary>,
}

/// Response to a bulk delete.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub kind: &'static str,

    pub error: String,

    /// Present for conflict errors only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<Conflict>>,
}
