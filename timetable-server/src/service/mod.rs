//! Caller-facing timetable operations.
//!
//! [`TimetableService`] ties the engine components to a [`Backend`] store.
//! Every operation takes the caller's [`CallerRole`] and rejects callers
//! lacking the capability before doing any work. Store failures surface
//! only as [`EngineError::Persistence`].

mod dispatcher;
mod role;

pub use dispatcher::Dispatcher;
pub use role::{CallerRole, Capability, UnknownRole};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::allocation::LocomotiveResolver;
use crate::config::EngineConfig;
use crate::conflict::{Candidate, ConflictDetector, ConflictReport, LocomotiveBooking, booking_at};
use crate::domain::{
    ClockTime, LocomotiveAssignment, LocomotiveId, StationId, Train, TrainDraft, TrainNumber,
};
use crate::error::EngineError;
use crate::generation::{
    GenerationConfig, GenerationEvent, GenerationPreview, GenerationStats, Orchestrator,
};
use crate::network::{GraphCache, NetworkGraph, RouteResult, find_route};
use crate::repair::{CapacityRepair, plan_capacity_repair};
use crate::schedule::Scheduler;
use crate::store::{Backend, StoreError};

/// A train to create from a route between two stations.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainRequest {
    pub number: TrainNumber,
    #[serde(default = "default_train_type")]
    pub train_type: String,
    pub from: StationId,
    pub to: StationId,
    pub departure: ClockTime,
    pub max_speed_kmh: f64,
    /// Resolved automatically when absent.
    #[serde(default)]
    pub locomotive: Option<LocomotiveId>,
    /// Per-station dwell minutes for this train only.
    #[serde(default)]
    pub dwell_overrides: BTreeMap<StationId, u32>,
}

fn default_train_type() -> String {
    "regional".to_string()
}

/// Whether a locomotive can take a departure at a given time.
#[derive(Debug, Clone, Serialize)]
pub struct LocomotiveAvailability {
    pub locomotive: LocomotiveId,
    pub time: ClockTime,
    pub available: bool,
    /// The assignment blocking the locomotive, if any.
    pub booking: Option<LocomotiveBooking>,
}

/// The timetable engine over one store.
pub struct TimetableService<S: Backend + ?Sized> {
    store: Arc<S>,
    config: EngineConfig,
    graphs: GraphCache,
    seed: Option<u64>,
}

fn authorize(role: CallerRole, capability: Capability, action: &'static str) -> Result<(), EngineError> {
    if role.allows(capability) {
        Ok(())
    } else {
        Err(EngineError::Forbidden { role, action })
    }
}

/// Map a store error, keeping its detail in the log only.
fn persistence(e: StoreError) -> EngineError {
    error!(error = %e, "store operation failed");
    EngineError::Persistence(e)
}

impl<S: Backend + ?Sized> TimetableService<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            graphs: GraphCache::default(),
            seed: None,
        }
    }

    /// Seed used for route synthesis when a request carries none.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn graph(&self) -> Result<Arc<NetworkGraph>, EngineError> {
        self.graphs.graph_for(&*self.store).map_err(persistence)
    }

    fn trains(&self) -> Result<Vec<Train>, EngineError> {
        self.store.trains().map_err(persistence)
    }

    fn known_station(graph: &NetworkGraph, station: &StationId) -> Result<(), EngineError> {
        if graph.contains(station) {
            Ok(())
        } else {
            Err(EngineError::Validation(format!("unknown station {station}")))
        }
    }

    /// Shortest route between two stations over active connections.
    pub fn validate_route(
        &self,
        role: CallerRole,
        from: &StationId,
        to: &StationId,
    ) -> Result<RouteResult, EngineError> {
        authorize(role, Capability::Read, "validate routes")?;
        let graph = self.graph()?;
        Self::known_station(&graph, from)?;
        Self::known_station(&graph, to)?;

        find_route(&graph, from, to).ok_or(EngineError::RouteNotFound {
            from: *from,
            to: *to,
        })
    }

    fn seed_for(&self, request: &GenerationConfig) -> u64 {
        request.seed.or(self.seed).unwrap_or_else(rand::random)
    }

    /// Estimate a generation run without committing anything.
    pub fn preview_generation(
        &self,
        role: CallerRole,
        request: &GenerationConfig,
    ) -> Result<GenerationPreview, EngineError> {
        authorize(role, Capability::Read, "preview generation")?;
        let graph = self.graph()?;
        let locomotives = self.store.locomotives().map_err(persistence)?;
        let dwell = self.store.dwell_policy().map_err(persistence)?;

        Orchestrator::new(&*self.store, &graph, &locomotives, &dwell, &self.config)
            .preview(request, self.seed_for(request))
    }

    /// Generate trains, handing each event to `emit` as it happens.
    ///
    /// `emit` returning `false` stops the run; trains already committed
    /// stay.
    pub fn generate(
        &self,
        role: CallerRole,
        request: &GenerationConfig,
        emit: impl FnMut(GenerationEvent) -> bool,
    ) -> Result<GenerationStats, EngineError> {
        authorize(role, Capability::Schedule, "generate trains")?;
        request.validate()?;

        let graph = self.graph()?;
        let locomotives = self.store.locomotives().map_err(persistence)?;
        let dwell = self.store.dwell_policy().map_err(persistence)?;
        let seed = self.seed_for(request);
        info!(seed, mode = ?request.route_mode, "generation requested");

        Orchestrator::new(&*self.store, &graph, &locomotives, &dwell, &self.config)
            .run(request, seed, emit)
    }

    /// Audit the whole timetable for conflicts.
    pub fn check_conflicts(&self, role: CallerRole) -> Result<ConflictReport, EngineError> {
        authorize(role, Capability::Read, "check conflicts")?;
        let graph = self.graph()?;
        let locomotives = self.store.locomotives().map_err(persistence)?;
        let trains = self.trains()?;

        Ok(ConflictDetector::new(&graph, &self.config, &locomotives).audit(&trains))
    }

    /// Remove trains until no station window is over capacity.
    pub fn resolve_conflicts(&self, role: CallerRole) -> Result<CapacityRepair, EngineError> {
        authorize(role, Capability::Delete, "resolve conflicts")?;
        let graph = self.graph()?;
        let trains = self.trains()?;

        let plan = plan_capacity_repair(&trains, &graph, &self.config);
        if !plan.remove.is_empty() {
            let deleted = self.store.delete(&plan.ids()).map_err(persistence)?;
            info!(deleted, "capacity repair applied");
        }
        Ok(plan.into_report())
    }

    /// Delete every generated train. Returns how many went.
    pub fn clear_auto_generated(&self, role: CallerRole) -> Result<usize, EngineError> {
        authorize(role, Capability::Delete, "clear generated trains")?;
        let ids: Vec<_> = self
            .trains()?
            .iter()
            .filter(|t| t.is_auto_generated(&self.config.auto_prefix))
            .map(|t| t.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = self.store.delete(&ids).map_err(persistence)?;
        info!(deleted, prefix = %self.config.auto_prefix, "cleared generated trains");
        Ok(deleted)
    }

    /// Delete every train.
    pub fn clear_all(&self, role: CallerRole) -> Result<usize, EngineError> {
        authorize(role, Capability::Delete, "clear the timetable")?;
        let deleted = self.store.clear().map_err(persistence)?;
        info!(deleted, "cleared timetable");
        Ok(deleted)
    }

    pub fn list_trains(&self, role: CallerRole) -> Result<Vec<Train>, EngineError> {
        authorize(role, Capability::Read, "list trains")?;
        self.trains()
    }

    /// Create one train, or explain exactly why not.
    ///
    /// The route is timed with the stored dwell policy plus the request's
    /// overrides. Without an explicit locomotive one is resolved at the
    /// origin. Any conflict rejects the train with the full list.
    pub fn create_train(&self, role: CallerRole, request: TrainRequest) -> Result<Train, EngineError> {
        authorize(role, Capability::Schedule, "create trains")?;
        if !(request.max_speed_kmh.is_finite() && request.max_speed_kmh > 0.0) {
            return Err(EngineError::Validation(format!(
                "max speed must be positive, got {}",
                request.max_speed_kmh
            )));
        }
        if request.from == request.to {
            return Err(EngineError::Validation("route endpoints must differ".into()));
        }

        let route = self.validate_route(role, &request.from, &request.to)?;
        let graph = self.graph()?;
        let dwell = self
            .store
            .dwell_policy()
            .map_err(persistence)?
            .with_overrides(&request.dwell_overrides);

        let stops = Scheduler::new(&graph, &self.config).build_timetable(
            &route.path,
            &route.connections,
            request.departure,
            request.max_speed_kmh,
            &dwell,
        )?;

        let trains = self.trains()?;
        if trains.iter().any(|t| t.number == request.number) {
            return Err(EngineError::Validation(format!(
                "train number {} is already in use",
                request.number
            )));
        }

        let locomotives = self.store.locomotives().map_err(persistence)?;
        let locomotive = match request.locomotive {
            Some(id) => {
                if !locomotives.iter().any(|l| l.id == id) {
                    return Err(EngineError::Validation(format!("unknown locomotive {id}")));
                }
                id
            }
            None => {
                LocomotiveResolver::new(&locomotives, &trains, &self.config)
                    .resolve(request.from, request.departure)
                    .ok_or_else(|| {
                        EngineError::ResourceUnavailable(format!(
                            "no locomotive available at {} for {}",
                            request.from, request.departure
                        ))
                    })?
                    .locomotive
                    .id
            }
        };

        let draft = TrainDraft {
            number: request.number,
            train_type: request.train_type,
            max_speed_kmh: request.max_speed_kmh,
            stops,
            locomotives: vec![LocomotiveAssignment::lead(locomotive)],
        };

        let conflicts = ConflictDetector::new(&graph, &self.config, &locomotives)
            .check(Candidate::from(&draft), &trains);
        if !conflicts.is_empty() {
            debug!(train = %draft.number, conflicts = conflicts.len(), "train rejected");
            return Err(EngineError::Conflict(conflicts));
        }

        match self.store.commit(draft) {
            Ok(train) => {
                info!(train = %train.number, id = %train.id, locomotive = %locomotive, "created train");
                Ok(train)
            }
            Err(StoreError::DuplicateNumber(number)) => Err(EngineError::Validation(format!(
                "train number {number} is already in use"
            ))),
            Err(StoreError::Invalid(e)) => Err(EngineError::Validation(e.to_string())),
            Err(e) => Err(persistence(e)),
        }
    }

    /// Whether `locomotive` could depart at `time`, ignoring where it is.
    pub fn locomotive_availability(
        &self,
        role: CallerRole,
        locomotive: LocomotiveId,
        time: ClockTime,
    ) -> Result<LocomotiveAvailability, EngineError> {
        authorize(role, Capability::Read, "query locomotives")?;
        let locomotives = self.store.locomotives().map_err(persistence)?;
        let Some(record) = locomotives.iter().find(|l| l.id == locomotive) else {
            return Err(EngineError::Validation(format!("unknown locomotive {locomotive}")));
        };

        let trains = self.trains()?;
        let booking = booking_at(record, time, &trains);
        Ok(LocomotiveAvailability {
            locomotive,
            time,
            available: booking.is_none(),
            booking,
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
