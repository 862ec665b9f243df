//! Batch generation of trains.
//!
//! The orchestrator enumerates route x slot candidates up front (with a
//! return leg after each outbound run when asked) and then works through
//! them strictly in order. Each attempt sees every train committed before
//! it. Every outcome is reported through the caller's sink as soon as it
//! is known; the sink returning `false` stops the run.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::{GenerationConfig, RouteMode};
use super::routes::{WalkLimits, sample_routes, synthesize_routes};
use crate::allocation::LocomotiveResolver;
use crate::config::EngineConfig;
use crate::conflict::{Candidate, Conflict, ConflictDetector};
use crate::domain::{
    ClockTime, Locomotive, LocomotiveAssignment, LocomotiveId, StationId, Train, TrainDraft,
    TrainId, TrainNumber,
};
use crate::error::EngineError;
use crate::network::{NetworkGraph, RouteResult, find_route};
use crate::schedule::{DwellPolicy, Scheduler};
use crate::store::TimetableStore;

/// Running tally of a generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub success: usize,
    pub conflicts: usize,
    pub skipped: usize,
    pub total: usize,
}

impl GenerationStats {
    fn record(&mut self, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Created { .. } => self.success += 1,
            AttemptOutcome::Conflict { .. } => self.conflicts += 1,
            AttemptOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Attempts finished so far.
    pub fn processed(&self) -> usize {
        self.success + self.conflicts + self.skipped
    }
}

/// Why an attempt was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The route could not be timed (e.g. it runs past midnight)
    InvalidSchedule { detail: String },
    NoLocomotive,
    LocomotiveBusy,
    NumbersExhausted,
    /// The commit failed; the train was not stored
    Persistence,
}

/// A committed train, as reported in the stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedTrain {
    pub id: TrainId,
    pub number: TrainNumber,
    pub route: Vec<StationId>,
    pub departure: ClockTime,
    pub arrival: ClockTime,
    pub locomotive: LocomotiveId,
}

/// Result of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Created {
        train: CreatedTrain,
    },
    Skipped {
        route: Vec<StationId>,
        departure: ClockTime,
        reason: SkipReason,
    },
    Conflict {
        route: Vec<StationId>,
        departure: ClockTime,
        conflicts: Vec<Conflict>,
    },
}

/// One item of the generation stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GenerationEvent {
    Progress {
        /// Percentage of candidates processed, 0-100
        progress: u8,
        outcome: AttemptOutcome,
        stats: GenerationStats,
    },
    Finished {
        stats: GenerationStats,
    },
}

/// Direction of a candidate relative to its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outbound,
    Return,
}

/// A route and departure time to attempt.
#[derive(Debug, Clone)]
pub struct AttemptCandidate {
    pub route: RouteResult,
    pub departure: ClockTime,
    pub direction: Direction,
}

/// Estimated size of a run, computed without committing anything.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationPreview {
    pub routes: Vec<Vec<StationId>>,
    pub route_count: usize,
    pub slot_count: usize,
    pub outbound_candidates: usize,
    pub return_candidates: usize,
    pub total_candidates: usize,
    pub seed: u64,
}

/// The candidate list for a request.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub routes: Vec<RouteResult>,
    pub slot_count: usize,
    pub candidates: Vec<AttemptCandidate>,
    pub seed: u64,
}

/// Allocates `<prefix><NNNN>` numbers that are not yet in use.
struct NumberAllocator {
    prefix: String,
    next: u32,
    used: HashSet<String>,
}

impl NumberAllocator {
    fn new(prefix: &str, trains: &[Train]) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 1,
            used: trains.iter().map(|t| t.number.as_str().to_string()).collect(),
        }
    }

    /// The next free number, without reserving it.
    fn peek(&mut self) -> Option<TrainNumber> {
        while self.next < 100_000 {
            let candidate = format!("{}{:04}", self.prefix, self.next);
            if !self.used.contains(&candidate) {
                return TrainNumber::parse(&candidate).ok();
            }
            self.next += 1;
        }
        None
    }

    fn reserve(&mut self, number: &TrainNumber) {
        self.used.insert(number.as_str().to_string());
    }
}

/// Mutable state carried from one attempt to the next.
struct RunState {
    trains: Vec<Train>,
    numbers: NumberAllocator,
}

/// Generates trains against one snapshot of the network and roster.
pub struct Orchestrator<'a, S: TimetableStore + ?Sized> {
    store: &'a S,
    graph: &'a NetworkGraph,
    locomotives: &'a [Locomotive],
    dwell: &'a DwellPolicy,
    config: &'a EngineConfig,
}

impl<'a, S: TimetableStore + ?Sized> Orchestrator<'a, S> {
    pub fn new(
        store: &'a S,
        graph: &'a NetworkGraph,
        locomotives: &'a [Locomotive],
        dwell: &'a DwellPolicy,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            store,
            graph,
            locomotives,
            dwell,
            config,
        }
    }

    fn dwell_for(&self, request: &GenerationConfig) -> DwellPolicy {
        match request.default_waiting_time {
            Some(minutes) => self.dwell.clone().with_intermediate_default(minutes),
            None => self.dwell.clone(),
        }
    }

    fn routes_for(&self, request: &GenerationConfig, seed: u64) -> Result<Vec<RouteResult>, EngineError> {
        let limits = WalkLimits {
            min_stations: self.config.min_route_stations,
            max_stations: self.config.max_route_stations,
            max_routes: self.config.max_synthesized_routes,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        match &request.route_mode {
            RouteMode::Specific { from, to } => {
                for station in [from, to] {
                    if !self.graph.contains(station) {
                        return Err(EngineError::Validation(format!("unknown station {station}")));
                    }
                }
                let route = find_route(self.graph, from, to).ok_or(EngineError::RouteNotFound {
                    from: *from,
                    to: *to,
                })?;
                Ok(vec![route])
            }
            RouteMode::AllRoutes => Ok(synthesize_routes(self.graph, limits, &mut rng)),
            RouteMode::Random { count } => {
                let all = synthesize_routes(self.graph, limits, &mut rng);
                Ok(sample_routes(&all, *count, &mut rng))
            }
        }
    }

    /// Enumerate the candidates for a request.
    ///
    /// Return legs depart from the outbound destination a fixed turnaround
    /// after the outbound arrival and are dropped when that falls after the
    /// end time, or when the graph has no edges for the reversed path.
    pub fn plan(&self, request: &GenerationConfig, seed: u64) -> Result<GenerationPlan, EngineError> {
        request.validate()?;
        let routes = self.routes_for(request, seed)?;
        let slots = request.slots();
        let dwell = self.dwell_for(request);
        let scheduler = Scheduler::new(self.graph, self.config);

        let mut candidates = Vec::new();
        for route in &routes {
            let back = if request.bidirectional {
                let reversed: Vec<StationId> = route.path.iter().rev().copied().collect();
                let back = RouteResult::along(self.graph, &reversed);
                if back.is_none() {
                    debug!(route = ?route.path, "no return route against one-way track");
                }
                back
            } else {
                None
            };
            for &slot in &slots {
                candidates.push(AttemptCandidate {
                    route: route.clone(),
                    departure: slot,
                    direction: Direction::Outbound,
                });

                let Some(back) = &back else {
                    continue;
                };
                let Ok(stops) = scheduler.build_timetable(
                    &route.path,
                    &route.connections,
                    slot,
                    request.max_speed_kmh,
                    &dwell,
                ) else {
                    continue;
                };
                let Some(arrival) = stops.last().map(|s| s.arrival) else {
                    continue;
                };
                let Some(departure) = arrival.checked_add_same_day(self.config.return_turnaround())
                else {
                    continue;
                };
                if departure <= request.end_time {
                    candidates.push(AttemptCandidate {
                        route: back.clone(),
                        departure,
                        direction: Direction::Return,
                    });
                }
            }
        }

        debug!(
            routes = routes.len(),
            slots = slots.len(),
            candidates = candidates.len(),
            seed,
            "planned generation"
        );

        Ok(GenerationPlan {
            routes,
            slot_count: slots.len(),
            candidates,
            seed,
        })
    }

    /// Size up a request without committing anything.
    pub fn preview(&self, request: &GenerationConfig, seed: u64) -> Result<GenerationPreview, EngineError> {
        let plan = self.plan(request, seed)?;
        let return_candidates = plan.candidates.iter().filter(|c| c.direction == Direction::Return).count();
        Ok(GenerationPreview {
            routes: plan.routes.iter().map(|r| r.path.clone()).collect(),
            route_count: plan.routes.len(),
            slot_count: plan.slot_count,
            outbound_candidates: plan.candidates.len() - return_candidates,
            return_candidates,
            total_candidates: plan.candidates.len(),
            seed: plan.seed,
        })
    }

    /// Run the batch, reporting each outcome through `emit`.
    ///
    /// Returns the final tally. A failed attempt never aborts the batch;
    /// only an invalid request or failing to read the timetable does.
    pub fn run(
        &self,
        request: &GenerationConfig,
        seed: u64,
        mut emit: impl FnMut(GenerationEvent) -> bool,
    ) -> Result<GenerationStats, EngineError> {
        let plan = self.plan(request, seed)?;
        let trains = self.store.trains()?;
        let dwell = self.dwell_for(request);

        let mut state = RunState {
            numbers: NumberAllocator::new(&request.train_name_prefix, &trains),
            trains,
        };
        let mut stats = GenerationStats {
            total: plan.candidates.len(),
            ..Default::default()
        };

        info!(candidates = stats.total, seed, "starting generation");

        for candidate in &plan.candidates {
            let outcome = self.attempt(candidate, request, &dwell, &mut state);
            stats.record(&outcome);

            let progress = (stats.processed() * 100 / stats.total.max(1)) as u8;
            if !emit(GenerationEvent::Progress {
                progress,
                outcome,
                stats,
            }) {
                info!(processed = stats.processed(), "generation cancelled by receiver");
                return Ok(stats);
            }
        }

        info!(
            success = stats.success,
            conflicts = stats.conflicts,
            skipped = stats.skipped,
            "generation finished"
        );
        emit(GenerationEvent::Finished { stats });
        Ok(stats)
    }

    fn attempt(
        &self,
        candidate: &AttemptCandidate,
        request: &GenerationConfig,
        dwell: &DwellPolicy,
        state: &mut RunState,
    ) -> AttemptOutcome {
        let route = &candidate.route;
        let skipped = |reason: SkipReason| AttemptOutcome::Skipped {
            route: route.path.clone(),
            departure: candidate.departure,
            reason,
        };

        let scheduler = Scheduler::new(self.graph, self.config);
        let stops = match scheduler.build_timetable(
            &route.path,
            &route.connections,
            candidate.departure,
            request.max_speed_kmh,
            dwell,
        ) {
            Ok(stops) => stops,
            Err(e) => {
                return skipped(SkipReason::InvalidSchedule {
                    detail: e.to_string(),
                });
            }
        };

        let Some(origin) = route.origin() else {
            return skipped(SkipReason::InvalidSchedule {
                detail: "empty route".to_string(),
            });
        };

        let resolver = LocomotiveResolver::new(self.locomotives, &state.trains, self.config);
        let Some(resolution) = resolver.resolve(origin, candidate.departure) else {
            return skipped(SkipReason::NoLocomotive);
        };
        let locomotive = resolution.locomotive.id;

        let Some(number) = state.numbers.peek() else {
            return skipped(SkipReason::NumbersExhausted);
        };

        let draft = TrainDraft {
            number,
            train_type: request.train_type.clone(),
            max_speed_kmh: request.max_speed_kmh,
            stops,
            locomotives: vec![LocomotiveAssignment::lead(locomotive)],
        };

        let detector = ConflictDetector::new(self.graph, self.config, self.locomotives);
        if !detector
            .locomotive_conflicts(Candidate::from(&draft), &state.trains)
            .is_empty()
        {
            return skipped(SkipReason::LocomotiveBusy);
        }

        let conflicts = detector.placement_conflicts(Candidate::from(&draft), &state.trains);
        if !conflicts.is_empty() {
            debug!(route = ?route.path, departure = %candidate.departure, conflicts = conflicts.len(), "candidate conflicts");
            return AttemptOutcome::Conflict {
                route: route.path.clone(),
                departure: candidate.departure,
                conflicts,
            };
        }

        match self.store.commit(draft) {
            Ok(train) => {
                state.numbers.reserve(&train.number);
                let created = CreatedTrain {
                    id: train.id,
                    number: train.number.clone(),
                    route: route.path.clone(),
                    departure: train.departure_time,
                    arrival: train.arrival_time,
                    locomotive,
                };
                state.trains.push(train);
                AttemptOutcome::Created { train: created }
            }
            Err(e) => {
                warn!(error = %e, departure = %candidate.departure, "commit failed, skipping candidate");
                skipped(SkipReason::Persistence)
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
