//! Batch train generation.
//!
//! A request names a route selection, a departure window and a frequency.
//! The orchestrator expands it into candidates and tries each one in
//! order: time the route, find a locomotive, check for conflicts, then
//! commit. Outcomes are streamed as they happen.

mod config;
mod orchestrator;
mod routes;

pub use config::{GenerationConfig, GenerationConfigError, RouteMode};
pub use orchestrator::{
    AttemptCandidate, AttemptOutcome, CreatedTrain, Direction, GenerationEvent, GenerationPlan,
    GenerationPreview, GenerationStats, Orchestrator, SkipReason,
};
pub use routes::{WalkLimits, sample_routes, synthesize_routes};
