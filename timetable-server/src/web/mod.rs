//! Web layer for the timetable engine.
//!
//! JSON endpoints over the scheduler actor, plus a server-sent event
//! stream for generation runs.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, ROLE_HEADER, create_router};
pub use state::AppState;
