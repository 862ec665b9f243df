//! Model-railway timetable engine.
//!
//! Builds conflict-free timetables over a user-defined layout: routes are
//! found on the track network, timed stop by stop, checked against every
//! existing train and locomotive, and committed atomically. Trains can be
//! created one at a time or generated in batches.

pub mod allocation;
pub mod config;
pub mod conflict;
pub mod domain;
pub mod error;
pub mod generation;
pub mod network;
pub mod repair;
pub mod schedule;
pub mod service;
pub mod store;
pub mod web;

#[cfg(test)]
mod test_support;
