//! Locomotive allocation.

mod resolver;

pub use resolver::{LocomotiveResolver, Resolution, Tier};
