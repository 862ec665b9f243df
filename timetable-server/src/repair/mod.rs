//! Repair of an over-full timetable.

mod overcapacity;

pub use overcapacity::{CapacityRepair, RepairPlan, plan_capacity_repair};
