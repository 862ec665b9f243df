//! Station over-capacity resolution.
//!
//! Trains are bucketed per station into fixed windows by the time they use
//! the station: departure at their origin, arrival everywhere else. A
//! bucket holding more trains than the station has active tracks loses the
//! excess, auto-generated trains first and then by ascending number.
//! Stations and buckets are visited in ascending order and a train removed
//! once is no longer counted anywhere, so the outcome is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::{StopType, Train, TrainId, TrainNumber};
use crate::network::NetworkGraph;

/// Outcome of a capacity repair, as reported to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapacityRepair {
    /// Station windows found over capacity.
    pub conflicts_found: usize,
    pub trains_removed: usize,
    pub removed: Vec<TrainNumber>,
}

/// Trains to delete, computed without touching the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairPlan {
    pub conflicts_found: usize,
    pub remove: Vec<(TrainId, TrainNumber)>,
}

impl RepairPlan {
    pub fn ids(&self) -> Vec<TrainId> {
        self.remove.iter().map(|(id, _)| *id).collect()
    }

    pub fn into_report(self) -> CapacityRepair {
        CapacityRepair {
            conflicts_found: self.conflicts_found,
            trains_removed: self.remove.len(),
            removed: self.remove.into_iter().map(|(_, number)| number).collect(),
        }
    }
}

/// Decide which trains to remove so no station window is over capacity.
pub fn plan_capacity_repair(
    trains: &[Train],
    graph: &NetworkGraph,
    config: &EngineConfig,
) -> RepairPlan {
    let bucket_mins = config.capacity_bucket_mins.max(1);
    let mut removed: BTreeSet<TrainId> = BTreeSet::new();
    let mut plan = RepairPlan::default();

    for station in graph.stations() {
        let tracks = station.active_track_count();
        if tracks == 0 {
            continue;
        }

        let mut buckets: BTreeMap<u32, Vec<&Train>> = BTreeMap::new();
        for train in trains.iter().filter(|t| t.is_active && !removed.contains(&t.id)) {
            let Some(stop) = train.stop_at(&station.id) else {
                continue;
            };
            let used_at = if stop.stop_type == StopType::Origin {
                stop.departure
            } else {
                stop.arrival
            };
            buckets
                .entry(used_at.minute_of_day() / bucket_mins)
                .or_default()
                .push(train);
        }

        for (bucket, mut occupants) in buckets {
            occupants.retain(|t| !removed.contains(&t.id));
            if occupants.len() <= tracks {
                continue;
            }

            plan.conflicts_found += 1;
            let excess = occupants.len() - tracks;
            occupants.sort_by(|a, b| {
                let a_key = (!a.is_auto_generated(&config.auto_prefix), &a.number);
                let b_key = (!b.is_auto_generated(&config.auto_prefix), &b.number);
                a_key.cmp(&b_key)
            });

            debug!(
                station = %station.id,
                window_start = bucket * bucket_mins,
                occupants = occupants.len(),
                tracks,
                excess,
                "station window over capacity"
            );

            for train in occupants.into_iter().take(excess) {
                removed.insert(train.id);
                plan.remove.push((train.id, train.number.clone()));
            }
        }
    }

    if !plan.remove.is_empty() {
        info!(
            conflicts = plan.conflicts_found,
            removing = plan.remove.len(),
            "planned capacity repair"
        );
    }
    plan
}
