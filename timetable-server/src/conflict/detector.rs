//! The combined conflict detector.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::{
    Candidate, Conflict, TrainRef, capacity_conflicts, locomotive_conflicts, segment_conflicts,
};
use crate::config::EngineConfig;
use crate::domain::{Locomotive, LocomotiveId, StationId, Train};
use crate::network::NetworkGraph;

/// Result of auditing the whole timetable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConflictReport {
    pub trains_checked: usize,
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Runs the segment, capacity and locomotive checks against one
/// snapshot of the network and locomotive roster.
pub struct ConflictDetector<'a> {
    graph: &'a NetworkGraph,
    config: &'a EngineConfig,
    locomotives: &'a [Locomotive],
}

impl<'a> ConflictDetector<'a> {
    pub fn new(graph: &'a NetworkGraph, config: &'a EngineConfig, locomotives: &'a [Locomotive]) -> Self {
        Self {
            graph,
            config,
            locomotives,
        }
    }

    fn locomotive(&self, id: LocomotiveId) -> Option<&'a Locomotive> {
        self.locomotives.iter().find(|l| l.id == id)
    }

    /// Segment and station-capacity conflicts.
    pub fn placement_conflicts(&self, candidate: Candidate<'_>, existing: &[Train]) -> Vec<Conflict> {
        let mut conflicts = segment_conflicts(candidate, existing);
        conflicts.extend(capacity_conflicts(candidate, existing, self.graph, self.config));
        conflicts
    }

    /// Double-bookings of the candidate's lead locomotive.
    pub fn locomotive_conflicts(&self, candidate: Candidate<'_>, existing: &[Train]) -> Vec<Conflict> {
        match candidate.lead.and_then(|id| self.locomotive(id)) {
            Some(locomotive) => locomotive_conflicts(candidate, locomotive, existing),
            None => Vec::new(),
        }
    }

    /// Every conflict the candidate would introduce.
    pub fn check(&self, candidate: Candidate<'_>, existing: &[Train]) -> Vec<Conflict> {
        let mut conflicts = self.placement_conflicts(candidate, existing);
        conflicts.extend(self.locomotive_conflicts(candidate, existing));
        conflicts
    }

    /// Audit the persisted timetable.
    ///
    /// Segment and locomotive conflicts are reported once per pair of
    /// trains. Capacity is checked for every active train against all the
    /// others and reported once per station and set of trains involved.
    pub fn audit(&self, trains: &[Train]) -> ConflictReport {
        let active: Vec<&Train> = trains.iter().filter(|t| t.is_active).collect();
        let mut conflicts = Vec::new();
        let mut crowded: BTreeSet<(StationId, Vec<TrainRef>)> = BTreeSet::new();

        for (i, train) in active.iter().enumerate() {
            let later: Vec<Train> = active[i + 1..].iter().map(|t| (*t).clone()).collect();
            let candidate = Candidate::from(*train);
            conflicts.extend(segment_conflicts(candidate, &later));
            conflicts.extend(self.locomotive_conflicts(candidate, &later));

            for conflict in capacity_conflicts(candidate, trains, self.graph, self.config) {
                if let Conflict::Capacity {
                    station,
                    train,
                    occupied_by,
                    ..
                } = &conflict
                {
                    let mut involved = occupied_by.clone();
                    involved.push(train.clone());
                    involved.sort();
                    if !crowded.insert((*station, involved)) {
                        continue;
                    }
                }
                conflicts.push(conflict);
            }
        }

        debug!(trains = active.len(), conflicts = conflicts.len(), "audited timetable");

        ConflictReport {
            trains_checked: active.len(),
            conflicts,
        }
    }
}
