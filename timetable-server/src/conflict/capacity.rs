//! Station track-capacity conflicts.

use std::collections::BTreeSet;

use tracing::trace;

use super::{Candidate, Conflict, TrainRef};
use crate::config::EngineConfig;
use crate::domain::{Stop, TimeWindow, Train};
use crate::network::NetworkGraph;

/// Window around a stop in which other trains count against capacity.
///
/// `[arrival - buffer, departure + buffer]`, where a terminus stop
/// (arrival == departure) is first stretched to the terminus floor.
fn occupancy_window(stop: &Stop, config: &EngineConfig) -> TimeWindow {
    let held_until = if stop.is_terminus() {
        stop.arrival + config.terminus_floor()
    } else {
        stop.departure
    };
    TimeWindow::new(
        stop.arrival.wrapping_sub(config.station_buffer()),
        held_until + config.station_buffer(),
    )
}

/// Capacity conflicts for every stop of the candidate.
///
/// At a station with `T` active tracks the candidate may share its window
/// with fewer than `effective_capacity(T)` other trains. A train counts if
/// its arrival or departure at the station falls inside the window. A stop
/// at a station without any active track is always a conflict.
pub fn capacity_conflicts(
    candidate: Candidate<'_>,
    existing: &[Train],
    graph: &NetworkGraph,
    config: &EngineConfig,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for stop in candidate.stops {
        let tracks = graph
            .station(&stop.station)
            .map(|s| s.active_track_count())
            .unwrap_or(0);

        if tracks == 0 {
            conflicts.push(Conflict::NoActiveTracks {
                station: stop.station,
                train: candidate.train_ref(),
            });
            continue;
        }

        let window = occupancy_window(stop, config);
        let occupied_by: BTreeSet<TrainRef> = existing
            .iter()
            .filter(|t| t.is_active && !candidate.is(t))
            .filter(|t| {
                t.stops.iter().any(|s| {
                    s.station == stop.station
                        && (window.contains_inclusive(s.arrival)
                            || window.contains_inclusive(s.departure))
                })
            })
            .map(TrainRef::from)
            .collect();

        let capacity = config.effective_capacity(tracks);
        trace!(
            station = %stop.station,
            %window,
            occupied = occupied_by.len(),
            capacity,
            "station capacity"
        );

        if occupied_by.len() >= capacity {
            conflicts.push(Conflict::Capacity {
                station: stop.station,
                train: candidate.train_ref(),
                window,
                capacity,
                occupied_by: occupied_by.into_iter().collect(),
            });
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopType;
    use crate::test_support::{abc_connections, id, station, stops_between, t, train};

    fn graph_with_b_tracks(tracks: u32) -> NetworkGraph {
        NetworkGraph::build(
            1,
            vec![station("A", 5), station("B", tracks), station("C", 5)],
            abc_connections(),
        )
    }

    fn conflicts_at_b(conflicts: &[Conflict]) -> usize {
        conflicts
            .iter()
            .filter(|c| matches!(c, Conflict::Capacity { station, .. } if *station == id("B")))
            .count()
    }

    #[test]
    fn two_tracks_hold_exactly_one_train() {
        let graph = graph_with_b_tracks(2);
        let config = EngineConfig::default();

        let first = train(1, "RE1", stops_between("A", "C", "08:00"), 1);
        let second = train(2, "RE2", stops_between("A", "C", "08:05"), 2);

        // The first train is alone
        let alone = capacity_conflicts((&first).into(), &[], &graph, &config);
        assert!(alone.is_empty());

        // A second one at B within the buffer window is rejected
        let conflicts = capacity_conflicts((&second).into(), &[first], &graph, &config);
        assert_eq!(conflicts_at_b(&conflicts), 1);
        match conflicts.iter().find(|c| matches!(c, Conflict::Capacity { .. })) {
            Some(Conflict::Capacity { capacity, occupied_by, .. }) => {
                assert_eq!(*capacity, 1);
                assert_eq!(occupied_by.len(), 1);
                assert_eq!(occupied_by[0].number.as_str(), "RE1");
            }
            other => panic!("expected capacity conflict, got {other:?}"),
        }
    }

    #[test]
    fn three_tracks_hold_two_trains() {
        let graph = graph_with_b_tracks(3);
        let config = EngineConfig::default();

        let first = train(1, "RE1", stops_between("A", "C", "08:00"), 1);
        let second = train(2, "RE2", stops_between("A", "C", "08:05"), 2);
        let third = train(3, "RE3", stops_between("A", "C", "08:08"), 3);

        let ok = capacity_conflicts((&second).into(), std::slice::from_ref(&first), &graph, &config);
        assert_eq!(conflicts_at_b(&ok), 0);

        let full = capacity_conflicts((&third).into(), &[first, second], &graph, &config);
        assert_eq!(conflicts_at_b(&full), 1);
    }

    #[test]
    fn trains_outside_buffer_do_not_count() {
        let graph = graph_with_b_tracks(2);
        let config = EngineConfig::default();

        // B at 08:12-08:14 vs 08:42-08:44: window [08:27, 08:59]
        let first = train(1, "RE1", stops_between("A", "C", "08:00"), 1);
        let later = train(2, "RE2", stops_between("A", "C", "08:30"), 2);
        let conflicts = capacity_conflicts((&later).into(), &[first], &graph, &config);
        assert_eq!(conflicts_at_b(&conflicts), 0);
    }

    #[test]
    fn terminus_floor_extends_window() {
        let config = EngineConfig::default();
        let stops = stops_between("A", "B", "08:00");
        let terminus = &stops[1];
        assert_eq!(terminus.stop_type, StopType::Destination);

        // Arrival 08:12: [07:57, 08:12 + 30 + 15]
        let window = occupancy_window(terminus, &config);
        assert_eq!(window, TimeWindow::new(t("07:57"), t("08:57")));

        let intermediate = &stops_between("A", "C", "08:00")[1];
        let window = occupancy_window(intermediate, &config);
        assert_eq!(window, TimeWindow::new(t("07:57"), t("08:29")));
    }

    #[test]
    fn station_without_active_tracks() {
        let graph = graph_with_b_tracks(0);
        let config = EngineConfig::default();
        let only = train(1, "RE1", stops_between("A", "C", "08:00"), 1);

        let conflicts = capacity_conflicts((&only).into(), &[], &graph, &config);
        assert_eq!(conflicts.len(), 1);
        assert!(matches!(
            &conflicts[0],
            Conflict::NoActiveTracks { station, .. } if *station == id("B")
        ));
    }

    #[test]
    fn window_wraps_midnight() {
        let config = EngineConfig::default();
        let stops = stops_between("A", "C", "00:02");
        let window = occupancy_window(&stops[0], &config);
        assert!(window.crosses_midnight());
        assert!(window.contains_inclusive(t("23:50")));
    }
}
