//! Route synthesis for batch generation.
//!
//! Routes are random walks along active connections that never revisit a
//! station. The walk is driven by a seeded ChaCha8 generator so a given
//! seed and network always produce the same routes.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::domain::StationId;
use crate::network::{NetworkGraph, RouteResult};

/// Attempts per requested route before giving up on a sparse network.
const ATTEMPTS_PER_ROUTE: usize = 20;

/// Bounds for synthesised routes.
#[derive(Debug, Clone, Copy)]
pub struct WalkLimits {
    pub min_stations: usize,
    pub max_stations: usize,
    pub max_routes: usize,
}

/// Synthesise up to `limits.max_routes` distinct routes.
pub fn synthesize_routes(
    graph: &NetworkGraph,
    limits: WalkLimits,
    rng: &mut ChaCha8Rng,
) -> Vec<RouteResult> {
    let starts: Vec<StationId> = graph
        .station_ids()
        .filter(|s| !graph.neighbours(s).is_empty())
        .collect();
    if starts.is_empty() || limits.max_stations < 2 {
        return Vec::new();
    }
    let min_stations = limits.min_stations.max(2);

    let mut seen: HashSet<Vec<StationId>> = HashSet::new();
    let mut routes = Vec::new();

    for _ in 0..limits.max_routes * ATTEMPTS_PER_ROUTE {
        if routes.len() >= limits.max_routes {
            break;
        }

        let Some(&start) = starts.choose(rng) else {
            break;
        };
        let target = rng.gen_range(min_stations..=limits.max_stations.max(min_stations));
        let path = random_walk(graph, start, target, rng);

        if path.len() < min_stations || !seen.insert(path.clone()) {
            continue;
        }
        if let Some(route) = RouteResult::along(graph, &path) {
            routes.push(route);
        }
    }

    debug!(routes = routes.len(), "synthesised routes");
    routes
}

fn random_walk(
    graph: &NetworkGraph,
    start: StationId,
    target: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<StationId> {
    let mut path = vec![start];
    while path.len() < target {
        let Some(&current) = path.last() else {
            break;
        };
        let options: Vec<StationId> = graph
            .neighbours(&current)
            .iter()
            .map(|e| e.to())
            .filter(|s| !path.contains(s))
            .collect();
        match options.choose(rng) {
            Some(&next) => path.push(next),
            None => break,
        }
    }
    path
}

/// Pick `count` routes at random; all of them if there are fewer.
pub fn sample_routes(routes: &[RouteResult], count: usize, rng: &mut ChaCha8Rng) -> Vec<RouteResult> {
    routes.choose_multiple(rng, count).cloned().collect()
}
