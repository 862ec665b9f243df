//! Segment occupancy conflicts.

use tracing::trace;

use super::{Candidate, Conflict};
use crate::domain::{Train, legs};

/// Overlapping legs of two schedules on the same segment.
///
/// Direction does not matter: A->B and B->A share the A-B segment. A
/// schedule never conflicts with itself.
pub fn segment_overlaps(a: Candidate<'_>, b: Candidate<'_>) -> Vec<Conflict> {
    if (a.id.is_some() && a.id == b.id) || a.number == b.number {
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for leg in legs(a.stops) {
        for other in legs(b.stops) {
            if leg.segment != other.segment {
                continue;
            }
            if let Some(window) = leg.window.overlap(&other.window) {
                trace!(segment = %leg.segment, %window, train = %a.number, other = %b.number, "segment overlap");
                conflicts.push(Conflict::Segment {
                    segment: leg.segment,
                    train: a.train_ref(),
                    other: b.train_ref(),
                    window,
                });
            }
        }
    }
    conflicts
}

/// Segment conflicts between a candidate and every other active train.
pub fn segment_conflicts(candidate: Candidate<'_>, existing: &[Train]) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|t| t.is_active && !candidate.is(t))
        .flat_map(|t| segment_overlaps(candidate, Candidate::from(t)))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::test_support::{stops_between, train};
    use proptest::prelude::*;

    prop_compose! {
        fn departure()(hour in 5u32..22, minute in 0u32..60) -> String {
            format!("{:02}:{:02}", hour, minute)
        }
    }

    proptest! {
        /// Overlap detection is commutative for any two runs on the network
        #[test]
        fn commutative(d1 in departure(), d2 in departure(), reverse in any::<bool>()) {
            let a = train(1, "X1", stops_between("A", "C", &d1), 1);
            let b = if reverse {
                train(2, "X2", stops_between("C", "A", &d2), 2)
            } else {
                train(2, "X2", stops_between("A", "C", &d2), 2)
            };
            let forward = segment_overlaps((&a).into(), (&b).into()).len();
            let backward = segment_overlaps((&b).into(), (&a).into()).len();
            prop_assert_eq!(forward, backward);
        }

        /// A run never conflicts with itself
        #[test]
        fn no_self_conflict(d in departure()) {
            let a = train(1, "X1", stops_between("A", "C", &d), 1);
            prop_assert!(segment_overlaps((&a).into(), (&a).into()).is_empty());
        }
    }
}
