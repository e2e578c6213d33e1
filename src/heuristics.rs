//! Admissible lower-bound estimators used to guide `a_star`/`ida_star`
//! (spec.md §6, §9 Open Question 3). Grounded on
//! `examples/original_source/knitting.{h,cpp}`'s heuristic functions and
//! on the teacher's `planning/planning/src/classical/heuristics.rs` for
//! how several interchangeable estimators share one small enum-dispatch
//! surface rather than a trait object per call site.

use crate::prebuilt::PrebuiltTable;
use crate::state::KnittingState;
use crate::util::log_offsets;

/// Which lower bound to use during search.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Heuristic {
    /// Always zero: reduces `a_star`/`ida_star` to uniform-cost search.
    No,
    /// Zero at the target, one everywhere else.
    Target,
    /// The residual braid's factor count (spec.md §6.1).
    Braid,
    /// `log_offsets` of the state's offset signature (spec.md §6.2).
    Log,
    /// Exact lookup into a [`PrebuiltTable`] (spec.md §6.3).
    Prebuilt,
    /// `max(braid, log)`.
    BraidLog,
    /// `max(braid, prebuilt)`.
    BraidPrebuilt,
}

impl Heuristic {
    /// Estimates the remaining cost from `state` to its attached target.
    /// `table` is required (and must cover `state`'s racking bounds and a
    /// sufficient step budget) for [`Heuristic::Prebuilt`] and
    /// [`Heuristic::BraidPrebuilt`]; it is ignored otherwise.
    pub fn estimate(&self, state: &KnittingState, table: Option<&PrebuiltTable>) -> u32 {
        match self {
            Heuristic::No => 0,
            Heuristic::Target => u32::from(state.target.as_deref() != Some(state)),
            Heuristic::Braid => braid_lower_bound(state),
            Heuristic::Log => log_lower_bound(state),
            Heuristic::Prebuilt => prebuilt_lower_bound(state, table.expect("prebuilt table required")),
            Heuristic::BraidLog => braid_lower_bound(state).max(log_lower_bound(state)),
            Heuristic::BraidPrebuilt => braid_lower_bound(state)
                .max(prebuilt_lower_bound(state, table.expect("prebuilt table required"))),
        }
    }
}

fn braid_lower_bound(state: &KnittingState) -> u32 {
    state.braid.factor_count() as u32
}

fn log_lower_bound(state: &KnittingState) -> u32 {
    log_offsets(state.offsets())
}

fn prebuilt_lower_bound(state: &KnittingState, table: &PrebuiltTable) -> u32 {
    table.query(state.offsets(), state.racking())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::braid::ArtinBraid;
    use crate::enumerator::simple_adjacent;
    use crate::machine::Machine;
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    /// Brute-force shortest path length under `simple_adjacent`, used only
    /// to check admissibility on state spaces small enough to enumerate
    /// exhaustively.
    fn bfs_distance(start: &KnittingState, target: &KnittingState) -> Option<u32> {
        let mut dist = HashMap::new();
        let mut queue = VecDeque::new();
        dist.insert(start.clone(), 0u32);
        queue.push_back(start.clone());
        while let Some(s) = queue.pop_front() {
            let d = dist[&s];
            if s == *target {
                return Some(d);
            }
            for (next, w, _) in simple_adjacent(&s) {
                let nd = d + w;
                if dist.get(&next).map_or(true, |&cur| nd < cur) {
                    dist.insert(next.clone(), nd);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn target_rack(width: usize, bound: i32, back: &[u32], front: &[u32]) -> Rc<KnittingState> {
        let strands = KnittingState::strand_count_for(back, front);
        Rc::new(KnittingState::new(
            Machine::new(width, -bound, bound, 0).unwrap(),
            back,
            front,
            ArtinBraid::identity(strands),
            vec![],
        ))
    }

    /// Scenario S4 of spec.md §8: a state one rack away from its target
    /// has braid-factor-count 1, matching the true optimal distance.
    #[test]
    fn s4_braid_heuristic_matches_optimum_one_rack_away() {
        let target = target_rack(3, 2, &[0, 0, 0], &[1, 1, 1]);
        let mut start = KnittingState::new(
            target.machine,
            &[0, 0, 0],
            &[1, 1, 1],
            ArtinBraid::identity(3),
            vec![],
        );
        start.rack(1);
        start.set_target(target.clone()).unwrap();

        let true_dist = bfs_distance(&start, &target).unwrap();
        let h = Heuristic::Braid.estimate(&start, None);
        assert!(h <= true_dist, "braid heuristic {h} must not exceed true distance {true_dist}");
    }

    /// Property 3 of spec.md §8: every heuristic here is a lower bound on
    /// true remaining cost, checked over the small reachable space of a
    /// single-transfer scenario. `Heuristic::Target` is checked separately
    /// below rather than in this loop: spec.md §4.7 defines it as exactly
    /// 1 away from the target everywhere else, but since `simple_adjacent`
    /// transfers carry weight 0 (§4.5), a state reachable via nothing but
    /// a free transfer-set has true optimal cost 0 while `Target` still
    /// reads 1 there — the same trivial-heuristic behavior
    /// `examples/original_source/knitting.cpp`'s `target_heuristic` has,
    /// and exactly what §4.9's "heuristics need not be consistent w.r.t.
    /// weight 0 edges" carve-out is for.
    #[test]
    fn heuristics_are_admissible_on_a_single_transfer_scenario() {
        let target = target_rack(2, 1, &[0, 0], &[1, 1]);
        let mut start = KnittingState::new(
            target.machine,
            &[1, 0],
            &[0, 1],
            ArtinBraid::identity(2),
            vec![],
        );
        start.set_target(target.clone()).unwrap();

        let true_dist = bfs_distance(&start, &target).unwrap();
        for h in [Heuristic::No, Heuristic::Braid, Heuristic::Log] {
            let v = h.estimate(&start, None);
            assert!(v <= true_dist, "{h:?} estimate {v} exceeds true distance {true_dist}");
        }
    }

    #[test]
    fn target_heuristic_is_zero_exactly_at_target() {
        let target = target_rack(2, 1, &[0, 0], &[1, 1]);
        let mut at_target = KnittingState::new(
            target.machine,
            &[0, 0],
            &[1, 1],
            ArtinBraid::identity(2),
            vec![],
        );
        at_target.set_target(target.clone()).unwrap();
        assert_eq!(Heuristic::Target.estimate(&at_target, None), 0);
    }
}
