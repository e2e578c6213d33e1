//! Synthetic test-case generators and aggregate statistics. Grounded on
//! `examples/original_source/testgen.{h,cpp}`'s `TestCase`/`flat_lace`/
//! `simple_tube`, and on the teacher's use of an explicit-seed
//! `rand::StdRng` in its own generators (`planning/planning/src/
//! classical/heuristics.rs` test helpers) rather than thread-local
//! entropy, so a run is exactly reproducible from its seed.

use crate::braid::ArtinBraid;
use crate::error::Result;
use crate::machine::Machine;
use crate::planner::SearchResult;
use crate::state::{KnittingState, SlackConstraint};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::rc::Rc;

/// A source/target pair plus the slack constraints active on the source,
/// ready to be attempted by the planner.
#[derive(Clone, Debug)]
pub struct TestCase {
    pub name: String,
    pub machine: Machine,
    pub source_back: Vec<u32>,
    pub source_front: Vec<u32>,
    pub target_back: Vec<u32>,
    pub target_front: Vec<u32>,
    pub slack: Vec<SlackConstraint>,
}

impl TestCase {
    /// Builds the runnable `(source, target)` pair, attaching the target
    /// to the source (spec.md §4.3).
    pub fn build(&self) -> Result<(KnittingState, Rc<KnittingState>)> {
        // Both beds are assumed unstacked at construction time (at most one
        // loop per needle), so their occupied-needle count and their total
        // loop count coincide and agree between source and target.
        let strands = KnittingState::strand_count_for(&self.source_back, &self.source_front);
        debug_assert_eq!(
            strands,
            KnittingState::strand_count_for(&self.target_back, &self.target_front),
            "source and target must start with the same number of loops"
        );
        let target = Rc::new(KnittingState::new(
            self.machine,
            &self.target_back,
            &self.target_front,
            ArtinBraid::identity(strands),
            vec![],
        ));
        let mut source = KnittingState::new(
            self.machine,
            &self.source_back,
            &self.source_front,
            ArtinBraid::identity(strands),
            self.slack.clone(),
        );
        source.set_target(target.clone())?;
        Ok((source, target))
    }

    /// The trivial test case: source already equal to target, width
    /// `width`, every needle on the front bed holding one loop. Useful as
    /// a zero-length baseline when sanity-checking a planner run.
    pub fn test_id(width: usize, racking_bound: i32) -> Self {
        TestCase {
            name: format!("id-w{width}"),
            machine: Machine::new(width, -racking_bound, racking_bound, 0).unwrap(),
            source_back: vec![0; width],
            source_front: vec![1; width],
            target_back: vec![0; width],
            target_front: vec![1; width],
            slack: vec![],
        }
    }

    /// A lace-like pattern: loops start in a single row and fan out to
    /// alternating needles on the target row, a shape that forces several
    /// transfers and rackings to resolve.
    pub fn flat_lace(width: usize, racking_bound: i32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut source_front = vec![0u32; width];
        let mut target_front = vec![0u32; width];
        for i in 0..width {
            source_front[i] = 1;
            target_front[i] = if i % 2 == 0 { 1 } else { 0 };
        }
        // scatter the odd-indexed loops onto the back bed as the target.
        let mut target_back = vec![0u32; width];
        for i in (1..width).step_by(2) {
            target_back[i] = 1;
        }
        // shuffle a handful of source positions to vary the instance by seed.
        if width > 1 {
            let i = rng.gen_range(0..width);
            let j = rng.gen_range(0..width);
            source_front.swap(i, j);
        }
        TestCase {
            name: format!("flat-lace-w{width}-seed{seed}"),
            machine: Machine::new(width, -racking_bound, racking_bound, 0).unwrap(),
            source_back: vec![0; width],
            source_front,
            target_back,
            target_front,
            slack: vec![],
        }
    }

    /// A tube pattern: loops alternate between the two beds at the
    /// source and are gathered onto a single bed at the target, with a
    /// slack constraint between adjacent stitches (a tube's fixed
    /// circumference).
    pub fn simple_tube(width: usize, racking_bound: i32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let machine = Machine::new(width, -racking_bound, racking_bound, 0).unwrap();
        let mut source_back = vec![0u32; width];
        let mut source_front = vec![0u32; width];
        for i in 0..width {
            if i % 2 == 0 {
                source_back[i] = 1;
            } else {
                source_front[i] = 1;
            }
        }
        let target_back = vec![0u32; width];
        let target_front = vec![1u32; width];

        let mut slack = Vec::new();
        let limit = rng.gen_range(2..=4);
        for i in 0..width.saturating_sub(1) {
            slack.push(SlackConstraint::new(
                crate::machine::NeedleLabel::new(true, i as i32),
                crate::machine::NeedleLabel::new(true, i as i32 + 1),
                limit,
            ));
        }

        TestCase {
            name: format!("simple-tube-w{width}-seed{seed}"),
            machine,
            source_back,
            source_front,
            target_back,
            target_front,
            slack,
        }
    }
}

/// Aggregate statistics over a batch of planner runs, backing the CLI's
/// `stats` subcommand.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub count: usize,
    pub total_path_length: u64,
    pub total_search_tree_size: usize,
    pub total_seconds: f64,
}

impl Stats {
    pub fn summarize(results: &[SearchResult]) -> Self {
        let mut s = Stats::default();
        for r in results {
            s.count += 1;
            s.total_path_length += r.path_length as u64;
            s.total_search_tree_size += r.search_tree_size;
            s.total_seconds += r.seconds_taken;
        }
        s
    }

    pub fn mean_path_length(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_path_length as f64 / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_already_solved() {
        let case = TestCase::test_id(4, 2);
        let (source, target) = case.build().unwrap();
        assert_eq!(source, *target);
    }

    #[test]
    fn flat_lace_is_deterministic_given_a_seed() {
        let a = TestCase::flat_lace(6, 3, 42);
        let b = TestCase::flat_lace(6, 3, 42);
        assert_eq!(a.source_front, b.source_front);
        assert_eq!(a.target_back, b.target_back);
    }

    #[test]
    fn simple_tube_respects_slack_width() {
        let case = TestCase::simple_tube(5, 3, 7);
        assert_eq!(case.slack.len(), 4);
        let (source, _) = case.build().unwrap();
        for c in &source.slack {
            assert!(c.respected(0));
        }
    }

    #[test]
    fn stats_summarize_empty_is_zero() {
        let stats = Stats::summarize(&[]);
        assert_eq!(stats.mean_path_length(), 0.0);
    }
}
