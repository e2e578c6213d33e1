//! Bed contents, residual braid and slack constraints: the planner's state
//! type. Grounded on `examples/original_source/knitting.{h,cpp}`'s
//! `Needle`/`KnittingState` and on the teacher's `planning/planning/src/
//! classical/state.rs` for how a compact planning state exposes
//! equality/hashing to a search.
//!
//! One naming note vs. spec.md §3's prose: the original source (and this
//! port) give the residual braid one strand per *occupied needle group*,
//! not one strand per individual loop — a needle holding a stack of `n`
//! loops still contributes a single strand, and `n` is carried purely as
//! a multiplicity that travels with that strand as a block (spec.md
//! §4.4's tie-break: "the relative order of strands is preserved"). This
//! is what lets `needle_with_braid_rank`/`calculate_destinations` below
//! match the original bit for bit. See DESIGN.md for the reasoning.

use crate::braid::{ArtinBraid, Permutation};
use crate::error::{KnittingError, Result};
use crate::machine::{Machine, NeedleLabel};
use crate::util::hash_combine;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Loops sitting on one needle, and where (in the target) they belong.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Needle {
    pub count: u32,
    pub destination: NeedleLabel,
}

impl Needle {
    pub fn empty() -> Self {
        Needle {
            count: 0,
            destination: NeedleLabel::new(false, -1),
        }
    }
    pub fn with_count(count: u32) -> Self {
        Needle {
            count,
            ..Needle::empty()
        }
    }
}

pub type Bed = Vec<Needle>;

/// Maximum permitted horizontal separation between two needles, at any
/// active racking.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SlackConstraint {
    pub needle_1: NeedleLabel,
    pub needle_2: NeedleLabel,
    pub limit: i32,
}

impl SlackConstraint {
    pub fn new(needle_1: NeedleLabel, needle_2: NeedleLabel, limit: i32) -> Self {
        SlackConstraint {
            needle_1,
            needle_2,
            limit,
        }
    }

    pub fn respected(&self, racking: i32) -> bool {
        (self.needle_1.location(racking) - self.needle_2.location(racking)).abs() <= self.limit
    }

    fn replace(&mut self, from: NeedleLabel, to: NeedleLabel) {
        if self.needle_1 == from {
            self.needle_1 = to;
        }
        if self.needle_2 == from {
            self.needle_2 = to;
        }
    }
}

/// A planning state: machine configuration, both beds, the residual
/// braid and the active slack constraints, plus a (non-owning, per
/// spec.md's Design Notes) handle to the target state destinations were
/// computed from.
#[derive(Clone, Debug)]
pub struct KnittingState {
    pub machine: Machine,
    pub back: Bed,
    pub front: Bed,
    pub braid: ArtinBraid,
    pub slack: Vec<SlackConstraint>,
    pub target: Option<Rc<KnittingState>>,
}

impl KnittingState {
    /// Builds a state with no target attached yet; call [`Self::set_target`]
    /// separately (spec.md §4.3 destination assignment runs once, at that
    /// point).
    pub fn new(
        machine: Machine,
        back_counts: &[u32],
        front_counts: &[u32],
        braid: ArtinBraid,
        slack: Vec<SlackConstraint>,
    ) -> Self {
        assert_eq!(back_counts.len(), machine.width);
        assert_eq!(front_counts.len(), machine.width);
        KnittingState {
            back: back_counts.iter().map(|&c| Needle::with_count(c)).collect(),
            front: front_counts.iter().map(|&c| Needle::with_count(c)).collect(),
            machine,
            braid,
            slack,
            target: None,
        }
    }

    pub fn racking(&self) -> i32 {
        self.machine.racking
    }

    /// The braid strand count a state with these bed contents must be
    /// constructed with: one strand per occupied needle group, not one
    /// per loop (see DESIGN.md's resolution of spec.md §3's strand
    /// count against what the original source actually tracks).
    pub fn strand_count_for(back_counts: &[u32], front_counts: &[u32]) -> usize {
        back_counts.iter().chain(front_counts.iter()).filter(|&&c| c > 0).count()
    }

    pub fn loop_count(&self, n: NeedleLabel) -> u32 {
        if n.front {
            self.front[n.i as usize].count
        } else {
            self.back[n.i as usize].count
        }
    }

    fn loop_count_mut(&mut self, n: NeedleLabel) -> &mut u32 {
        if n.front {
            &mut self.front[n.i as usize].count
        } else {
            &mut self.back[n.i as usize].count
        }
    }

    pub fn destination(&self, n: NeedleLabel) -> NeedleLabel {
        if n.front {
            self.front[n.i as usize].destination
        } else {
            self.back[n.i as usize].destination
        }
    }

    fn set_destination(&mut self, n: NeedleLabel, dest: NeedleLabel) {
        if n.front {
            self.front[n.i as usize].destination = dest;
        } else {
            self.back[n.i as usize].destination = dest;
        }
    }

    /// The `rank`-th loop-bearing needle in machine order (spec.md §4.3).
    pub fn needle_with_braid_rank(&self, rank: usize) -> Result<NeedleLabel> {
        let mut j = 0usize;
        for i in 0..2 * self.machine.width as i32 {
            let needle = self.machine.needle_at(i);
            if self.loop_count(needle) > 0 {
                if j == rank {
                    return Ok(needle);
                }
                j += 1;
            }
        }
        Err(KnittingError::InvalidBraidRank(rank))
    }

    /// Number of loop-bearing needles strictly preceding `needle` in
    /// machine order: its rank for braid-lookup purposes.
    fn rank_of(&self, needle: NeedleLabel) -> usize {
        let mut j = 0usize;
        for i in 0..2 * self.machine.width as i32 {
            let n = self.machine.needle_at(i);
            if n == needle {
                break;
            }
            if self.loop_count(n) > 0 {
                j += 1;
            }
        }
        j
    }

    /// Attaches `target` and computes every loop's destination from it
    /// (spec.md §4.3). Fails with `InvalidTargetState` if `target`'s braid
    /// is not the identity, or if a needle's loops would have to straddle
    /// two distinct destinations.
    pub fn set_target(&mut self, target: Rc<KnittingState>) -> Result<()> {
        if !target.braid.compare_with_identity() {
            return Err(KnittingError::InvalidTargetState);
        }
        self.target = Some(target);
        self.calculate_destinations()
    }

    fn calculate_destinations(&mut self) -> Result<()> {
        let target = self.target.clone().expect("set_target sets target first");
        let perm_inv = self.braid.permutation().inverse();

        let mut dest = NeedleLabel::new(false, 0);
        let mut left: i64 = 0;
        let mut j: i64 = -1;
        for i in 0..2 * self.machine.width as i32 {
            let needle = self.machine.needle_at(i);
            while self.loop_count(needle) as i64 > left {
                if left != 0 {
                    return Err(KnittingError::InvalidTargetState);
                }
                j += 1;
                let birth_rank = perm_inv.image(j as usize);
                dest = target.needle_with_braid_rank(birth_rank)?;
                left = target.loop_count(dest) as i64;
            }
            self.set_destination(needle, dest);
            left -= self.loop_count(needle) as i64;
        }
        Ok(())
    }

    /// Whether a transfer at aligned position `loc` is currently legal
    /// (spec.md §4.2).
    pub fn can_transfer(&self, loc: i32) -> bool {
        let back_needle = NeedleLabel::new(false, loc - self.machine.racking);
        let front_needle = NeedleLabel::new(true, loc);
        let fc = self.loop_count(front_needle);
        let bc = self.loop_count(back_needle);
        if fc == 0 && bc == 0 {
            return false;
        }
        if fc == 0 || bc == 0 {
            return true;
        }
        if self.destination(front_needle) != self.destination(back_needle) {
            return false;
        }
        let j = self.rank_of(back_needle);
        let birth = self.braid.permutation().inverse().image(j);
        self.braid.can_merge(birth)
    }

    /// Moves the loops on one side of aligned position `loc` onto the
    /// other side (spec.md §4.2). Returns `false` (state unchanged) if the
    /// transfer is illegal.
    pub fn transfer(&mut self, loc: i32, to_front: bool) -> bool {
        let back_needle = NeedleLabel::new(false, loc - self.machine.racking);
        let front_needle = NeedleLabel::new(true, loc);

        if self.loop_count(front_needle) > 0 && self.loop_count(back_needle) > 0 {
            if self.destination(front_needle) != self.destination(back_needle) {
                return false;
            }
            let j = self.rank_of(back_needle);
            let birth = self.braid.permutation().inverse().image(j);
            if !self.braid.can_merge(birth) {
                return false;
            }
            self.braid.merge(birth);
        }

        if to_front {
            let moved = self.loop_count(back_needle);
            let dest = self.destination(back_needle);
            *self.loop_count_mut(front_needle) += moved;
            self.set_destination(front_needle, dest);
            *self.loop_count_mut(back_needle) = 0;
            for c in &mut self.slack {
                c.replace(back_needle, front_needle);
            }
        } else {
            let moved = self.loop_count(front_needle);
            let dest = self.destination(front_needle);
            *self.loop_count_mut(back_needle) += moved;
            self.set_destination(back_needle, dest);
            *self.loop_count_mut(front_needle) = 0;
            for c in &mut self.slack {
                c.replace(front_needle, back_needle);
            }
        }
        true
    }

    /// Changes the racking to `new_racking` (spec.md §4.4), updating the
    /// residual braid. Returns `false` (state unchanged) if `new_racking`
    /// is out of bounds or violates a slack constraint.
    pub fn rack(&mut self, new_racking: i32) -> bool {
        if new_racking > self.machine.max_racking || new_racking < self.machine.min_racking {
            return false;
        }
        if new_racking == self.machine.racking {
            return true;
        }
        for c in &self.slack {
            if !c.respected(new_racking) {
                return false;
            }
        }

        let w = self.machine.width as i32;
        let old_racking = self.machine.racking;
        let strands = self.braid.strands();

        let mut positions_by_id = vec![0usize; 2 * self.machine.width];
        {
            let mut j = 0usize;
            for i in 0..2 * w {
                let needle = self.machine.needle_at(i);
                if self.loop_count(needle) > 0 {
                    positions_by_id[needle.id() as usize] = j;
                    j += 1;
                }
            }
        }

        self.machine.racking = new_racking;

        let mut f_images = vec![0usize; strands];
        let mut j = 0usize;
        for i in 0..2 * w {
            let needle = self.machine.needle_at(i);
            if self.loop_count(needle) > 0 {
                f_images[j] = positions_by_id[needle.id() as usize];
                j += 1;
            }
        }
        let descending = new_racking < old_racking;
        self.braid
            .left_multiply_racking(Permutation::from_images(f_images), descending);
        true
    }

    /// Transfers every aligned position where the back needle is occupied
    /// and the front is empty, collapsing free back-to-front motions
    /// (spec.md §4.6). A no-op returning `false` if this state already
    /// equals its target.
    pub fn canonicalize(&mut self) -> bool {
        if let Some(target) = self.target.clone() {
            if *self == *target {
                return false;
            }
        }
        let racking = self.machine.racking;
        let lo = racking.max(0);
        let hi = self.machine.width as i32 + racking.min(0);
        for i in lo..hi {
            let back_needle = NeedleLabel::new(false, i - racking);
            let front_needle = NeedleLabel::new(true, i);
            if self.loop_count(back_needle) > 0 && self.loop_count(front_needle) == 0 {
                self.transfer(i, true);
            }
        }
        true
    }

    /// The 65-bit (`u64`) offset signature of spec.md §4.7.
    pub fn offsets(&self) -> u64 {
        let mut offs = 0u64;
        for i in 0..2 * self.machine.width as i32 {
            let needle = self.machine.needle_at(i);
            if self.loop_count(needle) == 0 {
                continue;
            }
            let off = needle.offset(self.destination(needle));
            if off != 0 && (-32..32).contains(&off) {
                offs |= 1u64 << (off + 32);
            }
        }
        offs
    }

    /// Every state reachable from `self` by a single rack, including
    /// `self` itself (racking unchanged always succeeds). Spec.md §4.9's
    /// "Multiple sources model 'all_rackings'": the normal way to seed a
    /// search is with this set rather than `self` alone, matching
    /// `examples/original_source/main.cpp`'s `source.all_rackings()`.
    pub fn all_rackings(&self) -> Vec<KnittingState> {
        let mut v = Vec::new();
        for r in self.machine.min_racking..=self.machine.max_racking {
            let mut s = self.clone();
            if s.rack(r) {
                v.push(s);
            }
        }
        v
    }

}

impl PartialEq for KnittingState {
    fn eq(&self, other: &Self) -> bool {
        if self.machine.racking != other.machine.racking {
            return false;
        }
        for i in 0..self.machine.width {
            if self.back[i].count != other.back[i].count || self.front[i].count != other.front[i].count {
                return false;
            }
        }
        self.braid == other.braid
    }
}
impl Eq for KnittingState {}

impl Hash for KnittingState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut h = 0x0f0e_35c6_e3c3_19f8u64;
        h = hash_combine(h, self.machine.racking as u64);
        for n in &self.back {
            h = hash_combine(h, n.count as u64);
        }
        for n in &self.front {
            h = hash_combine(h, n.count as u64);
        }
        h = hash_combine(h, self.braid.hash64());
        h.hash(state)
    }
}

impl std::fmt::Display for KnittingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let racking = self.machine.racking;
        for _ in 0..racking.max(0) {
            write!(f, "  ")?;
        }
        write!(f, "[")?;
        for (i, n) in self.back.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", n.count)?;
        }
        writeln!(f, "]")?;
        for _ in 0..(-racking).max(0) {
            write!(f, "  ")?;
        }
        write!(f, "[")?;
        for (i, n) in self.front.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", n.count)?;
        }
        write!(f, "] {}", self.braid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::braid::ArtinBraid;

    fn simple_machine(width: usize, bound: i32) -> Machine {
        Machine::new(width, -bound, bound, 0).unwrap()
    }

    /// Scenario S2 of spec.md §8.
    #[test]
    fn s2_single_rack_changes_braid() {
        let machine = simple_machine(3, 2);
        let mut s = KnittingState::new(
            machine,
            &[0, 0, 0],
            &[1, 1, 1],
            ArtinBraid::identity(3),
            vec![],
        );
        assert!(s.braid.compare_with_identity());
        assert!(s.rack(-1));
        assert_eq!(s.braid.factor_count(), 1);
        assert!(s.rack(1));
        assert!(s.braid.compare_with_identity());
    }

    /// Scenario S3 of spec.md §8.
    #[test]
    fn s3_slack_rejects_a_rack() {
        let machine = simple_machine(3, 2);
        let f0 = NeedleLabel::new(true, 0);
        let f1 = NeedleLabel::new(true, 1);
        let mut s = KnittingState::new(
            machine,
            &[0, 0, 0],
            &[1, 1, 0],
            ArtinBraid::identity(2),
            vec![SlackConstraint::new(f0, f1, 1)],
        );
        assert!(s.rack(-1));
        assert!(s.transfer(0, false));
        assert_eq!(s.slack[0].needle_1, NeedleLabel::new(false, 0 - s.machine.racking));
        assert!(s.rack(-1));
        assert!(!s.rack(-2));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let machine = simple_machine(3, 2);
        let mut s = KnittingState::new(
            machine,
            &[1, 0, 1],
            &[0, 1, 0],
            ArtinBraid::identity(3),
            vec![],
        );
        s.canonicalize();
        let once = s.clone();
        s.canonicalize();
        assert_eq!(once.back, s.back);
        assert_eq!(once.front, s.front);
    }

    #[test]
    fn two_consecutive_identical_rackings_compose() {
        let machine = simple_machine(4, 2);
        let mut a = KnittingState::new(
            machine,
            &[0, 0, 0, 0],
            &[1, 1, 1, 1],
            ArtinBraid::identity(4),
            vec![],
        );
        let mut b = a.clone();
        a.rack(1);
        a.rack(-1);
        b.rack(-1);
        assert_eq!(a, b);
    }
}
