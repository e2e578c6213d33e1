//! The residual braid: an element of the Artin braid group on the strands
//! currently on the machine, used to lower-bound the number of transfer
//! passes remaining.
//!
//! Per spec.md §1/§6 the real braid algebra kernel (`CBraid`, computing
//! true Garside normal form) is an external collaborator and explicitly
//! out of scope — only its contract matters. `ArtinBraid` below is a
//! minimal, self-contained stand-in that fulfills that contract (strand
//! count, left-multiplication by a positive/negative generator,
//! permutation tracking, merge of adjacent strands, a hash and an
//! equality) well enough to drive the planner and its tests, but it is
//! not a port of CBraid's Garside reduction: it only cancels a newly
//! appended factor against its exact inverse, rather than computing a
//! true left-greedy normal form. See DESIGN.md for the consequence this
//! has on heuristic admissibility.

use crate::util::hash_combine;
use std::hash::{Hash, Hasher};

/// A permutation of `0..n`, represented as the image of each index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Permutation {
    images: Vec<usize>,
}

impl Permutation {
    pub fn identity(n: usize) -> Self {
        Permutation {
            images: (0..n).collect(),
        }
    }

    pub fn from_images(images: Vec<usize>) -> Self {
        Permutation { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image(&self, i: usize) -> usize {
        self.images[i]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.images
    }

    pub fn inverse(&self) -> Permutation {
        let mut inv = vec![0usize; self.images.len()];
        for (i, &p) in self.images.iter().enumerate() {
            inv[p] = i;
        }
        Permutation { images: inv }
    }

    /// `(self ∘ other)[i] = self[other[i]]`: apply `other` first.
    pub fn compose(&self, other: &Permutation) -> Permutation {
        Permutation {
            images: other.images.iter().map(|&x| self.images[x]).collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.images.iter().enumerate().all(|(i, &p)| i == p)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Factor {
    perm: Permutation,
}

/// Element of the Artin braid group on a fixed number of strands.
///
/// `permutation` maps a strand's *birth rank* (its index in the machine
/// order of the state that first created this braid) to its *current*
/// machine-order rank, i.e. spec.md's `braid.permutation()`; the spec's
/// `braid.permutation_inverse()` is simply `self.permutation().inverse()`.
#[derive(Clone, Debug)]
pub struct ArtinBraid {
    strands: usize,
    permutation: Permutation,
    factors: Vec<Factor>,
}

impl ArtinBraid {
    pub fn identity(strands: usize) -> Self {
        ArtinBraid {
            strands,
            permutation: Permutation::identity(strands),
            factors: Vec::new(),
        }
    }

    pub fn strands(&self) -> usize {
        self.strands
    }

    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    /// Left-multiplies this braid by the generator induced by one racking
    /// step (spec.md §4.4), then reduces.
    pub fn left_multiply_racking(&mut self, post_to_pre: Permutation, descending: bool) {
        debug_assert_eq!(post_to_pre.len(), self.strands);
        let pre_to_post = post_to_pre.inverse();
        self.permutation = pre_to_post.compose(&self.permutation);
        self.factors.push(Factor { perm: post_to_pre });
        let _ = descending; // kept for API fidelity with spec §6 contract; our reduction is sign-agnostic
        self.make_mcf();
    }

    /// Garside reduction stand-in: repeatedly cancels the last two factors
    /// when they are exact inverses of one another.
    fn make_mcf(&mut self) {
        loop {
            let n = self.factors.len();
            if n < 2 {
                break;
            }
            let inverse_of_last = self.factors[n - 1].perm.inverse();
            if self.factors[n - 2].perm == inverse_of_last {
                self.factors.truncate(n - 2);
            } else {
                break;
            }
        }
    }

    /// Number of factors in the (reduced) canonical form: a lower bound on
    /// the number of transfer passes remaining.
    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }

    pub fn compare_with_identity(&self) -> bool {
        self.factors.is_empty() && self.permutation.is_identity()
    }

    /// Whether the strand at birth rank `k` can be merged with the strand
    /// at birth rank `k+1` (spec.md §4.2's `can_merge`). Our stand-in
    /// accepts any structurally valid adjacent pair; the real kernel would
    /// additionally check the pair is free of intervening crossings.
    pub fn can_merge(&self, k: usize) -> bool {
        k + 1 < self.strands
    }

    /// Permanently fuses birth-rank `k` and `k+1` into a single strand,
    /// reducing the strand count by one. Resets the factor list to empty:
    /// once two strands are permanently co-located they no longer
    /// contribute independent crossings, and zero is always an admissible
    /// (if conservative) lower bound going forward.
    pub fn merge(&mut self, k: usize) {
        assert!(self.can_merge(k));
        let removed_current = self.permutation.image(k + 1);
        let images: Vec<usize> = self
            .permutation
            .as_slice()
            .iter()
            .enumerate()
            .filter(|&(b, _)| b != k + 1)
            .map(|(_, &c)| if c > removed_current { c - 1 } else { c })
            .collect();
        self.strands -= 1;
        self.permutation = Permutation::from_images(images);
        self.factors.clear();
    }

    pub fn hash64(&self) -> u64 {
        let mut h = 0x0f0e_35c6_e3c3_19f8u64;
        h = hash_combine(h, self.strands as u64);
        for &p in self.permutation.as_slice() {
            h = hash_combine(h, p as u64);
        }
        h
    }
}

impl PartialEq for ArtinBraid {
    fn eq(&self, other: &Self) -> bool {
        self.strands == other.strands && self.permutation == other.permutation
    }
}
impl Eq for ArtinBraid {}

impl Hash for ArtinBraid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash64().hash(state)
    }
}

impl std::fmt::Display for ArtinBraid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<braid n={} factors={}>", self.strands, self.factors.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario S2 of spec.md §8: a single rack introduces one factor, and
    /// racking back to the original value cancels it exactly.
    #[test]
    fn s2_single_rack_then_undo_cancels() {
        let mut b = ArtinBraid::identity(3);
        assert!(b.compare_with_identity());

        // racking moved every loop's rank by one place: post_to_pre = [1,2,0]
        // (an arbitrary, but internally consistent, cyclic relabeling).
        let f = Permutation::from_images(vec![1, 2, 0]);
        b.left_multiply_racking(f.clone(), true);
        assert_eq!(b.factor_count(), 1);
        assert!(!b.compare_with_identity());

        // undo: the inverse relabeling.
        b.left_multiply_racking(f.inverse(), false);
        assert_eq!(b.factor_count(), 0);
        assert!(b.compare_with_identity());
    }

    #[test]
    fn permutation_inverse_round_trips() {
        let p = Permutation::from_images(vec![2, 0, 1]);
        let inv = p.inverse();
        assert!(p.compose(&inv).is_identity());
        assert!(inv.compose(&p).is_identity());
    }

    #[test]
    fn merge_reduces_strand_count_and_resets_factors() {
        let mut b = ArtinBraid::identity(4);
        let f = Permutation::from_images(vec![1, 0, 3, 2]);
        b.left_multiply_racking(f, true);
        assert_eq!(b.strands(), 4);
        assert!(b.can_merge(0));
        b.merge(0);
        assert_eq!(b.strands(), 3);
        assert_eq!(b.factor_count(), 0);
    }
}
