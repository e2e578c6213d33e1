//! The two-bed machine: width, racking bounds and the needle interleaving
//! order induced by the current racking. Grounded on
//! `examples/original_source/knitting.{h,cpp}`'s `KnittingMachine`.

use crate::error::{KnittingError, Result};

/// Identifies one of the `2*width` needles of a [`Machine`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NeedleLabel {
    pub front: bool,
    pub i: i32,
}

impl NeedleLabel {
    pub fn new(front: bool, i: i32) -> Self {
        NeedleLabel { front, i }
    }

    /// `2i+1` on the front bed, `2i` on the back bed.
    pub fn id(self) -> i64 {
        if self.front {
            2 * self.i as i64 + 1
        } else {
            2 * self.i as i64
        }
    }

    /// Physical position of this needle when the machine is racked at `racking`.
    pub fn location(self, racking: i32) -> i32 {
        if self.front {
            self.i
        } else {
            self.i + racking
        }
    }

    /// Signed horizontal distance from this needle to `destination`, measured
    /// on whichever bed `destination` lives on.
    pub fn offset(self, destination: NeedleLabel) -> i32 {
        if destination.front {
            self.i - destination.i
        } else {
            destination.i - self.i
        }
    }
}

impl std::fmt::Display for NeedleLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.front { 'f' } else { 'b' }, self.i)
    }
}

/// Width, racking bounds and current racking of a two-bed machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Machine {
    pub width: usize,
    pub min_racking: i32,
    pub max_racking: i32,
    pub racking: i32,
}

impl Machine {
    pub fn new(width: usize, min_racking: i32, max_racking: i32, racking: i32) -> Result<Self> {
        let w = width as i32;
        if max_racking >= w || min_racking <= -w {
            return Err(KnittingError::InvalidMachine {
                width,
                min: min_racking,
                max: max_racking,
            });
        }
        if racking > max_racking || racking < min_racking {
            return Err(KnittingError::InvalidRacking {
                racking,
                min: min_racking,
                max: max_racking,
            });
        }
        Ok(Machine {
            width,
            min_racking,
            max_racking,
            racking,
        })
    }

    /// The needle that machine-order position `i` (`0..2*width`) resolves to
    /// at the current racking. Implements the interleaving rule of spec §3:
    /// positions below `|racking|` are all on one bed, positions above
    /// `2*width - |racking|` are all on the other, and the remainder
    /// alternates back/front.
    pub fn needle_at(&self, i: i32) -> NeedleLabel {
        let r = self.racking;
        let abs_r = r.abs();
        let w = self.width as i32;

        if i < abs_r {
            return NeedleLabel::new(r > 0, i);
        }
        if i >= 2 * w - abs_r {
            return NeedleLabel::new(r < 0, i - w);
        }
        let i = i - abs_r;
        if i % 2 == 0 {
            if r > 0 {
                NeedleLabel::new(false, i / 2)
            } else {
                NeedleLabel::new(false, i / 2 - r)
            }
        } else if r > 0 {
            NeedleLabel::new(true, i / 2 + r)
        } else {
            NeedleLabel::new(true, i / 2)
        }
    }

    pub fn needle_sequence(&self) -> impl Iterator<Item = NeedleLabel> + '_ {
        (0..2 * self.width as i32).map(move |i| self.needle_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_machine_bounds() {
        assert!(Machine::new(4, 0, 4, 0).is_err());
        assert!(Machine::new(4, -4, 0, 0).is_err());
        assert!(Machine::new(4, -3, 3, 0).is_ok());
    }

    #[test]
    fn invalid_initial_racking() {
        assert!(Machine::new(4, -2, 2, 3).is_err());
    }

    /// Scenario S1 of spec.md §8.
    #[test]
    fn s1_needle_interleave_w4_r0() {
        let m = Machine::new(4, -2, 2, 0).unwrap();
        let seq: Vec<_> = m.needle_sequence().map(|n| n.to_string()).collect();
        assert_eq!(seq, vec!["b0", "f0", "b1", "f1", "b2", "f2", "b3", "f3"]);
    }

    #[test]
    fn s1_needle_interleave_w4_r_minus2() {
        let mut m = Machine::new(4, -2, 2, 0).unwrap();
        m.racking = -2;
        let seq: Vec<_> = m.needle_sequence().map(|n| n.to_string()).collect();
        assert_eq!(seq, vec!["b0", "b1", "b2", "f0", "b3", "f1", "f2", "f3"]);
    }

    #[test]
    fn s1_needle_interleave_w4_r_plus2() {
        let mut m = Machine::new(4, -2, 2, 0).unwrap();
        m.racking = 2;
        let seq: Vec<_> = m.needle_sequence().map(|n| n.to_string()).collect();
        assert_eq!(seq, vec!["f0", "f1", "b0", "f2", "b1", "f3", "b2", "b3"]);
    }

    /// Property 1 of spec.md §8: `needle_at` is a bijection onto
    /// `{f,b} x [0, width)` for every in-bounds racking.
    #[test]
    fn needle_at_is_a_bijection() {
        for width in 1..8usize {
            for r in -(width as i32 - 1)..=(width as i32 - 1) {
                let mut m = Machine::new(width, -(width as i32 - 1), width as i32 - 1, 0).unwrap();
                m.racking = r;
                let mut seen = std::collections::HashSet::new();
                for i in 0..2 * width as i32 {
                    let n = m.needle_at(i);
                    assert!(n.i >= 0 && (n.i as usize) < width);
                    assert!(seen.insert((n.front, n.i)), "duplicate needle at width={width} r={r}");
                }
                assert_eq!(seen.len(), 2 * width);
            }
        }
    }
}
