//! Side eligibility and priority accumulator.
//!
//! A [`SideCheck`] starts with every side allowed at priority 0. Listeners
//! narrow the allowed mask and shift priorities; the final decision is the
//! set of allowed sides that share the best (numerically lowest) priority,
//! shuffled to break ties.

use pipeflow_core::direction::{Direction, DirectionSet};
use rand::Rng;
use rand::seq::SliceRandom;

/// Which sides may receive fluid, and in what priority tier.
///
/// Priorities are stored inverted: raising a side's priority lowers its
/// stored value, so the best tier is the minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideCheck {
    allowed: DirectionSet,
    priority: [i32; Direction::COUNT],
}

impl Default for SideCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SideCheck {
    pub fn new() -> Self {
        Self {
            allowed: DirectionSet::ALL,
            priority: [0; Direction::COUNT],
        }
    }

    /// Re-allow every side. Priorities are kept.
    ///
    /// Only valid between routing decisions: a listener calling this during
    /// a side-check stage trips that stage's state check.
    pub fn reset(&mut self) {
        self.allowed = DirectionSet::ALL;
    }

    /// Whether `side` is still allowed.
    ///
    /// A later listener may still disallow it, so use this only to skip
    /// work for a side that is already out (a filter pipe need not test
    /// its filters for a side someone else disallowed).
    pub fn is_allowed(&self, side: Direction) -> bool {
        self.allowed.contains(side)
    }

    /// Disallow the given sides. If no side is left, the fluid stays where
    /// it is.
    pub fn disallow(&mut self, sides: &[Direction]) {
        for &side in sides {
            self.allowed.remove(side);
        }
    }

    /// Disallow every side in `sides`.
    pub fn disallow_set(&mut self, sides: DirectionSet) {
        self.allowed = DirectionSet::from_bits(self.allowed.bits() & !sides.bits());
    }

    /// Restrict to exactly `side`. A side that is already disallowed cannot
    /// be brought back, so in that case nothing is left allowed.
    pub fn disallow_all_except(&mut self, side: Direction) {
        if self.is_allowed(side) {
            self.allowed = DirectionSet::only(side);
        } else {
            self.disallow_all();
        }
    }

    /// Restrict to the given sides (intersected with what is still allowed).
    pub fn disallow_all_except_any(&mut self, sides: &[Direction]) {
        match sides {
            [] => self.disallow_all(),
            [side] => self.disallow_all_except(*side),
            _ => {
                let retained: DirectionSet = sides.iter().copied().collect();
                self.allowed = self.allowed.intersection(retained);
            }
        }
    }

    pub fn disallow_all(&mut self) {
        self.allowed = DirectionSet::EMPTY;
    }

    pub fn increase_priority(&mut self, side: Direction) {
        self.increase_priority_by(side, 1);
    }

    pub fn increase_priority_by(&mut self, side: Direction, by: i32) {
        let slot = &mut self.priority[side.index()];
        *slot = slot.wrapping_sub(by);
    }

    pub fn decrease_priority(&mut self, side: Direction) {
        self.decrease_priority_by(side, 1);
    }

    pub fn decrease_priority_by(&mut self, side: Direction, by: i32) {
        let slot = &mut self.priority[side.index()];
        *slot = slot.wrapping_add(by);
    }

    /// Stored (inverted) priority of `side`.
    pub fn priority(&self, side: Direction) -> i32 {
        self.priority[side.index()]
    }

    pub fn allowed(&self) -> DirectionSet {
        self.allowed
    }

    pub fn any_allowed(&self) -> bool {
        !self.allowed.is_empty()
    }

    pub fn allowed_count(&self) -> u32 {
        self.allowed.len()
    }

    /// The allowed sides in the best priority tier.
    pub fn highest_priority_allowed(&self) -> DirectionSet {
        if self.allowed_count() <= 1 {
            return self.allowed;
        }

        let Some(best) = self.allowed.iter().map(|side| self.priority(side)).min() else {
            return DirectionSet::EMPTY;
        };

        self.allowed
            .iter()
            .filter(|&side| self.priority(side) == best)
            .collect()
    }

    /// The best-tier sides in a random order.
    ///
    /// Sides are listed in index order and shuffled only when there is more
    /// than one; lower tiers never appear.
    pub fn randomised_order<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Direction> {
        let best = self.highest_priority_allowed();
        let mut order: Vec<Direction> = best.iter().collect();
        if order.len() > 1 {
            order.shuffle(rng);
        }
        order
    }
}

// ===========================================================================
// Tests
// ===========================================================================
