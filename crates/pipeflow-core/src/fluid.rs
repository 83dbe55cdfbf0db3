//! Fluid stacks and per-side amount arrays.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::id::FluidKindId;

/// Per-direction amounts, indexed by [`Direction::index`].
pub type SideAmounts = [u32; Direction::COUNT];

/// A quantity of a single fluid kind.
///
/// The kind is fixed for the lifetime of a pipeline run; only the amount
/// is ever recomputed between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidStack {
    pub kind: FluidKindId,
    pub amount: u32,
}

impl FluidStack {
    pub fn new(kind: FluidKindId, amount: u32) -> Self {
        Self { kind, amount }
    }

    /// A stack of `kind` holding nothing.
    pub fn empty(kind: FluidKindId) -> Self {
        Self { kind, amount: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Same kind, different amount.
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            kind: self.kind,
            amount,
        }
    }
}

/// Sum a per-side array without overflowing.
pub fn total(amounts: &SideAmounts) -> u64 {
    amounts.iter().map(|&a| u64::from(a)).sum()
}
