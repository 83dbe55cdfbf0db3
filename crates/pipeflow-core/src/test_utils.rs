//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::direction::Direction;
use crate::fluid::{FluidStack, SideAmounts};
use crate::id::*;
use crate::world::{BlockAccess, BlockPos, BuildableRegion};

// ===========================================================================
// Fluid kinds
// ===========================================================================

pub fn water() -> FluidKindId {
    FluidKindId(0)
}
pub fn lava() -> FluidKindId {
    FluidKindId(1)
}
pub fn oil() -> FluidKindId {
    FluidKindId(2)
}

pub fn stack(kind: FluidKindId, amount: u32) -> FluidStack {
    FluidStack::new(kind, amount)
}

// ===========================================================================
// Node ids
// ===========================================================================

pub fn make_node_ids(count: usize) -> Vec<NodeId> {
    let mut sm = SlotMap::<NodeId, ()>::with_key();
    (0..count).map(|_| sm.insert(())).collect()
}

pub fn make_node_id() -> NodeId {
    let mut sm = SlotMap::<NodeId, ()>::with_key();
    sm.insert(())
}

// ===========================================================================
// Per-side arrays
// ===========================================================================

/// An array with `amount` on one side and zero elsewhere.
pub fn on_side(direction: Direction, amount: u32) -> SideAmounts {
    let mut amounts = [0; Direction::COUNT];
    amounts[direction.index()] = amount;
    amounts
}

/// Build a per-side array from `(direction, amount)` pairs.
pub fn sides(entries: &[(Direction, u32)]) -> SideAmounts {
    let mut amounts = [0; Direction::COUNT];
    for &(direction, amount) in entries {
        amounts[direction.index()] = amount;
    }
    amounts
}

// ===========================================================================
// In-memory world
// ===========================================================================

/// A sparse block region backed by a `BTreeMap`. Unset positions read as
/// the fill state.
#[derive(Debug, Clone)]
pub struct MemoryRegion<S> {
    fill: S,
    blocks: BTreeMap<BlockPos, S>,
    tiles: BTreeMap<BlockPos, Vec<u8>>,
}

impl<S: Clone> MemoryRegion<S> {
    pub fn new(fill: S) -> Self {
        Self {
            fill,
            blocks: BTreeMap::new(),
            tiles: BTreeMap::new(),
        }
    }

    pub fn tile_data(&self, pos: BlockPos) -> Option<&Vec<u8>> {
        self.tiles.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<S: Clone> BlockAccess for MemoryRegion<S> {
    type BlockState = S;

    fn block_state(&self, pos: BlockPos) -> S {
        self.blocks.get(&pos).unwrap_or(&self.fill).clone()
    }
}

impl<S: Clone> BuildableRegion for MemoryRegion<S> {
    type TileData = Vec<u8>;

    fn set_block_state(&mut self, pos: BlockPos, state: S, tile_data: Option<Vec<u8>>) {
        self.blocks.insert(pos, state);
        match tile_data {
            Some(data) => {
                self.tiles.insert(pos, data);
            }
            None => {
                self.tiles.remove(&pos);
            }
        }
    }
}
