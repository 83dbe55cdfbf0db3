//! Block-world interfaces.
//!
//! The flow engine never touches the world directly; node drivers and the
//! schematic subsystem do. These traits are the whole contract: read the
//! block state at a position, and (for buildable regions) write one.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// An integer block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring position on the given face.
    pub fn offset(self, direction: Direction) -> BlockPos {
        let (dx, dy, dz) = direction.offset();
        BlockPos::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// This position expressed relative to `base`.
    pub fn relative_to(self, base: BlockPos) -> BlockPos {
        BlockPos::new(self.x - base.x, self.y - base.y, self.z - base.z)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &BlockPos) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

// ---------------------------------------------------------------------------
// World access
// ---------------------------------------------------------------------------

/// Read-only access to block data.
pub trait BlockAccess {
    type BlockState: Clone;

    fn block_state(&self, pos: BlockPos) -> Self::BlockState;
}

/// A region that schematics may build into without further checks.
pub trait BuildableRegion: BlockAccess {
    /// Auxiliary per-block data (tile entity payload) stored with a state.
    type TileData;

    fn set_block_state(
        &mut self,
        pos: BlockPos,
        state: Self::BlockState,
        tile_data: Option<Self::TileData>,
    );
}

// ---------------------------------------------------------------------------
// Schematic contexts
// ---------------------------------------------------------------------------

/// Everything a block schematic needs to capture one block.
///
/// The block state is read once, when the context is created.
pub struct SchematicBlockContext<'w, W: BlockAccess + ?Sized> {
    pub world: &'w W,
    pub base_pos: BlockPos,
    pub pos: BlockPos,
    pub block_state: W::BlockState,
}

impl<'w, W: BlockAccess + ?Sized> SchematicBlockContext<'w, W> {
    pub fn new(world: &'w W, base_pos: BlockPos, pos: BlockPos) -> Self {
        Self {
            world,
            base_pos,
            pos,
            block_state: world.block_state(pos),
        }
    }

    /// Position of the captured block relative to the schematic origin.
    pub fn relative_pos(&self) -> BlockPos {
        self.pos.relative_to(self.base_pos)
    }
}

/// Everything an entity schematic needs to capture one entity.
pub struct SchematicEntityContext<'w, W: ?Sized, E> {
    pub world: &'w W,
    pub base_pos: BlockPos,
    pub entity: E,
}

impl<'w, W: ?Sized, E> SchematicEntityContext<'w, W, E> {
    pub fn new(world: &'w W, base_pos: BlockPos, entity: E) -> Self {
        Self {
            world,
            base_pos,
            entity,
        }
    }
}
