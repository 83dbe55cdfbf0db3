//! Pipeflow Core -- shared vocabulary for the pipe-network fluid engine.
//!
//! This crate holds the small, dependency-light types that every other
//! pipeflow crate builds on: node and fluid identifiers, the six-way
//! direction set used for side masks, fluid stacks, the deterministic
//! simulation RNG, and the block-world interfaces a node driver sits on.
//!
//! # Key Types
//!
//! - [`direction::Direction`] -- The six faces of a pipe node, with stable
//!   indices 0-5 (down, up, north, south, west, east).
//! - [`direction::DirectionSet`] -- 6-bit mask over [`direction::Direction`].
//! - [`fluid::FluidStack`] -- A (kind, amount) pair; the unit of work for
//!   one pipeline run.
//! - [`fluid::SideAmounts`] -- Per-direction amount arrays passed between
//!   pipeline stages.
//! - [`rng::SimRng`] -- SplitMix64 generator usable anywhere `rand` expects
//!   an RNG.
//! - [`world::BlockAccess`] / [`world::BuildableRegion`] -- Read/write
//!   access to world block data.

pub mod direction;
pub mod fluid;
pub mod id;
pub mod rng;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
