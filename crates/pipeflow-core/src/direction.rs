//! The six faces of a pipe node and the bitmask encoding over them.
//!
//! Every per-side array in the flow pipeline is indexed by
//! [`Direction::index`], and every side mask stores direction `d` at bit
//! `d.index()`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the six axis-aligned faces of a node.
///
/// The discriminant is the stable index used for array slots and mask bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Down = 0,
    Up = 1,
    North = 2,
    South = 3,
    West = 4,
    East = 5,
}

impl Direction {
    /// Number of directions.
    pub const COUNT: usize = 6;

    /// All six directions in index order.
    pub const ALL: [Direction; Self::COUNT] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Stable index in `0..6`.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Direction::index`]. Returns `None` for indices >= 6.
    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    /// The single-bit mask for this direction.
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// The face on the other side of the node.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// Unit offset `(x, y, z)` towards the neighbouring block.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    /// Lowercase name, used in log output and mask formatting.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// DirectionSet
// ---------------------------------------------------------------------------

/// A set of directions stored as a 6-bit mask.
///
/// Bits above index 5 are never set; [`DirectionSet::from_bits`] masks them
/// off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirectionSet(u8);

impl DirectionSet {
    /// Mask with every direction bit set.
    const MASK: u8 = 0b11_1111;

    /// The empty set.
    pub const EMPTY: DirectionSet = DirectionSet(0);

    /// All six directions.
    pub const ALL: DirectionSet = DirectionSet(Self::MASK);

    /// Build a set from raw bits, discarding anything above bit 5.
    pub const fn from_bits(bits: u8) -> Self {
        DirectionSet(bits & Self::MASK)
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// A set holding exactly one direction.
    pub const fn only(direction: Direction) -> Self {
        DirectionSet(direction.bit())
    }

    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn insert(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    pub fn remove(&mut self, direction: Direction) {
        self.0 &= !direction.bit();
    }

    /// Number of directions in the set.
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn intersection(self, other: DirectionSet) -> DirectionSet {
        DirectionSet(self.0 & other.0)
    }

    pub const fn union(self, other: DirectionSet) -> DirectionSet {
        DirectionSet(self.0 | other.0)
    }

    /// Whether every direction in `self` is also in `other`.
    pub const fn is_subset(self, other: DirectionSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Iterate over the members in index order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::EMPTY;
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

impl fmt::Display for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, direction) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(direction.name())?;
        }
        f.write_str("}")
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_stable() {
        for (i, direction) in Direction::ALL.iter().enumerate() {
            assert_eq!(direction.index(), i);
            assert_eq!(Direction::from_index(i), Some(*direction));
        }
        assert_eq!(Direction::from_index(6), None);
    }

    #[test]
    fn opposite_is_an_involution() {
        for direction in Direction::ALL {
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn opposite_offsets_cancel() {
        for direction in Direction::ALL {
            let (x, y, z) = direction.offset();
            let (ox, oy, oz) = direction.opposite().offset();
            assert_eq!((x + ox, y + oy, z + oz), (0, 0, 0));
        }
    }

    #[test]
    fn all_set_has_six_members() {
        assert_eq!(DirectionSet::ALL.len(), 6);
        assert_eq!(DirectionSet::ALL.bits(), 0b11_1111);
        assert!(DirectionSet::EMPTY.is_empty());
    }

    #[test]
    fn from_bits_discards_high_bits() {
        let set = DirectionSet::from_bits(0b1100_0001);
        assert_eq!(set.bits(), 0b1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Direction::Down]);
    }

    #[test]
    fn insert_remove_contains() {
        let mut set = DirectionSet::EMPTY;
        set.insert(Direction::East);
        set.insert(Direction::North);
        assert!(set.contains(Direction::East));
        assert!(set.contains(Direction::North));
        assert!(!set.contains(Direction::Up));
        set.remove(Direction::East);
        set.remove(Direction::East);
        assert_eq!(set, DirectionSet::only(Direction::North));
    }

    #[test]
    fn iterates_in_index_order() {
        let set: DirectionSet = [Direction::East, Direction::Down, Direction::South]
            .into_iter()
            .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Direction::Down, Direction::South, Direction::East]
        );
    }

    #[test]
    fn subset_and_set_algebra() {
        let a: DirectionSet = [Direction::Up, Direction::West].into_iter().collect();
        let b: DirectionSet = [Direction::West, Direction::East].into_iter().collect();
        assert_eq!(a.intersection(b), DirectionSet::only(Direction::West));
        assert_eq!(a.union(b).len(), 3);
        assert!(a.intersection(b).is_subset(a));
        assert!(!a.is_subset(b));
        assert!(DirectionSet::EMPTY.is_subset(a));
    }

    #[test]
    fn display_lists_members() {
        let set: DirectionSet = [Direction::North, Direction::East].into_iter().collect();
        assert_eq!(set.to_string(), "{north,east}");
        assert_eq!(DirectionSet::EMPTY.to_string(), "{}");
    }
}
