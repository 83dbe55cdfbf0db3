//! Flow pipeline stages and their state checks.
//!
//! A pipeline run fires four stages in a fixed order:
//!
//! 1. [`TryInsert`] -- a neighbour tries to push fluid in. The only stage
//!    listeners can cancel.
//! 2. [`SideCheckStage`] -- listeners narrow the allowed destination sides
//!    and shift their priorities.
//! 3. [`PreMoveToCentre`] -- each side has published how much it can offer;
//!    listeners decide how much is actually offered.
//! 4. [`OnMoveToCentre`] -- the amounts have been totalled; listeners may
//!    only reduce what leaves each side and what enters the centre.
//!
//! Every stage keeps a private snapshot of the arrays it hands out and
//! verifies listener edits against it in
//! [`FlowStage::check_state_for_errors`].

use std::fmt;

use pipeflow_core::direction::{Direction, DirectionSet};
use pipeflow_core::fluid::{FluidStack, SideAmounts};
use pipeflow_core::id::NodeId;
use pipeflow_core::world::BlockPos;
use serde::{Deserialize, Serialize};

use crate::config::FlowConfig;
use crate::error::IntegrityViolation;
use crate::side_check::SideCheck;

// ---------------------------------------------------------------------------
// Stage kinds
// ---------------------------------------------------------------------------

/// Discriminant tag for stage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    TryInsert,
    SideCheck,
    PreMoveToCentre,
    OnMoveToCentre,
}

impl StageKind {
    /// All stage kinds in firing order.
    pub const ALL: [StageKind; 4] = [
        StageKind::TryInsert,
        StageKind::SideCheck,
        StageKind::PreMoveToCentre,
        StageKind::OnMoveToCentre,
    ];

    /// Whether listeners of this stage may cancel the run.
    pub const fn cancellable(self) -> bool {
        matches!(self, StageKind::TryInsert)
    }

    fn name(self) -> &'static str {
        match self {
            StageKind::TryInsert => "TryInsert",
            StageKind::SideCheck => "SideCheck",
            StageKind::PreMoveToCentre => "PreMoveToCentre",
            StageKind::OnMoveToCentre => "OnMoveToCentre",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Shared stage context
// ---------------------------------------------------------------------------

/// The node a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeContext {
    pub node: NodeId,
    pub pos: BlockPos,
}

/// Transfer limits of the pipe the fluid is flowing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowContext {
    /// Most fluid a single side may move per step.
    pub transfer_per_tick: u32,
    /// Capacity of each section (and of the centre).
    pub capacity: u32,
}

impl FlowContext {
    pub fn new(transfer_per_tick: u32, capacity: u32) -> Self {
        Self {
            transfer_per_tick,
            capacity,
        }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(config.transfer_per_tick, config.capacity)
    }
}

/// Context every stage carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBase {
    pub node: NodeContext,
    pub flow: FlowContext,
}

// ---------------------------------------------------------------------------
// Stage contract
// ---------------------------------------------------------------------------

/// What a listener returns after seeing a stage.
pub trait Verdict {
    /// Whether this verdict ends the run.
    fn cancels(&self) -> bool;
}

/// Non-cancellable stages take plain `()` listeners.
impl Verdict for () {
    fn cancels(&self) -> bool {
        false
    }
}

/// A [`TryInsert`] listener's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertVerdict {
    #[default]
    Accept,
    Reject,
}

impl Verdict for InsertVerdict {
    fn cancels(&self) -> bool {
        matches!(self, InsertVerdict::Reject)
    }
}

/// A pipeline stage.
///
/// `KIND` tags the stage type; only a stage whose kind is
/// [cancellable](StageKind::cancellable) has a verdict type that can
/// cancel.
pub trait FlowStage {
    const KIND: StageKind;

    type Verdict: Verdict;

    fn base(&self) -> &StageBase;

    /// Compare the stage's current state against its construction-time
    /// snapshot. Called once after every listener has run.
    fn check_state_for_errors(&self) -> Result<(), IntegrityViolation> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TryInsert
// ---------------------------------------------------------------------------

/// A neighbour on side `from` is pushing `fluid` into the node.
///
/// Listeners can inspect the incoming stack but not change it; they answer
/// with an [`InsertVerdict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryInsert {
    base: StageBase,
    from: Direction,
    fluid: FluidStack,
}

impl TryInsert {
    pub fn new(base: StageBase, from: Direction, fluid: FluidStack) -> Self {
        Self { base, from, fluid }
    }

    pub fn from(&self) -> Direction {
        self.from
    }

    pub fn fluid(&self) -> &FluidStack {
        &self.fluid
    }
}

impl FlowStage for TryInsert {
    const KIND: StageKind = StageKind::TryInsert;
    type Verdict = InsertVerdict;

    fn base(&self) -> &StageBase {
        &self.base
    }
}

// ---------------------------------------------------------------------------
// SideCheck
// ---------------------------------------------------------------------------

/// Decides which sides may receive `fluid` this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideCheckStage {
    base: StageBase,
    fluid: FluidStack,
    sides: SideCheck,
    allowed_check: DirectionSet,
}

impl SideCheckStage {
    pub fn new(base: StageBase, fluid: FluidStack, sides: SideCheck) -> Self {
        Self {
            base,
            fluid,
            allowed_check: sides.allowed(),
            sides,
        }
    }

    pub fn fluid(&self) -> &FluidStack {
        &self.fluid
    }

    pub fn sides(&self) -> &SideCheck {
        &self.sides
    }

    pub fn sides_mut(&mut self) -> &mut SideCheck {
        &mut self.sides
    }
}

impl FlowStage for SideCheckStage {
    const KIND: StageKind = StageKind::SideCheck;
    type Verdict = ();

    fn base(&self) -> &StageBase {
        &self.base
    }

    fn check_state_for_errors(&self) -> Result<(), IntegrityViolation> {
        let after = self.sides.allowed();
        if !after.is_subset(self.allowed_check) {
            return Err(IntegrityViolation::AllowedWidened {
                before: self.allowed_check,
                after,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PreMoveToCentre
// ---------------------------------------------------------------------------

/// Fired after collecting how much fluid each side can move into the
/// centre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreMoveToCentre {
    base: StageBase,
    fluid: FluidStack,
    total_acceptable: u32,
    total_offered: SideAmounts,
    total_offered_check: SideAmounts,
    actually_offered: SideAmounts,
}

impl PreMoveToCentre {
    pub fn new(
        base: StageBase,
        fluid: FluidStack,
        total_acceptable: u32,
        total_offered: SideAmounts,
        actually_offered: SideAmounts,
    ) -> Self {
        Self {
            base,
            fluid,
            total_acceptable,
            total_offered,
            total_offered_check: total_offered,
            actually_offered,
        }
    }

    /// The fluid being moved; `amount` is the sum of every side's offer.
    pub fn fluid(&self) -> &FluidStack {
        &self.fluid
    }

    /// Most fluid the centre can accept this run.
    pub fn total_acceptable(&self) -> u32 {
        self.total_acceptable
    }

    /// The most each side can offer. Fixed for the whole stage.
    pub fn total_offered(&self) -> &SideAmounts {
        &self.total_offered
    }

    /// What each side will actually offer. Never above `total_offered`.
    pub fn actually_offered(&self) -> &SideAmounts {
        &self.actually_offered
    }

    pub fn actually_offered_mut(&mut self) -> &mut SideAmounts {
        &mut self.actually_offered
    }

    pub fn set_actually_offered(&mut self, side: Direction, amount: u32) {
        self.actually_offered[side.index()] = amount;
    }
}

impl FlowStage for PreMoveToCentre {
    const KIND: StageKind = StageKind::PreMoveToCentre;
    type Verdict = ();

    fn base(&self) -> &StageBase {
        &self.base
    }

    fn check_state_for_errors(&self) -> Result<(), IntegrityViolation> {
        for i in 0..Direction::COUNT {
            if self.total_offered[i] != self.total_offered_check[i] {
                return Err(IntegrityViolation::ChangedTotalOffered);
            }
            if self.actually_offered[i] > self.total_offered[i] {
                return Err(IntegrityViolation::OfferAboveTotal {
                    side: i,
                    actually_offered: self.actually_offered[i],
                    total_offered: self.total_offered[i],
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OnMoveToCentre
// ---------------------------------------------------------------------------

/// Fired after [`PreMoveToCentre`] once every side's contribution has been
/// totalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnMoveToCentre {
    base: StageBase,
    fluid: FluidStack,
    fluid_leaving_side: SideAmounts,
    fluid_entering_centre: SideAmounts,
    leave_check: SideAmounts,
    enter_check: SideAmounts,
}

impl OnMoveToCentre {
    pub fn new(
        base: StageBase,
        fluid: FluidStack,
        fluid_leaving_side: SideAmounts,
        fluid_entering_centre: SideAmounts,
    ) -> Self {
        Self {
            base,
            fluid,
            fluid_leaving_side,
            fluid_entering_centre,
            leave_check: fluid_leaving_side,
            enter_check: fluid_entering_centre,
        }
    }

    /// The fluid being moved; `amount` is the total leaving the sides.
    pub fn fluid(&self) -> &FluidStack {
        &self.fluid
    }

    pub fn fluid_leaving_side(&self) -> &SideAmounts {
        &self.fluid_leaving_side
    }

    pub fn fluid_leaving_side_mut(&mut self) -> &mut SideAmounts {
        &mut self.fluid_leaving_side
    }

    pub fn fluid_entering_centre(&self) -> &SideAmounts {
        &self.fluid_entering_centre
    }

    pub fn fluid_entering_centre_mut(&mut self) -> &mut SideAmounts {
        &mut self.fluid_entering_centre
    }
}

impl FlowStage for OnMoveToCentre {
    const KIND: StageKind = StageKind::OnMoveToCentre;
    type Verdict = ();

    fn base(&self) -> &StageBase {
        &self.base
    }

    fn check_state_for_errors(&self) -> Result<(), IntegrityViolation> {
        for i in 0..Direction::COUNT {
            let leaving = self.fluid_leaving_side[i];
            let entering = self.fluid_entering_centre[i];
            if leaving > self.leave_check[i] {
                return Err(IntegrityViolation::LeavingIncreased {
                    side: i,
                    value: leaving,
                    original: self.leave_check[i],
                });
            }
            if entering > self.enter_check[i] {
                return Err(IntegrityViolation::EnteringIncreased {
                    side: i,
                    value: entering,
                    original: self.enter_check[i],
                });
            }
            if entering > leaving {
                return Err(IntegrityViolation::EnteringAboveLeaving {
                    side: i,
                    entering,
                    leaving,
                });
            }
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
