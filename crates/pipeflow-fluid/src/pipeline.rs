//! The four-stage flow pipeline.
//!
//! [`FlowPipeline::run`] fires the stages in order for one node and one
//! step:
//!
//! 1. `TryInsert`. A rejection ends the run with [`RunOutcome::Cancelled`].
//! 2. `SideCheck`, starting from the node's connected sides. The surviving
//!    best-priority sides are shuffled into the destination order.
//! 3. `PreMoveToCentre`, with `actually_offered` initialised to each side's
//!    `total_offered`.
//! 4. `OnMoveToCentre`, after [`split_acceptable`] has shared the centre's
//!    room between the offering sides.
//!
//! Each stage's state check runs right after its listeners. A failure
//! aborts the run with [`FlowError::Integrity`]; no later stage fires.

use pipeflow_core::direction::{Direction, DirectionSet};
use pipeflow_core::fluid::{FluidStack, SideAmounts, total};
use pipeflow_core::id::ListenerId;
use pipeflow_core::rng::SimRng;
use rand::Rng;
use tracing::{debug, error, trace};

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::listener::{FlowListeners, StageListeners, StageOutcome};
use crate::side_check::SideCheck;
use crate::stage::{
    FlowContext, FlowStage, NodeContext, OnMoveToCentre, PreMoveToCentre, SideCheckStage,
    StageBase, TryInsert,
};

// ---------------------------------------------------------------------------
// Requests & reports
// ---------------------------------------------------------------------------

/// Input for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRequest {
    pub node: NodeContext,
    pub flow: FlowContext,
    /// Side the neighbour is inserting from.
    pub from: Direction,
    /// Fluid being inserted. May be empty.
    pub fluid: FluidStack,
    /// Sides that can receive fluid at all.
    pub connected: DirectionSet,
    /// Most each side can move into the centre this step.
    pub total_offered: SideAmounts,
    /// Free room in the centre.
    pub centre_space: u32,
}

/// What a committed run decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    /// Best-priority allowed sides, in shuffled order.
    pub destinations: Vec<Direction>,
    /// The moving fluid; `amount` is the total leaving the sides.
    pub fluid: FluidStack,
    pub total_acceptable: u32,
    pub actually_offered: SideAmounts,
    pub fluid_leaving_side: SideAmounts,
    pub fluid_entering_centre: SideAmounts,
}

impl FlowReport {
    pub fn total_leaving(&self) -> u64 {
        total(&self.fluid_leaving_side)
    }

    pub fn total_entering(&self) -> u64 {
        total(&self.fluid_entering_centre)
    }

    /// No side may receive fluid; it stays in the centre.
    pub fn is_blocked(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn moved_nothing(&self) -> bool {
        self.total_leaving() == 0
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A `TryInsert` listener refused the insertion.
    Cancelled { by: ListenerId },
    Committed(FlowReport),
}

impl RunOutcome {
    pub fn report(&self) -> Option<&FlowReport> {
        match self {
            RunOutcome::Committed(report) => Some(report),
            RunOutcome::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }
}

// ---------------------------------------------------------------------------
// Totalling
// ---------------------------------------------------------------------------

/// Share `acceptable` units between the sides' offers.
///
/// If everything offered fits, every side moves its full offer. Otherwise
/// each side gets `offer * acceptable / sum` rounded down, and the
/// remaining units go one at a time to sides still below their offer, in
/// direction order. The result never exceeds an offer and sums to
/// `min(acceptable, sum of offers)`.
pub fn split_acceptable(offered: &SideAmounts, acceptable: u32) -> SideAmounts {
    let sum = total(offered);
    let acceptable = u64::from(acceptable);
    if sum <= acceptable {
        return *offered;
    }

    let mut leaving = [0u32; Direction::COUNT];
    let mut assigned = 0u64;
    for (slot, &offer) in leaving.iter_mut().zip(offered) {
        // share <= offer, so the cast back is lossless.
        let share = u64::from(offer) * acceptable / sum;
        *slot = share as u32;
        assigned += share;
    }

    let mut remainder = acceptable - assigned;
    while remainder > 0 {
        for (slot, &offer) in leaving.iter_mut().zip(offered) {
            if remainder == 0 {
                break;
            }
            if *slot < offer {
                *slot += 1;
                remainder -= 1;
            }
        }
    }
    leaving
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Dispatches the four flow stages for a node.
///
/// Generic over the shuffling RNG; [`SimRng`] unless built with
/// [`FlowPipeline::with_rng`].
#[derive(Debug)]
pub struct FlowPipeline<R = SimRng> {
    listeners: FlowListeners,
    rng: R,
    log_violations: bool,
}

impl FlowPipeline<SimRng> {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(SimRng::new(seed))
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        let mut pipeline = Self::new(config.seed);
        pipeline.log_violations = config.log_violations;
        pipeline
    }
}

impl<R: Rng> FlowPipeline<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            listeners: FlowListeners::new(),
            rng,
            log_violations: true,
        }
    }

    pub fn listeners(&self) -> &FlowListeners {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut FlowListeners {
        &mut self.listeners
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    pub fn set_log_violations(&mut self, enabled: bool) {
        self.log_violations = enabled;
    }

    /// Run every stage for one node.
    pub fn run(&mut self, request: FlowRequest) -> Result<RunOutcome, FlowError> {
        let base = StageBase {
            node: request.node,
            flow: request.flow,
        };
        let node = request.node.node;
        let kind = request.fluid.kind;

        let mut insert = TryInsert::new(base, request.from, request.fluid);
        if let StageOutcome::Cancelled { by } =
            fire(&mut self.listeners.try_insert, &mut insert, self.log_violations)?
        {
            debug!(?node, from = %request.from, listener = by.0, "insertion refused");
            return Ok(RunOutcome::Cancelled { by });
        }

        let mut sides = SideCheck::new();
        sides.disallow_set(DirectionSet::from_bits(!request.connected.bits()));
        let mut side_check = SideCheckStage::new(base, request.fluid, sides);
        fire(&mut self.listeners.side_check, &mut side_check, self.log_violations)?;
        let destinations = side_check.sides().randomised_order(&mut self.rng);
        if destinations.is_empty() {
            debug!(?node, "no side allowed, fluid stays in the centre");
        }

        let total_acceptable = request.flow.transfer_per_tick.min(request.centre_space);
        let offered = u32::try_from(total(&request.total_offered)).unwrap_or(u32::MAX);
        let mut pre_move = PreMoveToCentre::new(
            base,
            FluidStack::new(kind, offered),
            total_acceptable,
            request.total_offered,
            request.total_offered,
        );
        fire(&mut self.listeners.pre_move, &mut pre_move, self.log_violations)?;
        let actually_offered = *pre_move.actually_offered();

        let leaving = split_acceptable(&actually_offered, total_acceptable);
        let leaving_total = u32::try_from(total(&leaving)).unwrap_or(u32::MAX);
        let mut on_move =
            OnMoveToCentre::new(base, FluidStack::new(kind, leaving_total), leaving, leaving);
        fire(&mut self.listeners.on_move, &mut on_move, self.log_violations)?;

        let report = FlowReport {
            destinations,
            fluid: *on_move.fluid(),
            total_acceptable,
            actually_offered,
            fluid_leaving_side: *on_move.fluid_leaving_side(),
            fluid_entering_centre: *on_move.fluid_entering_centre(),
        };
        trace!(
            ?node,
            leaving = report.total_leaving(),
            entering = report.total_entering(),
            destinations = report.destinations.len(),
            "flow run committed"
        );
        Ok(RunOutcome::Committed(report))
    }
}

/// Dispatch one stage, then check its state.
fn fire<S: FlowStage>(
    listeners: &mut StageListeners<S>,
    stage: &mut S,
    log_violations: bool,
) -> Result<StageOutcome, FlowError> {
    let kind = S::KIND;
    let outcome = listeners.dispatch(stage);
    trace!(stage = %kind, listeners = listeners.len(), ?outcome, "dispatched stage");

    if let Err(violation) = stage.check_state_for_errors() {
        let node = stage.base().node.node;
        if log_violations {
            error!(stage = %kind, ?node, %violation, "stage failed its state check");
        }
        return Err(FlowError::Integrity {
            stage: kind,
            node,
            violation,
        });
    }
    Ok(outcome)
}

// ===========================================================================
// Tests
// ===========================================================================
