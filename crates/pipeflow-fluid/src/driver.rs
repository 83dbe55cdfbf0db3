//! Reference pipe node driven by a [`FlowPipeline`].
//!
//! A [`PipeNode`] holds one fluid kind in six side sections and a centre.
//! Each [`PipeNode::step`]:
//!
//! 1. offers `min(section, transfer_per_tick)` from every side that did not
//!    receive fluid last step,
//! 2. runs the pipeline,
//! 3. drains each side by its leaving amount and adds what entered to the
//!    centre (the difference is lost),
//! 4. splits the centre evenly between the destinations, bounded by each
//!    section's room and the transfer rate,
//! 5. accepts the neighbour's insertion into the `from` section.
//!
//! A cancelled run moves nothing.

use pipeflow_core::direction::{Direction, DirectionSet};
use pipeflow_core::fluid::{FluidStack, SideAmounts, total};
use pipeflow_core::id::FluidKindId;
use rand::Rng;
use tracing::trace;

use crate::error::FlowError;
use crate::pipeline::{FlowPipeline, FlowRequest, RunOutcome};
use crate::stage::{FlowContext, NodeContext};

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepSummary {
    /// A `TryInsert` listener refused; nothing moved.
    pub refused: bool,
    /// Fluid accepted into the `from` section.
    pub accepted: u32,
    /// Fluid that left the side sections.
    pub left_sides: u32,
    /// Fluid that reached the centre.
    pub entered_centre: u32,
    /// Fluid removed by listeners between leaving and entering.
    pub lost: u32,
    /// Fluid pushed from the centre into each side.
    pub pushed: SideAmounts,
    pub destinations: Vec<Direction>,
}

impl StepSummary {
    fn refused() -> Self {
        Self {
            refused: true,
            ..Self::default()
        }
    }

    pub fn total_pushed(&self) -> u64 {
        total(&self.pushed)
    }
}

/// A single pipe junction carrying one fluid kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeNode {
    context: NodeContext,
    flow: FlowContext,
    kind: FluidKindId,
    sections: SideAmounts,
    centre: u32,
    connected: DirectionSet,
    outputs: DirectionSet,
}

impl PipeNode {
    pub fn new(context: NodeContext, flow: FlowContext, kind: FluidKindId) -> Self {
        Self {
            context,
            flow,
            kind,
            sections: [0; Direction::COUNT],
            centre: 0,
            connected: DirectionSet::ALL,
            outputs: DirectionSet::EMPTY,
        }
    }

    pub fn context(&self) -> NodeContext {
        self.context
    }

    pub fn kind(&self) -> FluidKindId {
        self.kind
    }

    /// Sides that can receive fluid.
    pub fn set_connected(&mut self, sides: DirectionSet) {
        self.connected = sides;
    }

    pub fn connected(&self) -> DirectionSet {
        self.connected
    }

    /// Sides that received fluid on the last step. They do not offer back.
    pub fn outputs(&self) -> DirectionSet {
        self.outputs
    }

    pub fn section(&self, side: Direction) -> u32 {
        self.sections[side.index()]
    }

    pub fn sections(&self) -> &SideAmounts {
        &self.sections
    }

    pub fn centre(&self) -> u32 {
        self.centre
    }

    /// Everything held by the node.
    pub fn total(&self) -> u64 {
        total(&self.sections) + u64::from(self.centre)
    }

    /// Put fluid straight into a section. Returns what fit.
    pub fn fill_section(&mut self, side: Direction, amount: u32) -> u32 {
        let slot = &mut self.sections[side.index()];
        let accepted = amount.min(self.flow.capacity.saturating_sub(*slot));
        *slot += accepted;
        accepted
    }

    /// Take fluid out of a section, as a neighbour pulling output would.
    pub fn drain_section(&mut self, side: Direction, amount: u32) -> FluidStack {
        let slot = &mut self.sections[side.index()];
        let drained = amount.min(*slot);
        *slot -= drained;
        FluidStack::new(self.kind, drained)
    }

    /// Advance one step with `incoming` fluid arriving on side `from`.
    pub fn step<R: Rng>(
        &mut self,
        pipeline: &mut FlowPipeline<R>,
        from: Direction,
        incoming: u32,
    ) -> Result<StepSummary, FlowError> {
        let mut total_offered = [0; Direction::COUNT];
        for side in Direction::ALL {
            if !self.outputs.contains(side) {
                total_offered[side.index()] = self.section(side).min(self.flow.transfer_per_tick);
            }
        }

        let request = FlowRequest {
            node: self.context,
            flow: self.flow,
            from,
            fluid: FluidStack::new(self.kind, incoming),
            connected: self.connected,
            total_offered,
            centre_space: self.flow.capacity.saturating_sub(self.centre),
        };

        let report = match pipeline.run(request)? {
            RunOutcome::Cancelled { .. } => return Ok(StepSummary::refused()),
            RunOutcome::Committed(report) => report,
        };

        // leaving <= actually_offered <= total_offered <= section
        for side in Direction::ALL {
            let i = side.index();
            self.sections[i] -= report.fluid_leaving_side[i];
        }
        let left_sides = u32::try_from(report.total_leaving()).unwrap_or(u32::MAX);
        let entered_centre = u32::try_from(report.total_entering()).unwrap_or(u32::MAX);
        self.centre += entered_centre;

        let pushed = self.push_from_centre(&report.destinations);
        self.outputs = report.destinations.iter().copied().collect();

        let accepted = self.fill_section(from, incoming);

        let summary = StepSummary {
            refused: false,
            accepted,
            left_sides,
            entered_centre,
            lost: left_sides - entered_centre,
            pushed,
            destinations: report.destinations,
        };
        trace!(
            node = ?self.context.node,
            accepted,
            entered = entered_centre,
            pushed = summary.total_pushed(),
            centre = self.centre,
            "pipe node stepped"
        );
        Ok(summary)
    }

    /// Split the centre evenly across `destinations`; leftover units go to
    /// the first destinations in order.
    fn push_from_centre(&mut self, destinations: &[Direction]) -> SideAmounts {
        let mut pushed = [0; Direction::COUNT];
        let count = destinations.len() as u32;
        if count == 0 || self.centre == 0 {
            return pushed;
        }

        let share = self.centre / count;
        let extra = self.centre % count;
        for (k, &side) in destinations.iter().enumerate() {
            let want = share + u32::from((k as u32) < extra);
            let room = self.flow.capacity.saturating_sub(self.section(side));
            let amount = want.min(self.flow.transfer_per_tick).min(room);
            self.sections[side.index()] += amount;
            self.centre -= amount;
            pushed[side.index()] = amount;
        }
        pushed
    }
}
