//! Error types for the flow pipeline.

use pipeflow_core::direction::DirectionSet;
use pipeflow_core::id::NodeId;

use crate::stage::StageKind;

/// A stage's state check failed: some listener moved a number outside the
/// bounds the stage allows.
///
/// Messages name the offending side index and both compared values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityViolation {
    #[error("Changed totalOffered")]
    ChangedTotalOffered,

    #[error(
        "actuallyOffered[{side}](={actually_offered}) shouldn't be greater than totalOffered[{side}](={total_offered})"
    )]
    OfferAboveTotal {
        side: usize,
        actually_offered: u32,
        total_offered: u32,
    },

    #[error("fluidLeavingSide[{side}](={value}) shouldn't be bigger than its original value!(={original})")]
    LeavingIncreased {
        side: usize,
        value: u32,
        original: u32,
    },

    #[error("fluidEnteringCentre[{side}](={value}) shouldn't be bigger than its original value!(={original})")]
    EnteringIncreased {
        side: usize,
        value: u32,
        original: u32,
    },

    #[error(
        "fluidEnteringCentre[{side}](={entering}) shouldn't be bigger than fluidLeavingSide[{side}](={leaving})"
    )]
    EnteringAboveLeaving {
        side: usize,
        entering: u32,
        leaving: u32,
    },

    #[error("allowed sides widened from {before} to {after}")]
    AllowedWidened {
        before: DirectionSet,
        after: DirectionSet,
    },
}

/// Errors returned by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// A stage failed its state check; the run was abandoned.
    #[error("{stage} stage on node {node:?} failed its state check: {violation}")]
    Integrity {
        stage: StageKind,
        node: NodeId,
        #[source]
        violation: IntegrityViolation,
    },
}

impl FlowError {
    /// The underlying violation, if this is an integrity fault.
    pub fn violation(&self) -> Option<&IntegrityViolation> {
        match self {
            FlowError::Integrity { violation, .. } => Some(violation),
        }
    }
}
