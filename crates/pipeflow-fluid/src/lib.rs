//! Pipeflow Fluid -- the per-node flow pipeline.
//!
//! Every step a pipe node fires four stages through a [`FlowPipeline`]:
//! `TryInsert`, `SideCheck`, `PreMoveToCentre` and `OnMoveToCentre`.
//! Registered listeners can refuse the insertion, narrow and prioritise the
//! destination sides, and reduce the amounts moving into the centre. Each
//! stage checks listener edits against a snapshot and fails the run if any
//! bound was crossed.
//!
//! # Design
//!
//! - Stage types carry no lifetimes; every context they hold is `Copy`.
//! - Only `TryInsert` listeners return a verdict that can cancel.
//! - [`SideCheck`] picks the allowed sides with the best priority and
//!   shuffles them with the pipeline's RNG.
//! - [`PipeNode`] is a reference driver that moves fluid between six side
//!   sections and a centre from a run's report.

pub mod config;
pub mod driver;
pub mod error;
pub mod listener;
pub mod pipeline;
pub mod side_check;
pub mod stage;

pub use config::FlowConfig;
pub use driver::{PipeNode, StepSummary};
pub use error::{FlowError, IntegrityViolation};
pub use listener::{FlowListeners, ListenerPriority, StageOutcome};
pub use pipeline::{FlowPipeline, FlowReport, FlowRequest, RunOutcome, split_acceptable};
pub use side_check::SideCheck;
pub use stage::{
    FlowContext, FlowStage, InsertVerdict, NodeContext, OnMoveToCentre, PreMoveToCentre,
    SideCheckStage, StageBase, StageKind, TryInsert,
};
