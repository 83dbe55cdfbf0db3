//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`FlowPipeline`](crate::pipeline::FlowPipeline) and the
/// pipes driven through it. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Seed for side-order shuffling.
    pub seed: u64,
    /// Most fluid a side moves per step.
    pub transfer_per_tick: u32,
    /// Capacity of each pipe section.
    pub capacity: u32,
    /// Emit an error event when a stage fails its state check.
    pub log_violations: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            transfer_per_tick: 10,
            capacity: 250,
            log_violations: true,
        }
    }
}
