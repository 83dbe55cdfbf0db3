//! Pipeflow Data -- file loading for pipeline settings.
//!
//! Reads a [`FlowConfig`](pipeflow_fluid::FlowConfig) from RON, TOML or
//! JSON, picking the format from the file extension.

pub mod loader;

pub use loader::{
    DataLoadError, Format, detect_format, find_config_file, load_flow_config,
    load_flow_config_from_dir, require_config_file,
};
