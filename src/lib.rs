//! F4PGA flow configuration
//!
//! Resolves, for a chosen target platform, the dependencies (file inputs) and
//! values (parameters) each stage of an FPGA build flow runs with. Settings
//! are declared globally, per platform, and per stage; the most specific
//! scope wins.

pub mod config;
pub mod flow;
pub mod platform;

pub use config::{ConfigError, OverrideError, ProjectFlowConfig, Scope, SlotKind};
pub use flow::{FlowConfig, FlowDefinition, FlowError, Stage};
pub use flow_env::{ResolutionEnv, ResolveError};
pub use platform::{PlatformDir, PlatformOracle};
