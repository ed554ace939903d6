//! Flow definitions, stages, and per-platform resolved flow configuration.

mod definition;
mod error;
mod flow_config;
mod paths;
mod stage;

pub use definition::FlowDefinition;
pub use error::{FlowError, FlowResult};
pub use flow_config::FlowConfig;
pub use paths::{absolutize, resolve_paths};
pub use stage::{IoQualifier, ModuleRef, Stage, StageIo, StageOptions};
