//! Project override configuration
//!
//! Implements the three-scope override model:
//! 1. Global (project-wide)
//! 2. Platform
//! 3. Stage of a platform
//!
//! Each scope carries `dependencies` and `values` slot maps whose entries are
//! lists. The most specific scope replaces a name's whole list.

mod aggregate;
mod error;
mod io;
mod project;
mod scope;
mod store;

pub use aggregate::{aggregate, override_layers, replace_entries};
pub use error::{ConfigError, OverrideError};
pub use io::{digest_bytes, load_document, parse_document, render_document, save_document, ConfigSource};
pub use project::ProjectFlowConfig;
pub use scope::{
    is_reserved_keyword, is_reserved_stage_name, Scope, SlotKind, DEFAULT_PLATFORM_KEY, DEFAULT_TARGET_KEY,
    RESERVED_KEYWORDS,
};
pub use store::{append, remove_by_indices, remove_by_values, slot_map, slot_map_mut, unset, Document, Slot};
