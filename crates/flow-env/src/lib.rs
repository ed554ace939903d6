//! Symbolic value resolution for flow configuration.
//!
//! A [`ResolutionEnv`] holds a table of named values and substitutes `${name}`
//! references found inside strings, lists and maps. A reference to a list
//! value expands the surrounding string into one string per list element.

mod env;
mod error;

pub use env::{map_strings, ResolutionEnv};
pub use error::ResolveError;
