//! Error types for value resolution.

/// Errors raised by strict resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A `${name}` reference has no usable value in the environment.
    #[error("value `{name}` is referenced in `{input}` but is not set")]
    Unresolved { name: String, input: String },
}
