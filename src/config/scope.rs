//! Scope paths and slot kinds in the project document.

use std::fmt;

/// Top-level key holding the default platform name.
pub const DEFAULT_PLATFORM_KEY: &str = "default_platform";

/// Platform-level key holding the default target stage.
pub const DEFAULT_TARGET_KEY: &str = "default_target";

/// Names that may never be used as a platform name.
pub const RESERVED_KEYWORDS: &[&str] = &[
    SlotKind::Dependencies.key(),
    SlotKind::Values.key(),
    DEFAULT_PLATFORM_KEY,
    DEFAULT_TARGET_KEY,
];

/// Check whether a name is reserved at the platform-name level.
pub fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(&name)
}

/// Check whether a name is taken by a platform-level key and so cannot
/// name a stage.
pub fn is_reserved_stage_name(name: &str) -> bool {
    name == SlotKind::Dependencies.key() || name == SlotKind::Values.key() || name == DEFAULT_TARGET_KEY
}

/// The two kinds of override slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// File/path inputs.
    Dependencies,
    /// Scalar/parameter settings.
    Values,
}

impl SlotKind {
    /// Document key of this slot map.
    pub const fn key(self) -> &'static str {
        match self {
            SlotKind::Dependencies => "dependencies",
            SlotKind::Values => "values",
        }
    }

    /// Human-readable singular noun, used in error messages.
    pub const fn noun(self) -> &'static str {
        match self {
            SlotKind::Dependencies => "dependency",
            SlotKind::Values => "value",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where an override lives: global, a platform, or a stage of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope<'a> {
    Global,
    Platform(&'a str),
    Stage { platform: &'a str, stage: &'a str },
}

impl<'a> Scope<'a> {
    /// Build a scope from optional platform and stage names.
    ///
    /// A stage without a platform has no meaning and collapses to global.
    pub fn from_parts(platform: Option<&'a str>, stage: Option<&'a str>) -> Self {
        match (platform, stage) {
            (None, _) => Scope::Global,
            (Some(platform), None) => Scope::Platform(platform),
            (Some(platform), Some(stage)) => Scope::Stage { platform, stage },
        }
    }

    /// Platform this scope belongs to, if any.
    pub fn platform(&self) -> Option<&'a str> {
        match *self {
            Scope::Global => None,
            Scope::Platform(platform) | Scope::Stage { platform, .. } => Some(platform),
        }
    }

    /// Stage this scope belongs to, if any.
    pub fn stage(&self) -> Option<&'a str> {
        match *self {
            Scope::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Platform(platform) => write!(f, "{}", platform),
            Scope::Stage { platform, stage } => write!(f, "{}.{}", platform, stage),
        }
    }
}
