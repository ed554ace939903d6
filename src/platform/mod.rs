//! Platform discovery
//!
//! Platforms are defined by flow definition files under
//! `<share>/platforms/<platform>.json`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::flow::{FlowDefinition, FlowResult};

/// Answers whether platform and stage names refer to something real.
pub trait PlatformOracle {
    fn has_platform(&self, platform: &str) -> bool;

    /// Whether `stage` exists for `platform`. Accepts anything by default.
    fn has_stage(&self, _platform: &str, _stage: &str) -> bool {
        true
    }
}

/// Platform definitions stored in a share directory.
#[derive(Debug, Clone)]
pub struct PlatformDir {
    root: PathBuf,
}

impl PlatformDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platforms_dir(&self) -> PathBuf {
        self.root.join("platforms")
    }

    pub fn definition_path(&self, platform: &str) -> PathBuf {
        self.platforms_dir().join(format!("{}.json", platform))
    }

    /// Names of all defined platforms, sorted.
    pub fn platform_names(&self) -> Vec<String> {
        WalkDir::new(self.platforms_dir())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|entry| {
                entry
                    .path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .collect()
    }

    /// Load the flow definition of one platform.
    pub fn load_definition(&self, platform: &str) -> FlowResult<FlowDefinition> {
        FlowDefinition::load(&self.definition_path(platform))
    }
}

impl PlatformOracle for PlatformDir {
    fn has_platform(&self, platform: &str) -> bool {
        self.platform_names().iter().any(|name| name == platform)
    }

    fn has_stage(&self, platform: &str, stage: &str) -> bool {
        match self.load_definition(platform) {
            Ok(definition) => definition.stage(stage).is_some(),
            Err(e) => {
                tracing::debug!(platform, error = %e, "cannot load platform definition");
                false
            }
        }
    }
}
