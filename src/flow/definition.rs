//! Flow definitions: the per-platform pipeline template.
//!
//! ```json
//! {
//!     "values": { "device": "xc7a50t_test" },
//!     "stages": { "synth": "common:synth", "route": "common:route" },
//!     "stage_options": { "route": { "takes": ["eblif"], "values": { ... } } }
//! }
//! ```

use std::fs;
use std::path::Path;

use flow_env::ResolutionEnv;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::{FlowError, FlowResult};
use super::stage::Stage;

#[derive(Debug, Deserialize)]
struct FlowTemplate {
    #[serde(default)]
    values: Map<String, Value>,

    stages: Map<String, Value>,

    #[serde(default)]
    stage_options: Map<String, Value>,
}

/// An ordered set of stages plus the values every stage sees.
///
/// Immutable once built; a [`super::FlowConfig`] copies the stages it layers
/// project overrides into.
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    stages: Vec<Stage>,
    r_env: ResolutionEnv,
}

impl FlowDefinition {
    /// Build from an in-memory template.
    pub fn from_value(template: &Value) -> FlowResult<Self> {
        Self::build(template, "<inline>")
    }

    /// Load a template from a JSON file.
    pub fn load(path: &Path) -> FlowResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| FlowError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let template: Value = serde_json::from_str(&contents).map_err(|source| FlowError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::build(&template, &path.display().to_string())
    }

    fn build(template: &Value, origin: &str) -> FlowResult<Self> {
        let template: FlowTemplate =
            serde_json::from_value(template.clone()).map_err(|e| FlowError::Definition {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;

        let mut r_env = ResolutionEnv::new();
        r_env.add_values(&template.values);

        let mut stages = Vec::with_capacity(template.stages.len());
        for (name, module) in &template.stages {
            stages.push(Stage::from_raw(name, module, template.stage_options.get(name), origin)?);
        }

        for name in template.stage_options.keys() {
            if !template.stages.contains_key(name) {
                tracing::warn!(%origin, stage = %name, "options given for undeclared stage, ignoring");
            }
        }

        tracing::debug!(%origin, stages = stages.len(), "loaded flow definition");
        Ok(Self { stages, r_env })
    }

    /// Stage names in declaration order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.name.as_str())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.name == name)
    }

    /// Environment seeded with the template's global values.
    pub fn r_env(&self) -> &ResolutionEnv {
        &self.r_env
    }

    /// The base environment with one stage's overrides layered on top.
    pub fn stage_r_env(&self, name: &str) -> FlowResult<ResolutionEnv> {
        let stage = self
            .stage(name)
            .ok_or_else(|| FlowError::UnknownStage(name.to_string()))?;
        let mut r_env = self.r_env.clone();
        r_env.add_values(&stage.value_overrides);
        Ok(r_env)
    }
}
