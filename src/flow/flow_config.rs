//! Flow configuration for one platform.
//!
//! Combines a [`FlowDefinition`] with a project's overrides:
//! 1. Definition values
//! 2. Project values visible at the platform
//! 3. Per-stage overrides (definition, then project)
//!
//! Dependencies are resolved through the environment and materialized as
//! absolute paths.

use std::path::{Path, PathBuf};

use flow_env::ResolutionEnv;
use serde_json::{json, Map, Value};

use super::definition::FlowDefinition;
use super::error::{FlowError, FlowResult};
use super::paths::resolve_paths;
use super::stage::Stage;
use crate::config::{replace_entries, ProjectFlowConfig};

/// Resolved, read-only configuration used to run a platform's stages.
///
/// Owns copies of everything it uses; neither the project document nor the
/// definition's stages are touched.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    platform: String,
    r_env: ResolutionEnv,
    stages: Vec<Stage>,
    dependencies: Map<String, Value>,
}

impl FlowConfig {
    /// Resolve `definition` against `project` for `platform`.
    ///
    /// Relative dependencies are anchored to the project's base directory.
    pub fn new(project: &ProjectFlowConfig, definition: &FlowDefinition, platform: &str) -> FlowResult<Self> {
        let base_dir = project.base_dir().map_err(|source| FlowError::Io {
            path: project.path().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
            source,
        })?;
        Self::with_base_dir(project, definition, platform, &base_dir)
    }

    /// Like [`FlowConfig::new`] with an explicit anchor for relative paths.
    pub fn with_base_dir(
        project: &ProjectFlowConfig,
        definition: &FlowDefinition,
        platform: &str,
        base_dir: &Path,
    ) -> FlowResult<Self> {
        let mut r_env = definition.r_env().clone();
        r_env.add_values(&project.values_raw(Some(platform), None)?);

        let dependencies = project
            .dependencies_raw(Some(platform))?
            .iter()
            .map(|(name, raw)| (name.clone(), resolve_paths(&r_env.resolve(raw), base_dir)))
            .collect::<Map<String, Value>>();

        let mut stages = definition.stages().to_vec();
        for stage in &mut stages {
            let overrides = project.values_raw(Some(platform), Some(&stage.name))?;
            replace_entries(&mut stage.value_overrides, &overrides);
        }

        tracing::info!(
            platform,
            stages = stages.len(),
            dependencies = dependencies.len(),
            base_dir = %base_dir.display(),
            "resolved flow configuration"
        );

        Ok(Self {
            platform: platform.to_string(),
            r_env,
            stages,
            dependencies,
        })
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Resolved dependencies; every path is absolute.
    pub fn dependencies(&self) -> &Map<String, Value> {
        &self.dependencies
    }

    pub fn dependency(&self, name: &str) -> Option<&Value> {
        self.dependencies.get(name)
    }

    /// Environment shared by all stages of this platform.
    pub fn base_env(&self) -> &ResolutionEnv {
        &self.r_env
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.name.as_str())
    }

    pub fn stage(&self, name: &str) -> FlowResult<&Stage> {
        self.stages
            .iter()
            .find(|stage| stage.name == name)
            .ok_or_else(|| FlowError::UnknownStage(name.to_string()))
    }

    /// Full environment of one stage: base, platform values, then the
    /// stage's overrides. The most specific layer wins per name.
    pub fn r_env(&self, stage_name: &str) -> FlowResult<ResolutionEnv> {
        let stage = self.stage(stage_name)?;
        let mut r_env = self.r_env.clone();
        r_env.add_values(&stage.value_overrides);
        Ok(r_env)
    }

    /// Resolve a value in a stage's environment, failing on any reference
    /// that has no value.
    pub fn resolve_for_stage(&self, stage_name: &str, value: &Value) -> FlowResult<Value> {
        Ok(self.r_env(stage_name)?.resolve_strict(value)?)
    }

    /// JSON view of the resolved configuration.
    pub fn summary(&self) -> FlowResult<Value> {
        let mut stages = Map::new();
        for stage in &self.stages {
            let env = self.r_env(&stage.name)?;
            stages.insert(
                stage.name.clone(),
                json!({
                    "module": stage.module.as_str(),
                    "values": env.values(),
                }),
            );
        }
        Ok(json!({
            "platform": self.platform,
            "dependencies": self.dependencies,
            "stages": stages,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(value: Value) -> ProjectFlowConfig {
        ProjectFlowConfig::from_document(value.as_object().cloned().unwrap())
    }

    fn definition() -> FlowDefinition {
        FlowDefinition::from_value(&json!({
            "values": {"Y": 1, "Z": 9, "top": "top"},
            "stages": {"synth": "common:synth", "route": "common:route"},
            "stage_options": {"route": {"values": {"W": "route-default"}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_value_precedence() {
        let project = project(json!({
            "p": {
                "values": {"Y": 2},
                "route": {"values": {"Y": 3}}
            }
        }));
        let flow = FlowConfig::with_base_dir(&project, &definition(), "p", Path::new("/proj")).unwrap();

        let route = flow.r_env("route").unwrap();
        assert_eq!(route.get("Y"), Some(&json!(3)));
        assert_eq!(route.get("Z"), Some(&json!(9)));
        assert_eq!(route.get("W"), Some(&json!("route-default")));

        let synth = flow.r_env("synth").unwrap();
        assert_eq!(synth.get("Y"), Some(&json!(2)));
    }

    #[test]
    fn test_dependencies_resolved_and_absolute() {
        let project = project(json!({
            "dependencies": {"sources": ["rtl/${top}.v"]},
            "p": {"dependencies": {"xdc": ["constraints/../pins.xdc"]}}
        }));
        let flow = FlowConfig::with_base_dir(&project, &definition(), "p", Path::new("/nonexistent-proj")).unwrap();

        assert_eq!(flow.dependency("sources"), Some(&json!(["/nonexistent-proj/rtl/top.v"])));
        assert_eq!(flow.dependency("xdc"), Some(&json!(["/nonexistent-proj/pins.xdc"])));
    }

    #[test]
    fn test_definition_not_mutated() {
        let def = definition();
        let project = project(json!({"p": {"route": {"values": {"W": "project"}}}, "q": {}}));

        let p = FlowConfig::with_base_dir(&project, &def, "p", Path::new("/proj")).unwrap();
        let q = FlowConfig::with_base_dir(&project, &def, "q", Path::new("/proj")).unwrap();

        assert_eq!(p.r_env("route").unwrap().get("W"), Some(&json!("project")));
        assert_eq!(q.r_env("route").unwrap().get("W"), Some(&json!("route-default")));
        assert_eq!(def.stage("route").unwrap().value_overrides["W"], json!("route-default"));
    }

    #[test]
    fn test_unknown_platform() {
        let project = project(json!({}));
        let err = FlowConfig::with_base_dir(&project, &definition(), "p", Path::new("/proj")).unwrap_err();
        assert!(matches!(err, FlowError::Override(_)));
    }

    #[test]
    fn test_unknown_stage() {
        let project = project(json!({"p": {}}));
        let flow = FlowConfig::with_base_dir(&project, &definition(), "p", Path::new("/proj")).unwrap();
        assert!(matches!(flow.stage("bitstream"), Err(FlowError::UnknownStage(_))));
        assert!(matches!(flow.r_env("bitstream"), Err(FlowError::UnknownStage(_))));
    }

    #[test]
    fn test_resolve_for_stage_is_strict() {
        let project = project(json!({"p": {}}));
        let flow = FlowConfig::with_base_dir(&project, &definition(), "p", Path::new("/proj")).unwrap();

        assert_eq!(flow.resolve_for_stage("route", &json!("${top}.eblif")).unwrap(), json!("top.eblif"));
        let err = flow.resolve_for_stage("route", &json!("${missing}")).unwrap_err();
        assert!(matches!(err, FlowError::Resolve(_)));
    }

    #[test]
    fn test_summary() {
        let project = project(json!({"p": {"values": {"Y": 2}}}));
        let flow = FlowConfig::with_base_dir(&project, &definition(), "p", Path::new("/proj")).unwrap();
        let summary = flow.summary().unwrap();
        assert_eq!(summary["platform"], json!("p"));
        assert_eq!(summary["stages"]["synth"]["module"], json!("common:synth"));
        assert_eq!(summary["stages"]["synth"]["values"]["Y"], json!(2));
    }
}
