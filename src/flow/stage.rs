//! Stage declarations.
//!
//! A stage binds a name to the module that executes it, the inputs it takes,
//! the outputs it produces, and the values it overrides for its own run.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{FlowError, FlowResult};

/// How a declared input/output must be provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoQualifier {
    /// Must be present (`name`).
    Required,
    /// May be absent (`name?`).
    Optional,
    /// Produced only when explicitly requested (`name!`).
    OnDemand,
}

/// A declared input or output of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageIo {
    pub name: String,
    pub qualifier: IoQualifier,
}

impl StageIo {
    /// Parse a declaration such as `eblif`, `sdc?` or `bitstream_log!`.
    pub fn parse(decl: &str) -> Self {
        let (name, qualifier) = if let Some(name) = decl.strip_suffix('?') {
            (name, IoQualifier::Optional)
        } else if let Some(name) = decl.strip_suffix('!') {
            (name, IoQualifier::OnDemand)
        } else {
            (decl, IoQualifier::Required)
        };
        Self {
            name: name.to_string(),
            qualifier,
        }
    }

    pub fn is_required(&self) -> bool {
        self.qualifier == IoQualifier::Required
    }
}

/// Reference to the module that runs a stage, e.g. `common:synth`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleRef(String);

impl ModuleRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `:`, if the reference is namespaced.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(':').map(|(namespace, _)| namespace)
    }

    /// The module name without its namespace.
    pub fn module_name(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-stage options as written in a flow definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOptions {
    #[serde(default)]
    pub takes: Vec<String>,

    #[serde(default)]
    pub produces: Vec<String>,

    /// Module parameters, passed through untouched.
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Values overridden for this stage only.
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// A named unit of pipeline work.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub module: ModuleRef,
    pub takes: Vec<StageIo>,
    pub produces: Vec<StageIo>,
    pub params: Map<String, Value>,

    /// Values layered over the flow's environment when this stage runs.
    pub value_overrides: Map<String, Value>,
}

impl Stage {
    pub fn new(name: impl Into<String>, module: ModuleRef, options: StageOptions) -> Self {
        Self {
            name: name.into(),
            module,
            takes: options.takes.iter().map(|decl| StageIo::parse(decl)).collect(),
            produces: options.produces.iter().map(|decl| StageIo::parse(decl)).collect(),
            params: options.params,
            value_overrides: options.values,
        }
    }

    /// Build a stage from the raw JSON of a flow definition.
    pub fn from_raw(name: &str, module: &Value, options: Option<&Value>, origin: &str) -> FlowResult<Self> {
        let module = match module {
            Value::String(reference) => ModuleRef::new(reference.clone()),
            other => {
                return Err(FlowError::Definition {
                    origin: origin.to_string(),
                    reason: format!("stage `{}` module must be a string, got {}", name, other),
                });
            }
        };
        let options = match options {
            None | Some(Value::Null) => StageOptions::default(),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| FlowError::Definition {
                origin: origin.to_string(),
                reason: format!("stage `{}` options: {}", name, e),
            })?,
        };
        Ok(Self::new(name, module, options))
    }

    /// Inputs that must be present for the stage to run.
    pub fn required_inputs(&self) -> impl Iterator<Item = &StageIo> {
        self.takes.iter().filter(|io| io.is_required())
    }
}
