//! Project flow configuration: the persisted, user-editable overrides.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::aggregate::aggregate;
use super::error::{ConfigError, OverrideError};
use super::io::{digest_on_disk, load_document, save_document, ConfigSource};
use super::scope::{is_reserved_keyword, Scope, SlotKind, DEFAULT_PLATFORM_KEY, DEFAULT_TARGET_KEY};
use super::store::{self, platform_map, platform_map_mut, section, slot_map, Document, Slot};

/// A project's override document and where it lives on disk.
///
/// This is the only owner of the raw document. Everything derived from it
/// (aggregates, [`crate::flow::FlowConfig`]) is a copy.
#[derive(Debug, Clone, Default)]
pub struct ProjectFlowConfig {
    doc: Document,
    path: Option<PathBuf>,
    source: Option<ConfigSource>,
}

impl ProjectFlowConfig {
    /// Empty, in-memory configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing document.
    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            path: None,
            source: None,
        }
    }

    /// Open the configuration at `path`.
    ///
    /// A missing file yields an empty configuration bound to that path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no project configuration yet, starting empty");
            return Ok(Self {
                doc: Document::new(),
                path: Some(path),
                source: None,
            });
        }
        let (doc, source) = load_document(&path)?;
        Ok(Self {
            doc,
            path: Some(path),
            source: Some(source),
        })
    }

    /// Save back to the file this configuration was opened from.
    ///
    /// Fails with [`ConfigError::ModifiedOnDisk`] if the file changed since it
    /// was loaded (or appeared after an empty configuration was opened).
    pub fn save(&mut self) -> Result<(), ConfigError> {
        let path = self.path.clone().ok_or(ConfigError::NoPath)?;
        let expected = self.source.as_ref().map(|source| source.digest.as_str());
        let on_disk = digest_on_disk(&path)?;
        if on_disk.is_some() && on_disk.as_deref() != expected {
            return Err(ConfigError::ModifiedOnDisk(path));
        }
        self.write(path)
    }

    /// Save to a new location and rebind this configuration to it.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        self.write(path.into())
    }

    fn write(&mut self, path: PathBuf) -> Result<(), ConfigError> {
        let digest = save_document(&self.doc, &path)?;
        self.source = Some(ConfigSource {
            path: path.clone(),
            digest,
        });
        self.path = Some(path);
        Ok(())
    }

    /// The raw document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Give up ownership of the raw document.
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// File this configuration is bound to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Provenance of the last load or save.
    pub fn source(&self) -> Option<&ConfigSource> {
        self.source.as_ref()
    }

    /// Directory relative dependency paths are anchored to.
    ///
    /// The project file's directory, or the current directory for an
    /// in-memory configuration. Always absolute.
    pub fn base_dir(&self) -> std::io::Result<PathBuf> {
        let dir = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(std::env::current_dir()?.join(dir))
        }
    }

    // ------------------------------------------------------------------
    // Platforms and defaults
    // ------------------------------------------------------------------

    /// Platform names, in document order, excluding reserved keywords.
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.doc
            .keys()
            .map(String::as_str)
            .filter(|name| !is_reserved_keyword(name))
    }

    /// Whether a platform entry exists.
    pub fn has_platform(&self, platform: &str) -> bool {
        !is_reserved_keyword(platform) && self.doc.contains_key(platform)
    }

    /// Add an empty platform entry.
    pub fn add_platform(&mut self, platform: &str) -> Result<(), OverrideError> {
        if is_reserved_keyword(platform) || self.doc.contains_key(platform) {
            return Err(OverrideError::AlreadyExists(platform.to_string()));
        }
        self.doc.insert(platform.to_string(), Value::Object(Map::new()));
        tracing::info!(platform, "added platform");
        Ok(())
    }

    pub fn default_platform(&self) -> Option<&str> {
        self.doc.get(DEFAULT_PLATFORM_KEY).and_then(Value::as_str)
    }

    pub fn set_default_platform(&mut self, platform: &str) {
        self.doc
            .insert(DEFAULT_PLATFORM_KEY.to_string(), Value::String(platform.to_string()));
    }

    pub fn default_target(&self, platform: &str) -> Result<Option<&str>, OverrideError> {
        Ok(platform_map(&self.doc, platform)?
            .get(DEFAULT_TARGET_KEY)
            .and_then(Value::as_str))
    }

    pub fn set_default_target(&mut self, platform: &str, target: &str) -> Result<(), OverrideError> {
        platform_map_mut(&mut self.doc, platform)?
            .insert(DEFAULT_TARGET_KEY.to_string(), Value::String(target.to_string()));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Raw aggregates
    // ------------------------------------------------------------------

    /// Dependencies visible at a platform (or globally), unresolved.
    pub fn dependencies_raw(&self, platform: Option<&str>) -> Result<Map<String, Value>, OverrideError> {
        aggregate(&self.doc, SlotKind::Dependencies, platform, None)
    }

    /// Values visible at a platform/stage selection, unresolved.
    pub fn values_raw(
        &self,
        platform: Option<&str>,
        stage: Option<&str>,
    ) -> Result<Map<String, Value>, OverrideError> {
        aggregate(&self.doc, SlotKind::Values, platform, stage)
    }

    /// Values set at exactly one stage scope; empty when there are none.
    pub fn stage_value_overrides(&self, platform: &str, stage: &str) -> Result<Map<String, Value>, OverrideError> {
        Ok(slot_map(&self.doc, SlotKind::Values, Scope::Stage { platform, stage })?
            .cloned()
            .unwrap_or_default())
    }

    /// Dependencies set at exactly the platform scope; empty when there are none.
    pub fn dependency_platform_overrides(&self, platform: &str) -> Result<Map<String, Value>, OverrideError> {
        let scope = Scope::Platform(platform);
        Ok(section(platform_map(&self.doc, platform)?, SlotKind::Dependencies.key(), &scope)?
            .cloned()
            .unwrap_or_default())
    }

    /// Current state of one slot.
    pub fn slot(&self, kind: SlotKind, scope: Scope<'_>, name: &str) -> Result<Slot, OverrideError> {
        match slot_map(&self.doc, kind, scope)? {
            Some(map) => Slot::read(map, kind, name),
            None => Ok(Slot::Unset),
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn append(
        &mut self,
        kind: SlotKind,
        scope: Scope<'_>,
        name: &str,
        values: Vec<Value>,
    ) -> Result<(), OverrideError> {
        store::append(&mut self.doc, kind, scope, name, values)
    }

    pub fn remove_by_values(
        &mut self,
        kind: SlotKind,
        scope: Scope<'_>,
        name: &str,
        values: &[Value],
    ) -> Result<(), OverrideError> {
        store::remove_by_values(&mut self.doc, kind, scope, name, values)
    }

    pub fn remove_by_indices(
        &mut self,
        kind: SlotKind,
        scope: Scope<'_>,
        name: &str,
        indices: &[usize],
    ) -> Result<(), OverrideError> {
        store::remove_by_indices(&mut self.doc, kind, scope, name, indices)
    }

    pub fn unset(&mut self, kind: SlotKind, scope: Scope<'_>, name: &str) -> Result<Value, OverrideError> {
        store::unset(&mut self.doc, kind, scope, name)
    }

    pub fn add_dependencies(&mut self, scope: Scope<'_>, name: &str, deps: Vec<Value>) -> Result<(), OverrideError> {
        self.append(SlotKind::Dependencies, scope, name, deps)
    }

    pub fn add_values(&mut self, scope: Scope<'_>, name: &str, values: Vec<Value>) -> Result<(), OverrideError> {
        self.append(SlotKind::Values, scope, name, values)
    }

    pub fn remove_dependencies_by_values(
        &mut self,
        scope: Scope<'_>,
        name: &str,
        deps: &[Value],
    ) -> Result<(), OverrideError> {
        self.remove_by_values(SlotKind::Dependencies, scope, name, deps)
    }

    pub fn remove_dependencies_by_indices(
        &mut self,
        scope: Scope<'_>,
        name: &str,
        indices: &[usize],
    ) -> Result<(), OverrideError> {
        self.remove_by_indices(SlotKind::Dependencies, scope, name, indices)
    }

    pub fn remove_values_by_values(
        &mut self,
        scope: Scope<'_>,
        name: &str,
        values: &[Value],
    ) -> Result<(), OverrideError> {
        self.remove_by_values(SlotKind::Values, scope, name, values)
    }

    pub fn remove_values_by_indices(
        &mut self,
        scope: Scope<'_>,
        name: &str,
        indices: &[usize],
    ) -> Result<(), OverrideError> {
        self.remove_by_indices(SlotKind::Values, scope, name, indices)
    }

    pub fn unset_dependency(&mut self, scope: Scope<'_>, name: &str) -> Result<Value, OverrideError> {
        self.unset(SlotKind::Dependencies, scope, name)
    }

    pub fn unset_value(&mut self, scope: Scope<'_>, name: &str) -> Result<Value, OverrideError> {
        self.unset(SlotKind::Values, scope, name)
    }
}
