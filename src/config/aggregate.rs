//! Scoped override resolution
//!
//! Flattens the global, platform and stage slot maps into one mapping:
//! - Most specific scope wins
//! - Whole-entry replacement per name (lists are never concatenated)
//! - Names present only in a less specific scope are kept

use serde_json::{Map, Value};

use super::error::OverrideError;
use super::scope::{Scope, SlotKind};
use super::store::{check_stage_name, platform_map, section, Document};

/// Layer `overlay` onto `base`, replacing each named entry entirely.
pub fn replace_entries(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (name, value) in overlay {
        base.insert(name.clone(), value.clone());
    }
}

/// Apply layers in order (first is base, last has highest precedence).
pub fn override_layers<'a, I>(layers: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut resolved = Map::new();
    for layer in layers {
        replace_entries(&mut resolved, layer);
    }
    resolved
}

/// Aggregate the `kind` slot maps visible from a platform/stage selection.
///
/// The platform must exist. A stage with no entry in the platform simply
/// contributes nothing. The returned map is a copy; the document is not
/// touched.
pub fn aggregate(
    doc: &Document,
    kind: SlotKind,
    platform: Option<&str>,
    stage: Option<&str>,
) -> Result<Map<String, Value>, OverrideError> {
    let mut layers: Vec<&Map<String, Value>> = Vec::with_capacity(3);

    if let Some(global) = section(doc, kind.key(), &Scope::Global)? {
        layers.push(global);
    }

    if let Some(platform) = platform {
        let platform_scope = Scope::Platform(platform);
        let platform_node = platform_map(doc, platform)?;
        if let Some(platform_slots) = section(platform_node, kind.key(), &platform_scope)? {
            layers.push(platform_slots);
        }

        if let Some(stage) = stage {
            check_stage_name(platform, stage)?;
            if let Some(stage_node) = section(platform_node, stage, &platform_scope)? {
                let stage_scope = Scope::Stage { platform, stage };
                if let Some(stage_slots) = section(stage_node, kind.key(), &stage_scope)? {
                    layers.push(stage_slots);
                }
            }
        }
    }

    let resolved = override_layers(layers);
    tracing::debug!(
        %kind,
        platform = platform.unwrap_or("-"),
        stage = stage.unwrap_or("-"),
        entries = resolved.len(),
        "aggregated overrides"
    );
    Ok(resolved)
}
