//! Override store: lazy scope access and list-slot mutation.
//!
//! The project document is a JSON map. Override sections (`dependencies`,
//! `values`, and a platform's per-stage maps) are created on first write and
//! are never removed implicitly, so an emptied section persists. Platforms
//! themselves are never created here; a missing platform is `ScopeNotFound`.
//!
//! Every mutation validates before it writes: on error the document is
//! unchanged.

use serde_json::{Map, Value};

use super::error::OverrideError;
use super::scope::{is_reserved_keyword, is_reserved_stage_name, Scope, SlotKind};

/// The raw, persisted project document.
pub type Document = Map<String, Value>;

/// State of a named override slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Unset,
    List(Vec<Value>),
}

impl Slot {
    /// Read a slot out of a slot map, rejecting non-list contents.
    pub fn read(map: &Map<String, Value>, kind: SlotKind, name: &str) -> Result<Self, OverrideError> {
        match map.get(name) {
            None | Some(Value::Null) => Ok(Slot::Unset),
            Some(Value::Array(items)) => Ok(Slot::List(items.clone())),
            Some(_) => Err(OverrideError::NotAList {
                kind,
                name: name.to_string(),
            }),
        }
    }
}

/// Platform map for reading. Fails if the platform is absent or reserved.
pub(crate) fn platform_map<'d>(doc: &'d Document, platform: &str) -> Result<&'d Map<String, Value>, OverrideError> {
    if is_reserved_keyword(platform) {
        return Err(OverrideError::ScopeNotFound(platform.to_string()));
    }
    match doc.get(platform) {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(OverrideError::MalformedScope {
            scope: Scope::Global.to_string(),
            key: platform.to_string(),
        }),
        None => Err(OverrideError::ScopeNotFound(platform.to_string())),
    }
}

/// Platform map for writing. Same existence rules as [`platform_map`].
pub(crate) fn platform_map_mut<'d>(
    doc: &'d mut Document,
    platform: &str,
) -> Result<&'d mut Map<String, Value>, OverrideError> {
    if is_reserved_keyword(platform) {
        return Err(OverrideError::ScopeNotFound(platform.to_string()));
    }
    match doc.get_mut(platform) {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(OverrideError::MalformedScope {
            scope: Scope::Global.to_string(),
            key: platform.to_string(),
        }),
        None => Err(OverrideError::ScopeNotFound(platform.to_string())),
    }
}

/// Reject stage names that collide with the platform's own keys.
pub(crate) fn check_stage_name(platform: &str, stage: &str) -> Result<(), OverrideError> {
    if is_reserved_stage_name(stage) {
        return Err(OverrideError::ScopeNotFound(Scope::Stage { platform, stage }.to_string()));
    }
    Ok(())
}

/// Optional sub-map of `parent` for reading. Absent and null read as `None`.
pub(crate) fn section<'d>(
    parent: &'d Map<String, Value>,
    key: &str,
    scope: &Scope<'_>,
) -> Result<Option<&'d Map<String, Value>>, OverrideError> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(OverrideError::MalformedScope {
            scope: scope.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Sub-map of `parent`, created empty when absent.
fn lazy_section<'d>(
    parent: &'d mut Map<String, Value>,
    key: &str,
    scope: &Scope<'_>,
) -> Result<&'d mut Map<String, Value>, OverrideError> {
    let entry = parent.entry(key.to_string()).or_insert(Value::Null);
    if entry.is_null() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(map) => Ok(map),
        _ => Err(OverrideError::MalformedScope {
            scope: scope.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Slot map of `kind` at `scope`, creating missing override sections.
///
/// The platform must already exist; the stage map and slot map below it are
/// created on demand.
pub fn slot_map_mut<'d>(
    doc: &'d mut Document,
    kind: SlotKind,
    scope: Scope<'_>,
) -> Result<&'d mut Map<String, Value>, OverrideError> {
    let container = match scope {
        Scope::Global => doc,
        Scope::Platform(platform) => platform_map_mut(doc, platform)?,
        Scope::Stage { platform, stage } => {
            check_stage_name(platform, stage)?;
            let platform_map = platform_map_mut(doc, platform)?;
            lazy_section(platform_map, stage, &Scope::Platform(platform))?
        }
    };
    lazy_section(container, kind.key(), &scope)
}

/// Slot map of `kind` at `scope` for reading, without creating anything.
pub fn slot_map<'d>(
    doc: &'d Document,
    kind: SlotKind,
    scope: Scope<'_>,
) -> Result<Option<&'d Map<String, Value>>, OverrideError> {
    let container = match scope {
        Scope::Global => doc,
        Scope::Platform(platform) => platform_map(doc, platform)?,
        Scope::Stage { platform, stage } => {
            check_stage_name(platform, stage)?;
            match section(platform_map(doc, platform)?, stage, &Scope::Platform(platform))? {
                Some(stage_map) => stage_map,
                None => return Ok(None),
            }
        }
    };
    section(container, kind.key(), &scope)
}

/// Mutable counterpart of [`section`]; never creates anything.
fn section_mut<'d>(
    parent: &'d mut Map<String, Value>,
    key: &str,
    scope: &Scope<'_>,
) -> Result<Option<&'d mut Map<String, Value>>, OverrideError> {
    match parent.get_mut(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(OverrideError::MalformedScope {
            scope: scope.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Slot map of `kind` at `scope` if it already exists.
fn existing_slot_map_mut<'d>(
    doc: &'d mut Document,
    kind: SlotKind,
    scope: Scope<'_>,
) -> Result<Option<&'d mut Map<String, Value>>, OverrideError> {
    let container = match scope {
        Scope::Global => doc,
        Scope::Platform(platform) => platform_map_mut(doc, platform)?,
        Scope::Stage { platform, stage } => {
            check_stage_name(platform, stage)?;
            match section_mut(platform_map_mut(doc, platform)?, stage, &Scope::Platform(platform))? {
                Some(stage_map) => stage_map,
                None => return Ok(None),
            }
        }
    };
    section_mut(container, kind.key(), &scope)
}

/// Slot map holding `name`, failing with `NotSet` when its section is absent.
fn set_slot_map_mut<'d>(
    doc: &'d mut Document,
    kind: SlotKind,
    scope: Scope<'_>,
    name: &str,
) -> Result<&'d mut Map<String, Value>, OverrideError> {
    existing_slot_map_mut(doc, kind, scope)?.ok_or_else(|| OverrideError::NotSet {
        kind,
        name: name.to_string(),
    })
}

fn list_mut<'m>(
    map: &'m mut Map<String, Value>,
    kind: SlotKind,
    name: &str,
) -> Result<&'m mut Vec<Value>, OverrideError> {
    match map.get_mut(name) {
        Some(Value::Array(items)) => Ok(items),
        None | Some(Value::Null) => Err(OverrideError::NotSet {
            kind,
            name: name.to_string(),
        }),
        Some(_) => Err(OverrideError::NotAList {
            kind,
            name: name.to_string(),
        }),
    }
}

/// Append `values` to a slot, setting it if unset.
pub fn append(
    doc: &mut Document,
    kind: SlotKind,
    scope: Scope<'_>,
    name: &str,
    values: Vec<Value>,
) -> Result<(), OverrideError> {
    let map = slot_map_mut(doc, kind, scope)?;
    match map.get_mut(name) {
        Some(Value::Array(items)) => items.extend(values),
        Some(other) if !other.is_null() => {
            return Err(OverrideError::NotAList {
                kind,
                name: name.to_string(),
            });
        }
        _ => {
            map.insert(name.to_string(), Value::Array(values));
        }
    }
    tracing::debug!(%kind, %scope, name, "appended override values");
    Ok(())
}

/// Drop every element of a slot that equals one of `values`.
pub fn remove_by_values(
    doc: &mut Document,
    kind: SlotKind,
    scope: Scope<'_>,
    name: &str,
    values: &[Value],
) -> Result<(), OverrideError> {
    let items = list_mut(set_slot_map_mut(doc, kind, scope, name)?, kind, name)?;
    let before = items.len();
    items.retain(|item| !values.contains(item));
    tracing::debug!(%kind, %scope, name, removed = before - items.len(), "removed override values");
    Ok(())
}

/// Remove the elements at `indices` from a slot.
///
/// All indices are validated before anything is removed. Duplicates name the
/// same position once.
pub fn remove_by_indices(
    doc: &mut Document,
    kind: SlotKind,
    scope: Scope<'_>,
    name: &str,
    indices: &[usize],
) -> Result<(), OverrideError> {
    if indices.is_empty() {
        return Err(OverrideError::EmptyIndexList);
    }
    let items = list_mut(set_slot_map_mut(doc, kind, scope, name)?, kind, name)?;

    let mut descending = indices.to_vec();
    descending.sort_unstable_by(|a, b| b.cmp(a));
    descending.dedup();

    if let Some(&index) = descending.first().filter(|&&index| index >= items.len()) {
        return Err(OverrideError::IndexOutOfRange {
            index,
            len: items.len(),
        });
    }

    // Highest first: removing a position never shifts a lower one.
    for &index in &descending {
        items.remove(index);
    }
    tracing::debug!(%kind, %scope, name, ?descending, "removed override indices");
    Ok(())
}

/// Remove a slot entirely, returning its previous contents.
pub fn unset(
    doc: &mut Document,
    kind: SlotKind,
    scope: Scope<'_>,
    name: &str,
) -> Result<Value, OverrideError> {
    let map = set_slot_map_mut(doc, kind, scope, name)?;
    let previous = match map.get(name) {
        None | Some(Value::Null) => {
            return Err(OverrideError::NotSet {
                kind,
                name: name.to_string(),
            });
        }
        Some(value) => value.clone(),
    };
    // retain keeps the remaining keys in insertion order
    map.retain(|key, _| key != name);
    tracing::debug!(%kind, %scope, name, "unset override");
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    fn slot(doc: &Document, kind: SlotKind, scope: Scope<'_>, name: &str) -> Slot {
        match slot_map(doc, kind, scope).unwrap() {
            Some(map) => Slot::read(map, kind, name).unwrap(),
            None => Slot::Unset,
        }
    }

    #[test]
    fn test_lazy_creation_at_stage_scope() {
        let mut d = doc(json!({"p": {}}));
        let scope = Scope::Stage { platform: "p", stage: "route" };
        slot_map_mut(&mut d, SlotKind::Values, scope).unwrap();
        assert_eq!(Value::Object(d), json!({"p": {"route": {"values": {}}}}));
    }

    #[test]
    fn test_missing_platform_is_scope_not_found() {
        let mut d = doc(json!({}));
        let err = slot_map_mut(&mut d, SlotKind::Values, Scope::Platform("nope")).unwrap_err();
        assert_eq!(err, OverrideError::ScopeNotFound("nope".to_string()));
        assert!(d.is_empty());
    }

    #[test]
    fn test_reserved_name_is_not_a_platform() {
        let mut d = doc(json!({"values": {}}));
        let err = slot_map_mut(&mut d, SlotKind::Values, Scope::Platform("values")).unwrap_err();
        assert_eq!(err, OverrideError::ScopeNotFound("values".to_string()));
    }

    #[test]
    fn test_slot_key_is_not_a_stage() {
        let mut d = doc(json!({"p": {"values": {"seed": [1]}}}));
        let scope = Scope::Stage { platform: "p", stage: "values" };
        let err = append(&mut d, SlotKind::Values, scope, "x", vec![json!(1)]).unwrap_err();
        assert_eq!(err, OverrideError::ScopeNotFound("p.values".to_string()));
        assert_eq!(d["p"], json!({"values": {"seed": [1]}}));
        assert!(slot_map(&d, SlotKind::Values, scope).is_err());
        assert!(unset(&mut d, SlotKind::Values, scope, "seed").is_err());
    }

    #[test]
    fn test_malformed_section() {
        let mut d = doc(json!({"dependencies": 5}));
        let err = slot_map_mut(&mut d, SlotKind::Dependencies, Scope::Global).unwrap_err();
        assert!(matches!(err, OverrideError::MalformedScope { .. }));
    }

    #[test]
    fn test_append_to_unset_then_again() {
        let mut d = doc(json!({}));
        append(&mut d, SlotKind::Values, Scope::Global, "x", vec![json!(1), json!(2)]).unwrap();
        append(&mut d, SlotKind::Values, Scope::Global, "x", vec![json!(2), json!(3)]).unwrap();
        assert_eq!(
            slot(&d, SlotKind::Values, Scope::Global, "x"),
            Slot::List(vec![json!(1), json!(2), json!(2), json!(3)])
        );
    }

    #[test]
    fn test_append_to_scalar_fails() {
        let mut d = doc(json!({"values": {"x": "scalar"}}));
        let err = append(&mut d, SlotKind::Values, Scope::Global, "x", vec![json!(1)]).unwrap_err();
        assert_eq!(
            err,
            OverrideError::NotAList {
                kind: SlotKind::Values,
                name: "x".to_string()
            }
        );
        assert_eq!(d["values"]["x"], json!("scalar"));
    }

    #[test]
    fn test_remove_by_values_filters_all_occurrences() {
        let mut d = doc(json!({"dependencies": {"srcs": ["a", "b", "a", "c"]}}));
        remove_by_values(&mut d, SlotKind::Dependencies, Scope::Global, "srcs", &[json!("a")]).unwrap();
        assert_eq!(d["dependencies"]["srcs"], json!(["b", "c"]));
    }

    #[test]
    fn test_remove_by_values_unset() {
        let mut d = doc(json!({}));
        let err = remove_by_values(&mut d, SlotKind::Values, Scope::Global, "x", &[json!(1)]).unwrap_err();
        assert!(matches!(err, OverrideError::NotSet { .. }));
        assert!(d.is_empty());
    }

    #[test]
    fn test_remove_by_indices() {
        let mut d = doc(json!({"values": {"x": ["a", "b", "c", "d"]}}));
        remove_by_indices(&mut d, SlotKind::Values, Scope::Global, "x", &[0, 2]).unwrap();
        assert_eq!(d["values"]["x"], json!(["b", "d"]));
    }

    #[test]
    fn test_remove_by_indices_unsorted_input() {
        let mut d = doc(json!({"values": {"x": ["a", "b", "c", "d"]}}));
        remove_by_indices(&mut d, SlotKind::Values, Scope::Global, "x", &[1, 3, 0]).unwrap();
        assert_eq!(d["values"]["x"], json!(["c"]));
    }

    #[test]
    fn test_remove_by_indices_out_of_range_is_atomic() {
        let mut d = doc(json!({"values": {"x": ["a", "b"]}}));
        let err = remove_by_indices(&mut d, SlotKind::Values, Scope::Global, "x", &[0, 2]).unwrap_err();
        assert_eq!(err, OverrideError::IndexOutOfRange { index: 2, len: 2 });
        assert_eq!(d["values"]["x"], json!(["a", "b"]));
    }

    #[test]
    fn test_remove_by_indices_duplicates() {
        let mut d = doc(json!({"values": {"x": ["a", "b", "c"]}}));
        remove_by_indices(&mut d, SlotKind::Values, Scope::Global, "x", &[1, 1]).unwrap();
        assert_eq!(d["values"]["x"], json!(["a", "c"]));
    }

    #[test]
    fn test_remove_by_indices_empty() {
        let mut d = doc(json!({}));
        let err = remove_by_indices(&mut d, SlotKind::Values, Scope::Global, "x", &[]).unwrap_err();
        assert_eq!(err, OverrideError::EmptyIndexList);
    }

    #[test]
    fn test_unset_keeps_order_and_empty_section() {
        let mut d = doc(json!({"dependencies": {"a": ["1"], "b": ["2"], "c": ["3"]}}));
        unset(&mut d, SlotKind::Dependencies, Scope::Global, "a").unwrap();
        let keys: Vec<_> = d["dependencies"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);

        unset(&mut d, SlotKind::Dependencies, Scope::Global, "b").unwrap();
        unset(&mut d, SlotKind::Dependencies, Scope::Global, "c").unwrap();
        assert_eq!(d["dependencies"], json!({}));
    }

    #[test]
    fn test_unset_missing() {
        let mut d = doc(json!({}));
        let err = unset(&mut d, SlotKind::Dependencies, Scope::Global, "a").unwrap_err();
        assert_eq!(
            err,
            OverrideError::NotSet {
                kind: SlotKind::Dependencies,
                name: "a".to_string()
            }
        );
        assert!(d.is_empty());
    }

    #[test]
    fn test_unset_in_absent_stage_creates_nothing() {
        let mut d = doc(json!({"p": {}}));
        let scope = Scope::Stage { platform: "p", stage: "route" };
        assert!(unset(&mut d, SlotKind::Values, scope, "x").is_err());
        assert_eq!(d["p"], json!({}));
    }
}
