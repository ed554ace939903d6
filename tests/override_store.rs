//! Override store behaviour through the project configuration API
//!
//! Append, remove-by-value, remove-by-index and unset at every scope, plus the
//! all-or-nothing guarantee on errors.

mod fixtures;

use f4pga_flow::config::{OverrideError, ProjectFlowConfig, Scope, Slot, SlotKind};
use serde_json::{json, Value};

fn project(value: Value) -> ProjectFlowConfig {
    ProjectFlowConfig::from_document(value.as_object().cloned().unwrap())
}

fn strings(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| json!(s)).collect()
}

// =============================================================================
// Append
// =============================================================================

#[test]
fn test_append_concatenates_in_call_order() {
    let cases: Vec<(Vec<Value>, Vec<Value>)> = vec![
        (strings(&["a"]), strings(&["b"])),
        (strings(&["a", "b"]), strings(&["b", "a"])),
        (vec![], strings(&["x"])),
        (strings(&["x"]), vec![]),
        (vec![json!(1), json!("two")], vec![json!([3])]),
    ];

    for scope in [
        Scope::Global,
        Scope::Platform("p"),
        Scope::Stage { platform: "p", stage: "route" },
    ] {
        for (first, second) in &cases {
            let mut cfg = project(json!({"p": {}}));
            cfg.append(SlotKind::Dependencies, scope, "srcs", first.clone()).unwrap();
            cfg.append(SlotKind::Dependencies, scope, "srcs", second.clone()).unwrap();

            let expected: Vec<Value> = first.iter().chain(second.iter()).cloned().collect();
            assert_eq!(
                cfg.slot(SlotKind::Dependencies, scope, "srcs").unwrap(),
                Slot::List(expected),
                "scope {}",
                scope
            );
        }
    }
}

#[test]
fn test_append_to_existing_list_from_document() {
    let (_temp, path) = fixtures::scratch_project();
    let mut cfg = ProjectFlowConfig::open(&path).unwrap();
    cfg.add_dependencies(Scope::Global, "sources", strings(&["rtl/top.v"]))
        .unwrap();
    assert_eq!(
        cfg.slot(SlotKind::Dependencies, Scope::Global, "sources").unwrap(),
        Slot::List(strings(&["rtl/counter.v", "rtl/top.v"]))
    );
}

#[test]
fn test_append_to_scalar_value_is_not_a_list() {
    let (_temp, path) = fixtures::scratch_project();
    let mut cfg = ProjectFlowConfig::open(&path).unwrap();
    let before = cfg.document().clone();

    let err = cfg
        .add_values(Scope::Platform("xc7a50t_test"), "vpr_seed", vec![json!(8)])
        .unwrap_err();

    assert_eq!(
        err,
        OverrideError::NotAList {
            kind: SlotKind::Values,
            name: "vpr_seed".to_string()
        }
    );
    assert_eq!(cfg.document(), &before);
}

#[test]
fn test_append_to_unknown_platform() {
    let mut cfg = project(json!({}));
    let err = cfg
        .add_dependencies(Scope::Platform("nope"), "xdc", strings(&["a.xdc"]))
        .unwrap_err();
    assert_eq!(err, OverrideError::ScopeNotFound("nope".to_string()));
    assert!(cfg.document().is_empty());
}

#[test]
fn test_platform_keys_are_not_stages() {
    let mut cfg = project(json!({"p": {"values": {"seed": [1]}, "default_target": "route"}}));
    let before = cfg.document().clone();

    for stage in ["values", "dependencies", "default_target"] {
        let scope = Scope::Stage { platform: "p", stage };
        assert_eq!(
            cfg.add_values(scope, "x", vec![json!(1)]).unwrap_err(),
            OverrideError::ScopeNotFound(format!("p.{}", stage))
        );
        assert!(cfg.remove_values_by_indices(scope, "seed", &[0]).is_err());
        assert!(cfg.unset_value(scope, "seed").is_err());
        assert!(cfg.values_raw(Some("p"), Some(stage)).is_err());
    }

    assert_eq!(cfg.document(), &before);
    assert_eq!(cfg.values_raw(Some("p"), None).unwrap()["seed"], json!([1]));
}

// =============================================================================
// Remove by value
// =============================================================================

#[test]
fn test_remove_by_values_is_idempotent() {
    let start = json!({"values": {"opts": ["a", "b", "c", "a", "d"]}});
    let removal = strings(&["a", "d"]);

    let mut once = project(start.clone());
    once.remove_values_by_values(Scope::Global, "opts", &removal).unwrap();

    let mut twice = project(start);
    twice.remove_values_by_values(Scope::Global, "opts", &removal).unwrap();
    twice.remove_values_by_values(Scope::Global, "opts", &removal).unwrap();

    assert_eq!(once.document(), twice.document());
    assert_eq!(once.document()["values"]["opts"], json!(["b", "c"]));
}

#[test]
fn test_remove_all_values_leaves_empty_list() {
    let mut cfg = project(json!({"values": {"opts": ["a"]}}));
    cfg.remove_values_by_values(Scope::Global, "opts", &strings(&["a"]))
        .unwrap();
    assert_eq!(cfg.document()["values"]["opts"], json!([]));
}

#[test]
fn test_remove_by_values_on_scalar() {
    let mut cfg = project(json!({"values": {"top": "counter"}}));
    let err = cfg
        .remove_values_by_values(Scope::Global, "top", &strings(&["counter"]))
        .unwrap_err();
    assert!(matches!(err, OverrideError::NotAList { .. }));
}

// =============================================================================
// Remove by index
// =============================================================================

#[test]
fn test_remove_by_indices_example() {
    let mut cfg = project(json!({"p": {"route": {"dependencies": {"x": ["a", "b", "c", "d"]}}}}));
    let scope = Scope::Stage { platform: "p", stage: "route" };
    cfg.remove_dependencies_by_indices(scope, "x", &[0, 2]).unwrap();
    assert_eq!(
        cfg.slot(SlotKind::Dependencies, scope, "x").unwrap(),
        Slot::List(strings(&["b", "d"]))
    );
}

#[test]
fn test_remove_by_indices_out_of_range_changes_nothing() {
    let mut cfg = project(json!({"dependencies": {"x": ["a", "b", "c", "d"]}}));
    let err = cfg
        .remove_dependencies_by_indices(Scope::Global, "x", &[0, 4])
        .unwrap_err();
    assert_eq!(err, OverrideError::IndexOutOfRange { index: 4, len: 4 });
    assert_eq!(cfg.document()["dependencies"]["x"], json!(["a", "b", "c", "d"]));
}

#[test]
fn test_remove_by_indices_error_precedence() {
    let mut cfg = project(json!({}));
    // Empty index list is reported before the slot is even looked at
    assert_eq!(
        cfg.remove_values_by_indices(Scope::Global, "x", &[]).unwrap_err(),
        OverrideError::EmptyIndexList
    );
    assert!(matches!(
        cfg.remove_values_by_indices(Scope::Global, "x", &[0]).unwrap_err(),
        OverrideError::NotSet { .. }
    ));
}

// =============================================================================
// Unset
// =============================================================================

#[test]
fn test_unset_keeps_empty_section() {
    let mut cfg = project(json!({"p": {"dependencies": {"xdc": ["a.xdc"]}}}));
    cfg.unset_dependency(Scope::Platform("p"), "xdc").unwrap();
    assert_eq!(cfg.document()["p"], json!({"dependencies": {}}));
}

#[test]
fn test_unset_value_not_set() {
    let mut cfg = project(json!({"p": {}}));
    let err = cfg.unset_value(Scope::Platform("p"), "seed").unwrap_err();
    assert_eq!(
        err,
        OverrideError::NotSet {
            kind: SlotKind::Values,
            name: "seed".to_string()
        }
    );
    assert_eq!(err.to_string(), "value `seed` is not set");
}

// =============================================================================
// Platforms
// =============================================================================

#[test]
fn test_reserved_platform_name_rejected() {
    for keyword in ["dependencies", "values", "default_platform", "default_target"] {
        let mut cfg = ProjectFlowConfig::new();
        assert_eq!(
            cfg.add_platform(keyword).unwrap_err(),
            OverrideError::AlreadyExists(keyword.to_string())
        );
        assert_eq!(cfg.platforms().count(), 0);
    }
}

#[test]
fn test_fixture_platforms() {
    let cfg = ProjectFlowConfig::open(fixtures::project_path()).unwrap();
    assert_eq!(cfg.platforms().collect::<Vec<_>>(), vec!["xc7a50t_test", "eos-s3"]);
    assert_eq!(cfg.default_platform(), Some("xc7a50t_test"));
    assert_eq!(cfg.default_target("xc7a50t_test").unwrap(), Some("bitstream"));
    assert_eq!(cfg.default_target("eos-s3").unwrap(), None);
}
