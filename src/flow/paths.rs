//! Absolute path materialization for dependencies.

use std::fs;
use std::path::{Component, Path, PathBuf};

use flow_env::map_strings;
use serde_json::Value;

/// Make `path` absolute against `base` and normalize it.
///
/// Existing paths are canonicalized (symlinks resolved). Paths that do not
/// exist yet, such as outputs, are normalized lexically.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    fs::canonicalize(&joined).unwrap_or_else(|_| normalize_lexically(&joined))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Replace every string leaf of `value` with its absolute path.
pub fn resolve_paths(value: &Value, base: &Path) -> Value {
    map_strings(value, &mut |s| {
        Value::String(absolutize(Path::new(s), base).to_string_lossy().into_owned())
    })
}
