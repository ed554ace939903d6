//! The resolution environment and reference substitution.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::{Map, Value};

use crate::ResolveError;

/// Matches `${name}`; a `?` inside the braces marks the reference optional.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^$\{\}]*)\}").expect("reference pattern is valid"))
}

/// What a reference name resolves to.
enum Lookup<'a> {
    Text(String),
    List(&'a [Value]),
    Missing,
}

/// Table of named values used to substitute `${name}` references.
///
/// Cloning an environment is the supported way to derive a narrower one
/// (for example, a single stage's view) without touching the original.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionEnv {
    values: Map<String, Value>,
}

impl ResolutionEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment from an already resolved value table.
    pub fn with_values(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// All values currently known to the environment.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Look up a single value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Insert one value, resolving its references against the current table.
    pub fn add_value(&mut self, name: impl Into<String>, value: &Value) {
        let resolved = self.resolve(value);
        self.values.insert(name.into(), resolved);
    }

    /// Layer a mapping on top of the environment.
    ///
    /// Entries are inserted in order and each is resolved before insertion,
    /// so an entry may reference one added earlier in the same mapping. An
    /// existing name is replaced.
    pub fn add_values(&mut self, values: &Map<String, Value>) {
        for (name, value) in values {
            self.add_value(name.clone(), value);
        }
    }

    /// Substitute every reference that can be resolved, leaving the rest as is.
    pub fn resolve(&self, value: &Value) -> Value {
        match self.resolve_value(value, false) {
            Ok(resolved) => resolved,
            // Lenient resolution never reports unresolved references.
            Err(_) => value.clone(),
        }
    }

    /// Substitute every reference, failing on the first one without a value.
    pub fn resolve_strict(&self, value: &Value) -> Result<Value, ResolveError> {
        self.resolve_value(value, true)
    }

    fn resolve_value(&self, value: &Value, strict: bool) -> Result<Value, ResolveError> {
        match value {
            Value::String(s) => self.resolve_str(s, strict),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match (item, self.resolve_value(item, strict)?) {
                        // A string that expanded into a list is spliced into
                        // the enclosing list instead of nesting.
                        (Value::String(_), Value::Array(expanded)) => out.extend(expanded),
                        (_, resolved) => out.push(resolved),
                    }
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.resolve_value(item, strict)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_str(&self, input: &str, strict: bool) -> Result<Value, ResolveError> {
        let references: Vec<(usize, usize, String)> = reference_pattern()
            .captures_iter(input)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str().replace('?', "");
                Some((whole.start(), whole.end(), name))
            })
            .collect();

        let mut current = input.to_string();

        // Right to left, so splicing never shifts a reference still to visit.
        for (start, end, name) in references.into_iter().rev() {
            match self.lookup(&name) {
                Lookup::Missing => {
                    if strict {
                        return Err(ResolveError::Unresolved {
                            name,
                            input: input.to_string(),
                        });
                    }
                    tracing::debug!(reference = %name, input, "leaving unresolved reference");
                }
                Lookup::Text(text) => current.replace_range(start..end, &text),
                Lookup::List(items) => {
                    let prefixes = match self.resolve_str(&current[..start], strict)? {
                        Value::Array(variants) => variants.iter().map(leaf_text).collect(),
                        single => vec![leaf_text(&single)],
                    };
                    let suffix = &current[end..];
                    let expanded = prefixes
                        .iter()
                        .flat_map(|prefix| {
                            items.iter().map(move |item| {
                                Value::String(format!("{}{}{}", prefix, leaf_text(item), suffix))
                            })
                        })
                        .collect();
                    return Ok(Value::Array(expanded));
                }
            }
        }

        Ok(Value::String(current))
    }

    fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.values.get(name) {
            None | Some(Value::Null) | Some(Value::Object(_)) => Lookup::Missing,
            Some(Value::String(s)) if s.is_empty() => Lookup::Missing,
            Some(Value::String(s)) => Lookup::Text(s.clone()),
            Some(Value::Array(items)) if items.is_empty() => Lookup::Missing,
            Some(Value::Array(items)) => Lookup::List(items),
            Some(Value::Number(n)) => Lookup::Text(n.to_string()),
            Some(Value::Bool(b)) => Lookup::Text(b.to_string()),
        }
    }
}

fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Apply `f` to every string leaf of a nested value.
///
/// Lists and maps keep their shape; non-string leaves are copied unchanged.
pub fn map_strings<F>(value: &Value, f: &mut F) -> Value
where
    F: FnMut(&str) -> Value,
{
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => Value::Array(items.iter().map(|item| map_strings(item, f)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), map_strings(item, f)))
                .collect(),
        ),
        other => other.clone(),
    }
}
