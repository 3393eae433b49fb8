//! Configuration source trait and the fragment each source produces.
//!
//! A [`Fragment`] is a partially populated value tree plus the origin of every
//! leaf in it. Sources never assume completeness; missing subtrees are filled
//! by later layers, schema defaults or reported by validation.

use std::collections::BTreeMap;

use crate::env::ConfigEnv;
use crate::error::{ConfigErrors, SourceLocation};
use crate::merge::deep_merge;
use crate::value::Value;

/// A partial configuration tree with per-leaf source tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    value: Value,
    origins: BTreeMap<String, SourceLocation>,
}

impl Default for Fragment {
    fn default() -> Self {
        Self::empty()
    }
}

impl Fragment {
    /// A fragment defining nothing.
    pub fn empty() -> Self {
        Self {
            value: Value::table(),
            origins: BTreeMap::new(),
        }
    }

    /// Wrap a whole tree, attributing every leaf to `location`.
    pub fn from_value(value: Value, location: &SourceLocation) -> Self {
        let origins = value
            .flatten()
            .into_keys()
            .map(|path| (path, location.clone()))
            .collect();
        Self { value, origins }
    }

    /// Wrap a tree whose leaf origins were computed by the caller.
    pub fn with_origins(value: Value, origins: BTreeMap<String, SourceLocation>) -> Self {
        Self { value, origins }
    }

    /// Write a value at a dot-path, creating intermediate tables.
    pub fn insert(&mut self, path: &str, value: Value, location: SourceLocation) {
        let nested = format!("{}.", path);
        self.origins.retain(|p, _| !p.starts_with(&nested));
        self.value.set_path(path, value);
        self.origins.insert(path.to_string(), location);
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.value.get_path(path)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn into_parts(self) -> (Value, BTreeMap<String, SourceLocation>) {
        (self.value, self.origins)
    }

    pub fn origins(&self) -> &BTreeMap<String, SourceLocation> {
        &self.origins
    }

    /// Where the value at `path` came from.
    ///
    /// Paths below a recorded leaf (array elements such as `hosts[1]`, or
    /// keys inside an opaque value) resolve to the nearest recorded ancestor.
    pub fn origin(&self, path: &str) -> Option<&SourceLocation> {
        let mut current = path;
        loop {
            if let Some(loc) = self.origins.get(current) {
                return Some(loc);
            }
            current = &current[..current.rfind(['.', '['])?];
        }
    }

    /// True when the fragment defines no keys at all.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Table(t) => t.is_empty(),
            _ => false,
        }
    }

    /// Layer `overlay` on top of this fragment.
    ///
    /// Origins follow the merged values: a leaf keeps the origin of the
    /// layer that supplied it, and origins of replaced subtrees are dropped.
    pub fn merge(self, overlay: Fragment) -> Fragment {
        let value = deep_merge(self.value, overlay.value);
        let mut origins = self.origins;
        origins.extend(overlay.origins);
        origins.retain(|path, _| matches!(value.get_path(path), Some(v) if !v.is_table()));
        Fragment { value, origins }
    }
}

/// Trait for configuration sources.
///
/// Sources perform I/O through the `ConfigEnv` trait so resolution can be
/// tested against a `MockEnv`.
///
/// # Example Implementation
///
/// ```ignore
/// impl Source for MySource {
///     fn load(&self, env: &dyn ConfigEnv) -> Result<Fragment, ConfigErrors> {
///         let content = env.read_file(&self.path)
///             .map_err(|e| ConfigErrors::single(ConfigError::SourceError {
///                 source_name: self.path.display().to_string(),
///                 kind: SourceErrorKind::IoError { message: e.to_string() },
///             }))?;
///
///         parse_content(&content)
///     }
///
///     fn name(&self) -> &str {
///         "my-source"
///     }
/// }
/// ```
pub trait Source: Send + Sync {
    /// Load this source's fragment.
    fn load(&self, env: &dyn ConfigEnv) -> Result<Fragment, ConfigErrors>;

    /// Human-readable name of this source for error messages and traces.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fragment_basic() {
        let mut fragment = Fragment::empty();
        assert!(fragment.is_empty());

        fragment.insert("db.host", Value::from("localhost"), SourceLocation::new("test"));

        assert!(!fragment.is_empty());
        assert_eq!(fragment.get("db.host").and_then(Value::as_str), Some("localhost"));
        assert!(fragment.get("db.port").is_none());
        assert_eq!(fragment.origin("db.host"), Some(&SourceLocation::new("test")));
    }

    #[test]
    fn test_from_value_tracks_every_leaf() {
        let fragment = Fragment::from_value(
            Value::from(json!({"db": {"host": "h", "port": 1}, "tags": ["a"]})),
            &SourceLocation::input(),
        );
        let paths: Vec<&str> = fragment.origins().keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["db.host", "db.port", "tags"]);
    }

    #[test]
    fn test_origin_falls_back_to_ancestor() {
        let fragment = Fragment::from_value(
            Value::from(json!({"servers": [{"host": "a"}]})),
            &SourceLocation::new("config.yml").with_line(3),
        );
        assert_eq!(
            fragment.origin("servers[0].host").map(|l| l.line),
            Some(Some(3))
        );
        assert!(fragment.origin("other").is_none());
    }

    #[test]
    fn test_insert_over_table_drops_nested_origins() {
        let mut fragment = Fragment::from_value(
            Value::from(json!({"db": {"host": "h"}})),
            &SourceLocation::new("config.yml"),
        );
        fragment.insert("db", Value::from("flat"), SourceLocation::input());
        assert!(fragment.origins().get("db.host").is_none());
        assert_eq!(fragment.origin("db"), Some(&SourceLocation::input()));
    }

    #[test]
    fn test_merge_drops_origins_of_replaced_subtrees() {
        let base = Fragment::from_value(
            Value::from(json!({"db": {"host": "h"}})),
            &SourceLocation::new("config.yml"),
        );
        let overlay = Fragment::from_value(Value::from(json!({"db": 5})), &SourceLocation::input());
        let merged = base.merge(overlay);
        assert_eq!(merged.origins().len(), 1);
        assert_eq!(merged.origin("db"), Some(&SourceLocation::input()));
    }
}
