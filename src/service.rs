//! Path-based accessor over a resolved configuration.
//!
//! [`ConfigService`] keeps the nested tree alongside a flattened
//! dot-path index of its leaves. `get` reads the index, `pick` walks the live
//! tree, and `set` writes the tree and rebuilds the index.
//!
//! ```
//! use strata::{ConfigService, Value};
//! use serde_json::json;
//!
//! let mut service = ConfigService::from_value(Value::from(json!({
//!     "db": { "host": "localhost", "port": 3333 }
//! })));
//!
//! assert_eq!(service.keys().collect::<Vec<_>>(), vec!["db.host", "db.port"]);
//! assert_eq!(service.get_as::<u16>("db.port").unwrap(), 3333);
//!
//! service.set("db.pool.size", 10, false).unwrap();
//! assert!(service.set("cache.ttl", 60, true).is_err());
//! ```

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AccessError, ConfigErrors, InvalidPathError};
use crate::resolver::{deserialize_value, ResolvedConfig};
use crate::value::Value;

/// Accessor handed to the rest of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigService {
    config: Value,
    flattened: BTreeMap<String, Value>,
}

impl ConfigService {
    pub fn new(resolved: ResolvedConfig) -> Self {
        resolved.into_service()
    }

    pub fn from_value(config: Value) -> Self {
        let flattened = config.flatten();
        Self { config, flattened }
    }

    /// Every leaf path, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.flattened.keys().map(String::as_str)
    }

    /// Leaf lookup in the flattened index.
    ///
    /// The index is a `BTreeMap`, so this is O(log n) in the number of
    /// leaves; the sorted order is what keeps [`ConfigService::keys`] stable.
    ///
    /// Only leaf paths are indexed; branch paths return `None` here but are
    /// visible through [`ConfigService::pick`].
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.flattened.get(path)
    }

    /// Typed read of any path, leaf or branch.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, AccessError> {
        let value = self.pick(path).ok_or_else(|| AccessError::NotFound {
            path: path.to_string(),
        })?;
        serde_json::from_value(value.to_json()).map_err(|e| AccessError::Type {
            path: path.to_string(),
            type_name: std::any::type_name::<T>(),
            message: e.to_string(),
        })
    }

    /// Lookup in the live nested tree.
    pub fn pick(&self, path: &str) -> Option<&Value> {
        self.config.get_path(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pick(path).is_some()
    }

    /// Write `value` at `path`.
    ///
    /// The empty path is rejected in both modes. Non-strict mode creates (or
    /// replaces) intermediate tables as needed.
    /// Strict mode requires every intermediate segment to already be a table
    /// and fails naming the first one that is not; the leaf itself may be new.
    pub fn set(
        &mut self,
        path: &str,
        value: impl Into<Value>,
        strict: bool,
    ) -> Result<(), InvalidPathError> {
        if path.is_empty() {
            return Err(InvalidPathError::new(path));
        }
        if strict {
            self.check_parents(path)?;
        }
        self.config.set_path(path, value.into());
        self.flattened = self.config.flatten();
        debug!(path = %path, strict, "configuration value set");
        Ok(())
    }

    fn check_parents(&self, path: &str) -> Result<(), InvalidPathError> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut node = &self.config;
        for (i, segment) in segments[..segments.len() - 1].iter().enumerate() {
            match node.as_table().and_then(|t| t.get(*segment)) {
                Some(child) if child.is_table() => node = child,
                _ => return Err(InvalidPathError::new(segments[..=i].join("."))),
            }
        }
        Ok(())
    }

    /// The live nested tree.
    pub fn get_all(&self) -> &Value {
        &self.config
    }

    /// Deserialize the whole tree into a typed view.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigErrors> {
        deserialize_value(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> ConfigService {
        ConfigService::from_value(Value::from(json!({
            "basic": { "listenPort": 3000 },
            "security": { "jwt": { "secret": "changeme", "refreshToken": { "expiresIn": "7d" } } },
            "db": { "hosts": ["a", "b"], "ssl": false },
            "empty": {}
        })))
    }

    #[test]
    fn test_keys_are_leaf_paths() {
        let s = service();
        let keys: Vec<&str> = s.keys().collect();
        assert_eq!(
            keys,
            vec![
                "basic.listenPort",
                "db.hosts",
                "db.ssl",
                "security.jwt.refreshToken.expiresIn",
                "security.jwt.secret",
            ]
        );
        for key in keys {
            assert_eq!(s.get(key), s.pick(key));
        }
    }

    #[test]
    fn test_get_vs_pick_for_branches() {
        let s = service();
        assert!(s.get("security.jwt").is_none());
        assert!(s.pick("security.jwt").map(Value::is_table).unwrap_or(false));
        assert!(s.contains("empty"));
        assert!(!s.contains("missing"));
    }

    #[test]
    fn test_get_as() {
        let s = service();
        assert_eq!(s.get_as::<u16>("basic.listenPort").unwrap(), 3000);
        assert_eq!(s.get_as::<Vec<String>>("db.hosts").unwrap(), vec!["a", "b"]);
        assert!(matches!(
            s.get_as::<u16>("nope"),
            Err(AccessError::NotFound { .. })
        ));
        assert!(matches!(
            s.get_as::<bool>("basic.listenPort"),
            Err(AccessError::Type { .. })
        ));
    }

    #[test]
    fn test_non_strict_set_creates_intermediates() {
        let mut s = service();
        s.set("cache.redis.url", "redis://", false).unwrap();
        assert_eq!(s.get("cache.redis.url"), Some(&Value::from("redis://")));
        assert_eq!(s.pick("cache.redis.url"), Some(&Value::from("redis://")));

        s.set("basic.listenPort.deep", 1, false).unwrap();
        assert_eq!(s.get("basic.listenPort.deep"), Some(&Value::Integer(1)));
        assert!(s.get("basic.listenPort").is_none());
    }

    #[test]
    fn test_strict_set() {
        let mut s = service();
        s.set("security.jwt.algo", "HS512", true).unwrap();
        assert_eq!(s.get("security.jwt.algo"), Some(&Value::from("HS512")));

        let err = s.set("a.b.c", 1, true).unwrap_err();
        assert_eq!(err.path, "a");

        let err = s.set("security.jwt.secret.length", 1, true).unwrap_err();
        assert_eq!(err.path, "security.jwt.secret");

        let err = s.set("security.missing.c", 1, true).unwrap_err();
        assert_eq!(err.path, "security.missing");
        assert!(s.pick("security.missing").is_none());
    }

    #[test]
    fn test_strict_set_top_level_leaf() {
        let mut s = service();
        s.set("mode", "dev", true).unwrap();
        assert_eq!(s.get("mode"), Some(&Value::from("dev")));
        assert!(s.set("", 1, true).is_err());
    }

    #[test]
    fn test_empty_path_is_rejected_without_touching_config() {
        let mut s = service();
        let before = s.clone();

        let err = s.set("", 1, false).unwrap_err();
        assert_eq!(err.path, "");
        assert_eq!(s, before);
        assert!(s.get_all().is_table());
        assert!(s.keys().count() > 0);
    }

    #[test]
    fn test_get_all_is_live() {
        let mut s = service();
        s.set("basic.listenPort", 8080, true).unwrap();
        assert_eq!(
            s.get_all().get_path("basic.listenPort"),
            Some(&Value::Integer(8080))
        );
    }
}
