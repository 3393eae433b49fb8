//! Environment variable names derived from the schema.
//!
//! Every leaf path gets exactly one variable: the prefix, then each path
//! segment converted to CONST_CASE, joined by underscores. With prefix
//! `XNTHA`, the leaf `security.jwt.refreshToken.expiresIn` is bound to
//! `XNTHA_SECURITY_JWT_REFRESH_TOKEN_EXPIRES_IN`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::env::ConfigEnv;
use crate::error::SourceLocation;
use crate::schema::SchemaNode;
use crate::source::Fragment;
use crate::value::Value;
use crate::walker::{walk, NodeClass};

fn lower_upper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid regex"))
}

fn acronym_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z\d]+)").expect("valid regex"))
}

/// Convert a camelCase segment to CONST_CASE.
///
/// ```
/// use strata::envmap::to_const_case;
///
/// assert_eq!(to_const_case("refreshToken"), "REFRESH_TOKEN");
/// assert_eq!(to_const_case("externalURLPath"), "EXTERNAL_URL_PATH");
/// assert_eq!(to_const_case("db"), "DB");
/// ```
pub fn to_const_case(segment: &str) -> String {
    let split = lower_upper().replace_all(segment, "${1}_${2}");
    acronym_word()
        .replace_all(&split, "${1}_${2}")
        .to_uppercase()
}

/// Mapping from variable name to the leaf path it populates.
///
/// A pure function of the schema and prefix; build it once and share it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVarMap {
    prefix: String,
    entries: BTreeMap<String, Vec<String>>,
}

impl EnvVarMap {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path segments bound to `var`.
    pub fn get(&self, var: &str) -> Option<&[String]> {
        self.entries.get(var).map(Vec::as_slice)
    }

    /// Variable bound to the dot-path `path`, if it is a leaf.
    pub fn var_for_path(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, segments)| segments.join(".") == path)
            .map(|(var, _)| var.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(var, path)| (var.as_str(), path.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn var_name(&self, path: &[String]) -> String {
        let joined = path
            .iter()
            .map(|segment| to_const_case(segment))
            .collect::<Vec<_>>()
            .join("_");
        if self.prefix.is_empty() {
            joined
        } else {
            format!("{}_{}", self.prefix, joined)
        }
    }
}

/// Bind every leaf of `schema` to an environment variable.
///
/// Branches are recursed; arrays, unions and other unsupported nodes get no
/// binding. If two paths produce the same name, the later declaration wins and
/// a warning is logged.
pub fn build_env_map(schema: &SchemaNode, prefix: &str) -> EnvVarMap {
    let mut map = EnvVarMap {
        prefix: prefix.to_string(),
        entries: BTreeMap::new(),
    };

    let mut bindings = Vec::new();
    walk(schema, |path, _, class| {
        if class == NodeClass::Leaf {
            bindings.push(path.to_vec());
        }
    });

    for path in bindings {
        let var = map.var_name(&path);
        if let Some(previous) = map.entries.insert(var.clone(), path.clone()) {
            warn!(
                var = %var,
                previous = %previous.join("."),
                current = %path.join("."),
                "two configuration paths map to the same environment variable"
            );
        }
    }

    map
}

/// Read every bound variable that is set into a nested fragment.
///
/// Values stay raw strings; schema coercion turns them into numbers or
/// booleans during validation. Unset variables leave no trace.
pub fn parse_env_args(env: &dyn ConfigEnv, map: &EnvVarMap) -> Fragment {
    parse_env_args_except(env, map, |_| false)
}

/// [`parse_env_args`] skipping every variable for which `skip` returns true.
pub fn parse_env_args_except<F>(env: &dyn ConfigEnv, map: &EnvVarMap, skip: F) -> Fragment
where
    F: Fn(&str) -> bool,
{
    let mut fragment = Fragment::empty();
    for (var, path) in map.iter().filter(|(var, _)| !skip(var)) {
        if let Some(raw) = env.get_env(var) {
            fragment.insert(&path.join("."), Value::String(raw), SourceLocation::env(var));
        }
    }
    fragment
}

/// Variables carrying the prefix that no schema leaf is bound to.
///
/// Usually a typo or a stale deployment setting. Always empty when the
/// prefix is empty.
pub fn unbound_vars(env: &dyn ConfigEnv, map: &EnvVarMap) -> Vec<String> {
    if map.prefix.is_empty() {
        return Vec::new();
    }
    let prefix = format!("{}_", map.prefix);
    env.env_vars_with_prefix(&prefix)
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| !map.entries.contains_key(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;
    use crate::schema::{array, boolean, integer, object, string, union};

    fn schema() -> SchemaNode {
        object([
            (
                "basic",
                object([
                    ("listenPort", integer().default(3000).coerce()),
                    ("externalUrl", string().optional()),
                ])
                .default(Value::table()),
            ),
            (
                "security",
                object([(
                    "jwt",
                    object([(
                        "refreshToken",
                        object([("expiresIn", string().default("7d"))]).default(Value::table()),
                    )]),
                )]),
            ),
            ("db", object([("ssl", boolean().default(false).coerce())])),
            ("tags", array(string())),
            ("mode", union(vec![string(), integer()])),
        ])
    }

    #[test]
    fn test_to_const_case() {
        assert_eq!(to_const_case("listenPort"), "LISTEN_PORT");
        assert_eq!(to_const_case("expiresIn"), "EXPIRES_IN");
        assert_eq!(to_const_case("authDb"), "AUTH_DB");
        assert_eq!(to_const_case("HTTPServer"), "HTTP_SERVER");
        assert_eq!(to_const_case("v2Api"), "V2_API");
        assert_eq!(to_const_case("already_snake"), "ALREADY_SNAKE");
    }

    #[test]
    fn test_build_env_map_binds_only_leaves() {
        let map = build_env_map(&schema(), "XNTHA");
        let vars: Vec<&str> = map.iter().map(|(v, _)| v).collect();
        assert_eq!(
            vars,
            vec![
                "XNTHA_BASIC_EXTERNAL_URL",
                "XNTHA_BASIC_LISTEN_PORT",
                "XNTHA_DB_SSL",
                "XNTHA_SECURITY_JWT_REFRESH_TOKEN_EXPIRES_IN",
            ]
        );
        assert_eq!(
            map.get("XNTHA_SECURITY_JWT_REFRESH_TOKEN_EXPIRES_IN"),
            Some(
                &[
                    "security".to_string(),
                    "jwt".to_string(),
                    "refreshToken".to_string(),
                    "expiresIn".to_string()
                ][..]
            )
        );
        assert_eq!(map.var_for_path("db.ssl"), Some("XNTHA_DB_SSL"));
        assert_eq!(map.var_for_path("tags"), None);
    }

    #[test]
    fn test_empty_prefix_has_no_leading_underscore() {
        let map = build_env_map(&schema(), "");
        assert!(map.get("DB_SSL").is_some());
    }

    #[test]
    fn test_collision_later_declaration_wins() {
        let colliding = object([
            ("dbHost", string()),
            ("db", object([("host", string())])),
        ]);
        let map = build_env_map(&colliding, "APP");
        assert_eq!(map.len(), 1);
        assert_eq!(map.var_for_path("db.host"), Some("APP_DB_HOST"));
    }

    #[test]
    fn test_parse_env_args_writes_raw_strings() {
        let map = build_env_map(&schema(), "XNTHA");
        let env = MockEnv::new()
            .with_env("XNTHA_BASIC_LISTEN_PORT", "8080")
            .with_env("XNTHA_SECURITY_JWT_REFRESH_TOKEN_EXPIRES_IN", "14d")
            .with_env("UNRELATED", "x");

        let fragment = parse_env_args(&env, &map);
        assert_eq!(fragment.get("basic.listenPort"), Some(&Value::from("8080")));
        assert_eq!(
            fragment.get("security.jwt.refreshToken.expiresIn"),
            Some(&Value::from("14d"))
        );
        assert!(fragment.get("db").is_none());
        assert_eq!(
            fragment.origin("basic.listenPort"),
            Some(&SourceLocation::env("XNTHA_BASIC_LISTEN_PORT"))
        );
    }

    #[test]
    fn test_parse_env_args_empty_environment() {
        let map = build_env_map(&schema(), "XNTHA");
        assert!(parse_env_args(&MockEnv::new(), &map).is_empty());
    }

    #[test]
    fn test_parse_env_args_except_skips_vars() {
        let map = build_env_map(&schema(), "XNTHA");
        let env = MockEnv::new()
            .with_env("XNTHA_BASIC_LISTEN_PORT", "8080")
            .with_env("XNTHA_SECURITY_JWT_REFRESH_TOKEN_EXPIRES_IN", "14d");

        let fragment =
            parse_env_args_except(&env, &map, |var| var == "XNTHA_BASIC_LISTEN_PORT");
        assert!(fragment.get("basic.listenPort").is_none());
        assert_eq!(
            fragment.get("security.jwt.refreshToken.expiresIn"),
            Some(&Value::from("14d"))
        );
    }

    #[test]
    fn test_unbound_vars() {
        let map = build_env_map(&schema(), "XNTHA");
        let env = MockEnv::new()
            .with_env("XNTHA_DB_SSL", "true")
            .with_env("XNTHA_DB_SSLL", "true")
            .with_env("XNTHAX", "1");
        assert_eq!(unbound_vars(&env, &map), vec!["XNTHA_DB_SSLL".to_string()]);
        assert!(unbound_vars(&env, &build_env_map(&schema(), "")).is_empty());
    }
}
