//! Layered configuration resolution.
//!
//! Resolution loads three layers, lowest precedence first:
//!
//! 1. a YAML file (explicit path, a path named by another layer, or the
//!    first conventional file discovered under the working directory),
//! 2. schema-bound environment variables,
//! 3. programmatic [`Input`].
//!
//! The layers are deep-merged, schema defaults are laid underneath for the
//! subtrees the user touched, and the result is validated. Every source and
//! validation failure is reported together.
//!
//! # Example
//!
//! ```
//! use strata::env::MockEnv;
//! use strata::schema::{boolean, integer, object, string};
//! use strata::{Input, Resolver, Value};
//!
//! let schema = object([(
//!     "db",
//!     object([
//!         ("host", string().default("localhost")),
//!         ("port", integer().default(3333).coerce()),
//!         ("ssl", boolean().default(false).coerce()),
//!     ])
//!     .default(Value::table()),
//! )]);
//!
//! let env = MockEnv::new()
//!     .with_file("./config.yml", "db:\n  host: yaml.internal\n  port: 1000\n")
//!     .with_env("XNTHA_DB_PORT", "2000");
//!
//! let resolved = Resolver::new(schema)
//!     .env_prefix("XNTHA")
//!     .resolve_with_env(&env, Some(Input::partial().set("db.ssl", true).build()))
//!     .unwrap();
//!
//! assert_eq!(resolved.get_path("db.host").and_then(|v| v.as_str()), Some("yaml.internal"));
//! assert_eq!(resolved.get_path("db.port"), Some(&Value::Integer(2000)));
//! assert_eq!(resolved.get_path("db.ssl"), Some(&Value::Bool(true)));
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use stillwater::Validation;
use tracing::{debug, error};

use crate::defaults::{declared_default, extract_defaults};
use crate::env::{ConfigEnv, RealEnv};
use crate::envmap::{build_env_map, EnvVarMap};
use crate::error::{ConfigError, ConfigErrors, SourceLocation};
use crate::merge::merge_fragments;
use crate::schema::SchemaNode;
use crate::service::ConfigService;
use crate::source::{Fragment, Source};
use crate::sources::{EnvVars, Input, Yaml, DEFAULT_SEARCH_DIRS};
use crate::trace::{trace_report, TraceBuilder, ValueTrace};
use crate::validate::{validate_config, ValidationContext};
use crate::value::Value;
use crate::walker;

/// Prefix used when none is configured.
pub const DEFAULT_ENV_PREFIX: &str = "APP";

/// Resolves a schema against YAML, environment and input layers.
#[derive(Debug, Clone)]
pub struct Resolver {
    schema: Arc<SchemaNode>,
    env_map: Arc<EnvVarMap>,
    config_file: Option<PathBuf>,
    config_path_key: Option<String>,
    search_dirs: Vec<PathBuf>,
    env_aliases: Vec<(String, String)>,
}

impl Resolver {
    pub fn new(schema: SchemaNode) -> Self {
        let env_map = build_env_map(&schema, DEFAULT_ENV_PREFIX);
        Self {
            schema: Arc::new(schema),
            env_map: Arc::new(env_map),
            config_file: None,
            config_path_key: None,
            search_dirs: DEFAULT_SEARCH_DIRS.iter().map(PathBuf::from).collect(),
            env_aliases: Vec::new(),
        }
    }

    /// Prefix for derived environment variable names. Empty means none.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_map = Arc::new(build_env_map(&self.schema, &prefix.into()));
        self
    }

    /// Load this YAML file instead of discovering one.
    ///
    /// A missing file is logged and treated as an empty layer.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Dot-path of a string leaf naming the YAML file.
    ///
    /// It is read from input first, then the environment, then its schema
    /// default. An explicit [`Resolver::config_file`] takes priority.
    pub fn config_path_key(mut self, key: impl Into<String>) -> Self {
        self.config_path_key = Some(key.into());
        self
    }

    /// Folders searched for `config.yml`/`config.yaml`, relative to the working directory.
    pub fn search_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Also read environment variable `var` into `path`.
    pub fn env_alias(mut self, var: impl Into<String>, path: impl Into<String>) -> Self {
        self.env_aliases.push((var.into(), path.into()));
        self
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn env_map(&self) -> &EnvVarMap {
        &self.env_map
    }

    /// Resolve against the real process environment.
    pub fn resolve(&self, input: Option<Input>) -> Result<ResolvedConfig, ConfigErrors> {
        self.resolve_with_env(&RealEnv::new(), input)
    }

    /// Resolve with an injected environment.
    ///
    /// # Errors
    ///
    /// Returns every source error (unreadable or malformed YAML, non-table
    /// input) or, if all sources load, every validation error.
    pub fn resolve_with_env(
        &self,
        env: &dyn ConfigEnv,
        input: Option<Input>,
    ) -> Result<ResolvedConfig, ConfigErrors> {
        let mut all_errors = Vec::new();

        let env_source = self
            .env_aliases
            .iter()
            .fold(EnvVars::new(Arc::clone(&self.env_map)), |source, (var, path)| {
                source.alias(var.as_str(), path.as_str())
            });
        let env_fragment = load_or_collect(&env_source, env, &mut all_errors);
        let input_fragment = input
            .map(|input| load_or_collect(&input, env, &mut all_errors))
            .unwrap_or_default();

        let yaml = self.yaml_source(&input_fragment, &env_fragment);
        let yaml_fragment = load_or_collect(&yaml, env, &mut all_errors);

        if let Some(errors) = ConfigErrors::from_vec(all_errors) {
            error!(count = errors.len(), "configuration sources failed to load");
            return Err(errors);
        }

        let user = merge_fragments([yaml_fragment.clone(), env_fragment.clone(), input_fragment.clone()]);
        let defaults = extract_defaults(&self.schema, Some(user.value()))
            .map(|d| Fragment::from_value(d, &SourceLocation::defaults()))
            .unwrap_or_default();

        let mut traces = TraceBuilder::new();
        for layer in [&defaults, &yaml_fragment, &env_fragment, &input_fragment] {
            traces.add_fragment(layer);
        }

        let merged = defaults.merge(user);
        let ctx = ValidationContext::new()
            .with_origins(&merged)
            .with_env_map(&self.env_map);

        match validate_config(&self.schema, merged.value(), &ctx) {
            Validation::Success(value) => {
                debug!(leaves = merged.origins().len(), "configuration resolved");
                Ok(ResolvedConfig {
                    value,
                    origins: merged.origins().clone(),
                    traces: traces.build(),
                })
            }
            Validation::Failure(errors) => {
                error!(count = errors.len(), "configuration is invalid");
                Err(errors)
            }
        }
    }

    fn yaml_source(&self, input: &Fragment, env: &Fragment) -> Yaml {
        if let Some(path) = &self.config_file {
            return Yaml::file(path).optional();
        }

        let named = self.config_path_key.as_deref().and_then(|key| {
            let from_default = walker::find(&self.schema, key).and_then(declared_default);
            [input.get(key).cloned(), env.get(key).cloned(), from_default]
                .into_iter()
                .flatten()
                .find_map(|value| match value {
                    Value::String(s) if !s.is_empty() => Some(s),
                    _ => None,
                })
        });

        match named {
            Some(path) => {
                debug!(path = %path, "config file named by configuration");
                Yaml::file(path).optional()
            }
            None => Yaml::discover_in(self.search_dirs.iter().cloned()),
        }
    }
}

fn load_or_collect(
    source: &dyn Source,
    env: &dyn ConfigEnv,
    errors: &mut Vec<ConfigError>,
) -> Fragment {
    match source.load(env) {
        Ok(fragment) => fragment,
        Err(e) => {
            errors.extend(e);
            Fragment::empty()
        }
    }
}

/// A validated configuration with per-leaf origins and layer history.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    value: Value,
    origins: BTreeMap<String, SourceLocation>,
    traces: BTreeMap<String, ValueTrace>,
}

impl ResolvedConfig {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Wrap in an accessor.
    pub fn into_service(self) -> ConfigService {
        ConfigService::from_value(self.value)
    }

    /// Which layer supplied the leaf at `path`.
    ///
    /// Leaves filled during validation (nested defaults, transform outputs)
    /// have no recorded origin.
    pub fn origin(&self, path: &str) -> Option<&SourceLocation> {
        self.origins.get(path)
    }

    pub fn trace(&self, path: &str) -> Option<&ValueTrace> {
        self.traces.get(path)
    }

    /// True when more than one layer supplied `path`.
    pub fn was_overridden(&self, path: &str) -> bool {
        self.traces
            .get(path)
            .map(ValueTrace::was_overridden)
            .unwrap_or(false)
    }

    pub fn overridden_paths(&self) -> impl Iterator<Item = &str> {
        self.traces
            .iter()
            .filter(|(_, t)| t.was_overridden())
            .map(|(k, _)| k.as_str())
    }

    pub fn trace_report(&self) -> String {
        trace_report(&self.traces)
    }

    /// Deserialize into a typed view.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigErrors> {
        deserialize_value(&self.value)
    }
}

impl std::ops::Deref for ResolvedConfig {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

pub(crate) fn deserialize_value<T: DeserializeOwned>(value: &Value) -> Result<T, ConfigErrors> {
    serde_json::from_value(value.to_json()).map_err(|e| {
        ConfigErrors::single(ConfigError::DeserializeError {
            type_name: std::any::type_name::<T>().to_string(),
            message: e.to_string(),
        })
    })
}
