//! Environment variable configuration source.
//!
//! Variables are bound to schema leaves through an [`EnvVarMap`]; only
//! variables the map names are read. Extra aliases can bind legacy names to
//! a path, and individual generated names can be excluded.
//!
//! ```
//! use strata::env::MockEnv;
//! use strata::envmap::build_env_map;
//! use strata::schema::{object, string};
//! use strata::{EnvVars, Source};
//!
//! let schema = object([("db", object([("host", string())]))]);
//! let source = EnvVars::new(build_env_map(&schema, "APP")).alias("DATABASE_HOST", "db.host");
//!
//! let env = MockEnv::new().with_env("DATABASE_HOST", "legacy.internal");
//! let fragment = source.load(&env).unwrap();
//! assert_eq!(fragment.get("db.host").and_then(|v| v.as_str()), Some("legacy.internal"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::env::ConfigEnv;
use crate::envmap::{parse_env_args_except, unbound_vars, EnvVarMap};
use crate::error::{ConfigErrors, SourceLocation};
use crate::source::{Fragment, Source};
use crate::value::Value;

/// Schema-bound environment variable source.
#[derive(Debug, Clone)]
pub struct EnvVars {
    map: Arc<EnvVarMap>,
    aliases: BTreeMap<String, String>,
    excluded: BTreeSet<String>,
}

impl EnvVars {
    pub fn new(map: impl Into<Arc<EnvVarMap>>) -> Self {
        Self {
            map: map.into(),
            aliases: BTreeMap::new(),
            excluded: BTreeSet::new(),
        }
    }

    /// Also read `var` into the dot-path `path`.
    ///
    /// Aliases are applied after generated names, so an alias wins when both
    /// are set.
    pub fn alias(mut self, var: impl Into<String>, path: impl Into<String>) -> Self {
        self.aliases.insert(var.into(), path.into());
        self
    }

    /// Never read the generated variable `var`.
    pub fn exclude(mut self, var: impl Into<String>) -> Self {
        self.excluded.insert(var.into());
        self
    }

    pub fn map(&self) -> &EnvVarMap {
        &self.map
    }
}

impl Source for EnvVars {
    fn load(&self, env: &dyn ConfigEnv) -> Result<Fragment, ConfigErrors> {
        let mut fragment =
            parse_env_args_except(env, &self.map, |var| self.excluded.contains(var));

        for (var, path) in &self.aliases {
            if let Some(raw) = env.get_env(var) {
                fragment.insert(path, Value::String(raw), SourceLocation::env(var));
            }
        }

        for var in unbound_vars(env, &self.map) {
            if self.aliases.contains_key(&var) {
                continue;
            }
            warn!(var = %var, "environment variable has the config prefix but matches no setting");
        }

        debug!(
            bound = fragment.origins().len(),
            prefix = %self.map.prefix(),
            "read environment configuration"
        );
        Ok(fragment)
    }

    fn name(&self) -> &str {
        "environment"
    }
}
