// Allow large error types - detailed config errors are expected
#![allow(clippy::result_large_err)]

//! Strata: schema-driven layered configuration.
//!
//! A single schema declares every configuration leaf: its type, constraints,
//! default and transforms. Strata loads a YAML file, the environment variables
//! derived from the schema, and programmatic input, deep-merges them in that
//! order, fills in schema defaults, and validates the result. Every problem is
//! reported at once, each with its dot path and the layer it came from.
//!
//! # Quick Start
//!
//! ```
//! use strata::prelude::*;
//! use strata::schema::{integer, object, string};
//!
//! let schema = object([
//!     ("basic", object([("listenPort", integer().default(3000).coerce())]).default(Value::table())),
//!     ("db", object([("host", string())])),
//! ]);
//!
//! let env = MockEnv::new()
//!     .with_file("./config.yml", "db:\n  host: localhost\n")
//!     .with_env("XNTHA_BASIC_LISTEN_PORT", "8080");
//!
//! let config = Resolver::new(schema)
//!     .env_prefix("XNTHA")
//!     .resolve_with_env(&env, None)
//!     .unwrap()
//!     .into_service();
//!
//! assert_eq!(config.get_as::<u16>("basic.listenPort").unwrap(), 8080);
//! assert_eq!(config.get("db.host"), Some(&Value::from("localhost")));
//! ```
//!
//! # Layers
//!
//! From lowest to highest precedence:
//!
//! 1. Schema defaults, applied only where a higher layer left a gap
//! 2. YAML file: explicit path, a path named by the configuration itself, or
//!    the first `config.yml`/`config.yaml` found in the search directories
//! 3. Environment variables: `PREFIX_SEGMENT_SEGMENT`, with each camelCase
//!    segment converted to CONSTANT_CASE
//! 4. Programmatic input
//!
//! # Module Structure
//!
//! - [`schema`]: schema nodes and their builders
//! - [`walker`]: leaf and branch traversal of a schema
//! - [`envmap`]: environment variable names derived from a schema
//! - [`defaults`]: default extraction driven by the user's fragment
//! - [`merge`]: deep merge of value trees and fragments
//! - [`sources`]: YAML, environment and programmatic layers
//! - [`validate`]: schema validation with error accumulation
//! - [`resolver`]: the pipeline tying the layers together
//! - [`service`]: path-based access to a resolved configuration
//! - [`context`]: initialize-once process configuration
//! - [`mod@env`]: `ConfigEnv` trait and `MockEnv` for testing
//!
//! # Stillwater Integration
//!
//! | Type | Usage |
//! |------|-------|
//! | `Validation<T, E>` | Error accumulation for config errors |
//! | `NonEmptyVec<T>` | Guaranteed non-empty error lists |
//! | `Semigroup` | Combining errors from multiple layers |

pub mod context;
pub mod defaults;
pub mod env;
pub mod envmap;
pub mod error;
pub mod merge;
pub mod prelude;
pub mod pretty;
pub mod resolver;
pub mod schema;
pub mod service;
pub mod source;
pub mod sources;
pub mod trace;
pub mod validate;
pub mod value;
pub mod walker;

// Re-exports for convenience
pub use context::{ConfigContext, ConfigHandle};
pub use env::{ConfigEnv, MockEnv, RealEnv};
pub use envmap::{build_env_map, to_const_case, EnvVarMap};
pub use error::{
    group_by_source, AccessError, ConfigError, ConfigErrors, ConfigValidation,
    ConfigValidationExt, InvalidPathError, SourceErrorKind, SourceLocation,
};
pub use pretty::{ColorOption, PrettyPrintOptions, ResolveExt};
pub use resolver::{ResolvedConfig, Resolver, DEFAULT_ENV_PREFIX};
pub use schema::SchemaNode;
pub use service::ConfigService;
pub use source::{Fragment, Source};
pub use sources::{EnvVars, Input, PartialInput, Yaml};
pub use trace::{TraceBuilder, TracedValue, ValueTrace};
pub use validate::{validate_config, ValidationContext};
pub use value::Value;

// Re-export stillwater types that are commonly used
pub use stillwater::{NonEmptyVec, Semigroup, Validation};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let _: ConfigValidation<()> = Validation::Success(());
        let _ = Resolver::new(schema::object([("name", schema::string())]));
    }
}
