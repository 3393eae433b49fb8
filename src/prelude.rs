//! Convenient re-exports for common strata usage.
//!
//! ```
//! use strata::prelude::*;
//! use strata::schema::{object, string};
//!
//! let resolver = Resolver::new(object([("name", string())]));
//! let env = MockEnv::new();
//! let config = resolver.resolve_with_env(&env, Some(Input::partial().set("name", "api").build()));
//! assert!(config.is_ok());
//! ```

// ============================================================================
// Stillwater re-exports
// ============================================================================

/// Result type with error accumulation.
pub use stillwater::Validation;

/// `ConfigErrors` implements this for error accumulation.
pub use stillwater::Semigroup;

/// Underlying type for `ConfigErrors`.
pub use stillwater::NonEmptyVec;

// ============================================================================
// Error types
// ============================================================================

pub use crate::error::{
    AccessError, ConfigError, ConfigErrors, ConfigValidation, ConfigValidationExt,
    InvalidPathError, SourceErrorKind, SourceLocation,
};

// ============================================================================
// Resolution
// ============================================================================

/// Entry point: schema in, validated configuration out.
pub use crate::resolver::{ResolvedConfig, Resolver};

/// Initialize-once configuration shared across an application.
pub use crate::context::{ConfigContext, ConfigHandle};

/// Path-based accessor over a resolved configuration.
pub use crate::service::ConfigService;

// ============================================================================
// Schema and values
// ============================================================================

pub use crate::schema::SchemaNode;
pub use crate::value::Value;

// ============================================================================
// Sources
// ============================================================================

/// Trait for configuration layers. Implement for custom layers.
pub use crate::source::{Fragment, Source};

pub use crate::sources::{EnvVars, Input, PartialInput, Yaml};

// ============================================================================
// Environment abstractions
// ============================================================================

pub use crate::env::{ConfigEnv, MockEnv, RealEnv};

// ============================================================================
// Tracing and reporting
// ============================================================================

pub use crate::trace::{TracedValue, ValueTrace};

pub use crate::pretty::{ColorOption, PrettyPrintOptions, ResolveExt};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_semigroup_combine() {
        let e1 = ConfigErrors::single(ConfigError::MissingField {
            path: "db.host".to_string(),
            env_var: None,
        });
        let e2 = ConfigErrors::single(ConfigError::MissingField {
            path: "db.name".to_string(),
            env_var: None,
        });
        assert_eq!(e1.combine(e2).len(), 2);
    }

    #[test]
    fn test_prelude_validation_all_vec_accumulates_errors() {
        let v1: ConfigValidation<i32> = ConfigValidation::fail_with(ConfigError::MissingField {
            path: "a".to_string(),
            env_var: None,
        });
        let v2: ConfigValidation<i32> = ConfigValidation::fail_with(ConfigError::MissingField {
            path: "b".to_string(),
            env_var: None,
        });

        match Validation::all_vec(vec![v1, v2]) {
            Validation::Failure(errors) => assert_eq!(errors.paths(), vec!["a", "b"]),
            Validation::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_prelude_value_types_available() {
        let value = Value::from("test");
        assert_eq!(value.as_str(), Some("test"));
    }
}
