//! Error types for the strata configuration resolver.
//!
//! Resolution failures are accumulated into [`ConfigErrors`], a non-empty list
//! built on stillwater's `NonEmptyVec` and `Semigroup`, so a single run reports
//! every failing path. Accessor failures ([`InvalidPathError`], [`AccessError`])
//! are small standalone errors the caller can recover from.

use std::collections::BTreeMap;
use std::fmt;

use stillwater::{NonEmptyVec, Semigroup, Validation};
use thiserror::Error;

/// Location where a configuration value originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Name of the source (e.g., "config.yml", "env:APP_DB_HOST", "defaults")
    pub source: String,
    /// Line number in the source (1-indexed), if applicable
    pub line: Option<u32>,
    /// Column number in the source (1-indexed), if applicable
    pub column: Option<u32>,
}

impl SourceLocation {
    /// Create a new source location with just a source name.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line: None,
            column: None,
        }
    }

    /// Add a line number to this location.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Add a column number to this location.
    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    /// Create a location for an environment variable.
    pub fn env(var_name: &str) -> Self {
        Self::new(format!("env:{}", var_name))
    }

    /// Location used for values filled from schema defaults.
    pub fn defaults() -> Self {
        Self::new("defaults")
    }

    /// Location used for programmatic input.
    pub fn input() -> Self {
        Self::new("input")
    }

    /// Create a location for a file with optional position.
    pub fn file(path: &str, line: Option<u32>, column: Option<u32>) -> Self {
        Self {
            source: path.to_string(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "{}:{}:{}", self.source, line, col),
            (Some(line), None) => write!(f, "{}:{}", self.source, line),
            _ => write!(f, "{}", self.source),
        }
    }
}

/// Kinds of source loading errors.
#[derive(Debug, Clone)]
pub enum SourceErrorKind {
    /// Source file was not found
    NotFound { path: String },
    /// Source file could not be read
    IoError { message: String },
    /// Source content could not be parsed
    ParseError {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },
    /// Source parsed, but its shape cannot hold configuration
    InvalidShape { message: String },
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceErrorKind::NotFound { path } => write!(f, "file not found: {}", path),
            SourceErrorKind::IoError { message } => write!(f, "I/O error: {}", message),
            SourceErrorKind::ParseError {
                message,
                line,
                column,
            } => {
                write!(f, "parse error: {}", message)?;
                if let Some(l) = line {
                    write!(f, " at line {}", l)?;
                    if let Some(c) = column {
                        write!(f, ", column {}", c)?;
                    }
                }
                Ok(())
            }
            SourceErrorKind::InvalidShape { message } => write!(f, "{}", message),
        }
    }
}

/// Errors that can occur while resolving configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// A configuration source failed to load
    SourceError {
        source_name: String,
        kind: SourceErrorKind,
    },

    /// A required leaf or branch is absent from every source
    MissingField {
        path: String,
        /// Environment variable that would satisfy this leaf, if one is bound
        env_var: Option<String>,
    },

    /// A value has the wrong type for its schema node
    TypeMismatch {
        path: String,
        source_location: Option<SourceLocation>,
        expected: String,
        actual: String,
    },

    /// A value has the right type but violates a constraint or transform
    ValidationError {
        path: String,
        source_location: Option<SourceLocation>,
        value: Option<String>,
        message: String,
    },

    /// The resolved value could not be deserialized into a typed view
    DeserializeError { type_name: String, message: String },
}

impl ConfigError {
    /// Get the configuration path that this error relates to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConfigError::MissingField { path, .. } => Some(path),
            ConfigError::TypeMismatch { path, .. } => Some(path),
            ConfigError::ValidationError { path, .. } => Some(path),
            ConfigError::SourceError { .. } => None,
            ConfigError::DeserializeError { .. } => None,
        }
    }

    /// Get the source location of this error, if any.
    pub fn source_location(&self) -> Option<&SourceLocation> {
        match self {
            ConfigError::TypeMismatch {
                source_location, ..
            } => source_location.as_ref(),
            ConfigError::ValidationError {
                source_location, ..
            } => source_location.as_ref(),
            _ => None,
        }
    }

    /// Check if this error came from schema validation rather than I/O.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ConfigError::MissingField { .. }
                | ConfigError::TypeMismatch { .. }
                | ConfigError::ValidationError { .. }
        )
    }

    /// Get a suggestion for fixing this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ConfigError::MissingField {
                path,
                env_var: Some(var),
            } => Some(format!(
                "Set {} or add '{}' to your configuration",
                var, path
            )),
            ConfigError::MissingField { path, env_var: None } => {
                Some(format!("Add '{}' to your configuration", path))
            }
            ConfigError::TypeMismatch {
                path,
                expected,
                actual,
                ..
            } if actual == "string" && matches!(expected.as_str(), "number" | "integer" | "boolean") => {
                Some(format!(
                    "'{}' receives strings from the environment; declare a coercion for it",
                    path
                ))
            }
            _ => None,
        }
    }

    /// Add context to this error for better debugging.
    pub fn with_context(self, context: &str) -> Self {
        match self {
            ConfigError::ValidationError {
                path,
                source_location,
                value,
                message,
            } => ConfigError::ValidationError {
                path,
                source_location,
                value,
                message: format!("{} -> {}", context, message),
            },
            ConfigError::DeserializeError { type_name, message } => {
                ConfigError::DeserializeError {
                    type_name,
                    message: format!("{} -> {}", context, message),
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingField { path, env_var } => match env_var {
                Some(var) => write!(f, "missing required field '{}' ({})", path, var),
                None => write!(f, "missing required field '{}'", path),
            },
            ConfigError::TypeMismatch {
                path,
                source_location,
                expected,
                actual,
            } => match source_location {
                Some(loc) => write!(
                    f,
                    "[{}] '{}': expected {}, received {}",
                    loc, path, expected, actual
                ),
                None => write!(f, "'{}': expected {}, received {}", path, expected, actual),
            },
            ConfigError::ValidationError {
                path,
                source_location,
                message,
                ..
            } => match source_location {
                Some(loc) => write!(f, "[{}] '{}': {}", loc, path, message),
                None => write!(f, "'{}': {}", path, message),
            },
            ConfigError::SourceError { source_name, kind } => {
                write!(f, "{}: {}", source_name, kind)
            }
            ConfigError::DeserializeError { type_name, message } => {
                write!(f, "cannot deserialize into {}: {}", type_name, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A non-empty collection of configuration errors.
///
/// Uses `NonEmptyVec` from stillwater to guarantee at least one error exists.
#[derive(Debug, Clone)]
pub struct ConfigErrors(pub NonEmptyVec<ConfigError>);

impl ConfigErrors {
    /// Create from a single error.
    pub fn single(error: ConfigError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(errors: Vec<ConfigError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Get the first error (always exists).
    pub fn first(&self) -> &ConfigError {
        self.0.head()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over errors.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    /// Dot-paths of every error that names one, in report order.
    pub fn paths(&self) -> Vec<&str> {
        self.iter().filter_map(ConfigError::path).collect()
    }

    /// Check whether any error names `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.iter().any(|e| e.path() == Some(path))
    }

    /// Add context to all errors.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        let context = context.into();
        Self(self.0.map(|e| e.with_context(&context)))
    }
}

impl Semigroup for ConfigErrors {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration errors ({}):", self.len())?;
        for error in self.iter() {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// Validation result type used while walking the schema.
pub type ConfigValidation<T> = Validation<T, ConfigErrors>;

/// Extension trait for creating failing validations easily.
pub trait ConfigValidationExt<T> {
    /// Create a failing validation with a single error.
    fn fail_with(error: ConfigError) -> ConfigValidation<T>;
}

impl<T> ConfigValidationExt<T> for ConfigValidation<T> {
    fn fail_with(error: ConfigError) -> ConfigValidation<T> {
        Validation::Failure(ConfigErrors::single(error))
    }
}

/// Group errors by their source for organized reporting.
pub fn group_by_source(errors: &ConfigErrors) -> BTreeMap<String, Vec<&ConfigError>> {
    let mut groups: BTreeMap<String, Vec<&ConfigError>> = BTreeMap::new();

    for error in errors.iter() {
        let source = match error {
            ConfigError::SourceError { source_name, .. } => source_name.clone(),
            other => other
                .source_location()
                .map(|loc| loc.source.clone())
                .unwrap_or_else(|| "(general)".to_string()),
        };

        groups.entry(source).or_default().push(error);
    }

    groups
}

/// Strict `set` found a missing or non-table intermediate segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("strict set failed: path '{path}' does not exist or is not an object")]
pub struct InvalidPathError {
    /// Prefix of the requested path up to and including the offending segment
    pub path: String,
}

impl InvalidPathError {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Errors from typed reads on a [`ConfigService`](crate::ConfigService).
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("no configuration value at '{path}'")]
    NotFound { path: String },

    #[error("value at '{path}' cannot be read as {type_name}: {message}")]
    Type {
        path: String,
        type_name: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation::new("config.yml");
        assert_eq!(format!("{}", loc), "config.yml");

        let loc = SourceLocation::new("config.yml").with_line(10);
        assert_eq!(format!("{}", loc), "config.yml:10");

        let loc = SourceLocation::new("config.yml").with_line(10).with_column(5);
        assert_eq!(format!("{}", loc), "config.yml:10:5");
    }

    #[test]
    fn test_source_location_env() {
        let loc = SourceLocation::env("XNTHA_DB_HOST");
        assert_eq!(loc.source, "env:XNTHA_DB_HOST");
    }

    #[test]
    fn test_missing_field_mentions_env_var() {
        let err = ConfigError::MissingField {
            path: "db.host".to_string(),
            env_var: Some("XNTHA_DB_HOST".to_string()),
        };
        assert_eq!(err.path(), Some("db.host"));
        assert_eq!(
            err.to_string(),
            "missing required field 'db.host' (XNTHA_DB_HOST)"
        );
        assert!(err.suggestion().unwrap().contains("XNTHA_DB_HOST"));
    }

    #[test]
    fn test_config_errors_combine_and_paths() {
        let e1 = ConfigErrors::single(ConfigError::MissingField {
            path: "db.host".to_string(),
            env_var: None,
        });
        let e2 = ConfigErrors::single(ConfigError::TypeMismatch {
            path: "db.port".to_string(),
            source_location: Some(SourceLocation::env("XNTHA_DB_PORT")),
            expected: "number".to_string(),
            actual: "string".to_string(),
        });
        let combined = e1.combine(e2);

        assert_eq!(combined.len(), 2);
        assert_eq!(combined.paths(), vec!["db.host", "db.port"]);
        assert!(combined.contains_path("db.port"));
        assert!(!combined.contains_path("db.name"));
    }

    #[test]
    fn test_config_validation_fail_with() {
        let result: ConfigValidation<i32> = ConfigValidation::fail_with(ConfigError::MissingField {
            path: "a".to_string(),
            env_var: None,
        });
        assert!(result.is_failure());
    }

    #[test]
    fn test_group_by_source() {
        let errors = ConfigErrors::from_vec(vec![
            ConfigError::TypeMismatch {
                path: "db.port".to_string(),
                source_location: Some(SourceLocation::new("config.yml")),
                expected: "number".to_string(),
                actual: "string".to_string(),
            },
            ConfigError::ValidationError {
                path: "db.name".to_string(),
                source_location: Some(SourceLocation::new("config.yml")),
                value: Some("".to_string()),
                message: "cannot be empty".to_string(),
            },
            ConfigError::MissingField {
                path: "db.host".to_string(),
                env_var: None,
            },
            ConfigError::SourceError {
                source_name: "broken.yml".to_string(),
                kind: SourceErrorKind::IoError {
                    message: "denied".to_string(),
                },
            },
        ])
        .unwrap();

        let grouped = group_by_source(&errors);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped.get("config.yml").map(|v| v.len()), Some(2));
        assert_eq!(grouped.get("(general)").map(|v| v.len()), Some(1));
        assert_eq!(grouped.get("broken.yml").map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_invalid_path_error_display() {
        let err = InvalidPathError::new("a.b");
        assert_eq!(
            err.to_string(),
            "strict set failed: path 'a.b' does not exist or is not an object"
        );
    }

    #[test]
    fn test_suggestion_for_env_string() {
        let err = ConfigError::TypeMismatch {
            path: "basic.listenPort".to_string(),
            source_location: None,
            expected: "number".to_string(),
            actual: "string".to_string(),
        };
        assert!(err.suggestion().unwrap().contains("coercion"));
    }
}
