//! Programmatic input supplied by the process entry point.
//!
//! Input is the highest-precedence layer. It can be a whole value tree, any
//! `Serialize` type, or a set of individual path overrides:
//!
//! ```
//! use strata::Input;
//!
//! let input = Input::partial()
//!     .set("basic.listenPort", 9000)
//!     .set("db.ssl", true)
//!     .build();
//! assert_eq!(input.get("db.ssl").and_then(|v| v.as_bool()), Some(true));
//! ```

use serde::Serialize;

use crate::env::ConfigEnv;
use crate::error::{ConfigError, ConfigErrors, SourceErrorKind, SourceLocation};
use crate::source::{Fragment, Source};
use crate::value::Value;

const INPUT_NAME: &str = "input";

/// Programmatic configuration layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    value: Value,
}

impl Input {
    /// Use a value tree as input. It must be a table to be loaded.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Serialize any value into input.
    ///
    /// # Errors
    ///
    /// Fails when serialization fails (for example, a map with non-string keys).
    pub fn serialize<T: Serialize>(value: &T) -> Result<Self, ConfigErrors> {
        let json = serde_json::to_value(value).map_err(|e| {
            ConfigErrors::single(ConfigError::SourceError {
                source_name: INPUT_NAME.to_string(),
                kind: SourceErrorKind::InvalidShape {
                    message: e.to_string(),
                },
            })
        })?;
        Ok(Self::value(Value::from(json)))
    }

    /// Start a set of individual path overrides.
    pub fn partial() -> PartialInput {
        PartialInput {
            value: Value::table(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.value.get_path(path)
    }
}

impl Source for Input {
    fn load(&self, _env: &dyn ConfigEnv) -> Result<Fragment, ConfigErrors> {
        match &self.value {
            Value::Table(_) => Ok(Fragment::from_value(
                self.value.clone(),
                &SourceLocation::input(),
            )),
            Value::Null => Ok(Fragment::empty()),
            other => Err(ConfigErrors::single(ConfigError::SourceError {
                source_name: INPUT_NAME.to_string(),
                kind: SourceErrorKind::InvalidShape {
                    message: format!("input must be a table, found {}", other.type_name()),
                },
            })),
        }
    }

    fn name(&self) -> &str {
        INPUT_NAME
    }
}

/// Builder for path-by-path input overrides.
#[derive(Debug, Clone)]
pub struct PartialInput {
    value: Value,
}

impl PartialInput {
    /// Set `path` to `value`, creating intermediate tables.
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.value.set_path(path, value.into());
        self
    }

    pub fn build(self) -> Input {
        Input { value: self.value }
    }
}

impl From<PartialInput> for Input {
    fn from(partial: PartialInput) -> Self {
        partial.build()
    }
}
