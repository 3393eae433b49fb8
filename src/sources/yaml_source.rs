//! YAML configuration source.
//!
//! Loads a YAML document from an explicit file, an in-memory string, or the
//! first file found among the conventional locations under the working
//! directory. Leaf origins carry the line where each key appears.
//!
//! # Example
//!
//! ```
//! use strata::env::MockEnv;
//! use strata::{Source, Yaml};
//!
//! let env = MockEnv::new().with_file("./src/config/config.yaml", "db:\n  host: example\n");
//! let fragment = Yaml::discover().load(&env).unwrap();
//! assert_eq!(fragment.get("db.host").and_then(|v| v.as_str()), Some("example"));
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::env::ConfigEnv;
use crate::error::{ConfigError, ConfigErrors, SourceErrorKind, SourceLocation};
use crate::source::{Fragment, Source};
use crate::sources::line_from_offset;
use crate::value::Value;

/// Folders searched by [`Yaml::discover`], relative to the working directory.
pub const DEFAULT_SEARCH_DIRS: [&str; 3] = ["", "src/config", "static/config"];

/// File names tried in each search folder, in order.
pub const DEFAULT_FILE_NAMES: [&str; 2] = ["config.yml", "config.yaml"];

#[derive(Debug, Clone)]
enum YamlSource {
    File(PathBuf),
    String { content: String },
    Discover { dirs: Vec<PathBuf> },
}

/// YAML configuration source.
#[derive(Debug, Clone)]
pub struct Yaml {
    source: YamlSource,
    required: bool,
    name: String,
}

impl Yaml {
    /// Load YAML from a file path (required by default).
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            source: YamlSource::File(path),
            required: true,
        }
    }

    /// Load YAML from a string.
    pub fn string(content: impl Into<String>) -> Self {
        Self {
            source: YamlSource::String {
                content: content.into(),
            },
            required: true,
            name: "<string>".to_string(),
        }
    }

    /// Load the first `config.yml`/`config.yaml` found in the default folders.
    ///
    /// Finding nothing is not an error.
    pub fn discover() -> Self {
        Self::discover_in(DEFAULT_SEARCH_DIRS.iter().map(PathBuf::from))
    }

    /// Like [`Yaml::discover`] with custom folders, relative to the working directory.
    pub fn discover_in<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            source: YamlSource::Discover {
                dirs: dirs.into_iter().map(Into::into).collect(),
            },
            required: false,
            name: "<discovered>".to_string(),
        }
    }

    /// A missing file yields an empty fragment instead of an error.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a custom name for this source in error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn load_file(
        &self,
        env: &dyn ConfigEnv,
        path: &Path,
        source_name: &str,
    ) -> Result<Fragment, ConfigErrors> {
        let content = match env.read_file(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.required {
                    return Err(ConfigErrors::single(ConfigError::SourceError {
                        source_name: source_name.to_string(),
                        kind: SourceErrorKind::NotFound {
                            path: path.display().to_string(),
                        },
                    }));
                }
                warn!(path = %path.display(), "config file not found; continuing without it");
                return Ok(Fragment::empty());
            }
            Err(e) => {
                return Err(ConfigErrors::single(ConfigError::SourceError {
                    source_name: source_name.to_string(),
                    kind: SourceErrorKind::IoError {
                        message: e.to_string(),
                    },
                }));
            }
        };

        debug!(path = %path.display(), "loaded config file");
        parse_yaml(&content, source_name)
    }
}

impl Source for Yaml {
    fn load(&self, env: &dyn ConfigEnv) -> Result<Fragment, ConfigErrors> {
        match &self.source {
            YamlSource::File(path) => self.load_file(env, path, &self.name),
            YamlSource::String { content } => parse_yaml(content, &self.name),
            YamlSource::Discover { dirs } => {
                let cwd = env.current_dir();
                let found = dirs
                    .iter()
                    .flat_map(|dir| DEFAULT_FILE_NAMES.iter().map(move |f| dir.join(f)))
                    .map(|relative| cwd.join(relative))
                    .find(|candidate| env.file_exists(candidate));

                match found {
                    Some(path) => {
                        let name = path.display().to_string();
                        self.load_file(env, &path, &name)
                    }
                    None => {
                        debug!(cwd = %cwd.display(), "no config file discovered");
                        Ok(Fragment::empty())
                    }
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Parse YAML content into a fragment, tracking the line of every leaf.
fn parse_yaml(content: &str, source_name: &str) -> Result<Fragment, ConfigErrors> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e: serde_yaml::Error| {
            let (line, column) = e.location().map_or((None, None), |loc| {
                (Some(loc.line() as u32), Some(loc.column() as u32))
            });
            ConfigErrors::single(ConfigError::SourceError {
                source_name: source_name.to_string(),
                kind: SourceErrorKind::ParseError {
                    message: e.to_string(),
                    line,
                    column,
                },
            })
        })?;

    let value = match yaml_to_value(&document) {
        Value::Null => return Ok(Fragment::empty()),
        table @ Value::Table(_) => table,
        other => {
            return Err(ConfigErrors::single(ConfigError::SourceError {
                source_name: source_name.to_string(),
                kind: SourceErrorKind::InvalidShape {
                    message: format!("top-level YAML must be a mapping, found {}", other.type_name()),
                },
            }))
        }
    };

    let origins = value
        .flatten()
        .into_keys()
        .map(|path| {
            let line = find_key_line(content, &path);
            (path, SourceLocation::file(source_name, line, None))
        })
        .collect();

    Ok(Fragment::with_origins(value, origins))
}

/// Find the line where a dotted key appears.
///
/// Each segment must start a line (after indentation, optionally quoted)
/// and is searched for after the position of its parent, so `db.host`
/// resolves to the `host:` under `db:` and never to a sibling like `ghost:`.
fn find_key_line(content: &str, path: &str) -> Option<u32> {
    let mut search_from = 0;
    let mut key_start = 0;
    for segment in path.split('.') {
        let pattern = Regex::new(&format!(
            r#"(?m)^[ \t]*(?:{0}|"{0}"|'{0}')[ \t]*:"#,
            regex::escape(segment)
        ))
        .ok()?;
        let found = pattern.find(&content[search_from..])?;
        key_start = search_from + found.start();
        // Children start on a later line than their parent key.
        search_from = content[key_start..]
            .find('\n')
            .map_or(content.len(), |nl| key_start + nl + 1);
    }
    Some(line_from_offset(content, key_start))
}

/// Convert a serde_yaml::Value to our Value type.
fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(arr) => Value::Array(arr.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Mapping(map) => Value::Table(
            map.iter()
                .filter_map(|(k, v)| {
                    let key = match k {
                        serde_yaml::Value::String(s) => s.clone(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key, yaml_to_value(v)))
                })
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}
