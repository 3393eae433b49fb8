//! Schema validation of the merged configuration.
//!
//! Validation walks the schema and the merged value together, applying
//! defaults, preprocessors and transforms as declared, and accumulates every
//! failure through stillwater's `Validation` so one run reports all bad paths.
//! Keys the schema does not declare are stripped from the output.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use stillwater::Validation;
use tracing::debug;

use crate::envmap::EnvVarMap;
use crate::error::{ConfigError, ConfigErrors, ConfigValidation, ConfigValidationExt, SourceLocation};
use crate::schema::{Leaf, NumberRules, SchemaNode, WrapperKind};
use crate::source::Fragment;
use crate::value::{join_path, Value};

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$")
            .expect("valid regex")
    })
}

/// Lookups used to enrich error reports.
///
/// Both are optional: without origins errors carry no source location, and
/// without an env map missing-field errors carry no variable hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    origins: Option<&'a Fragment>,
    env_map: Option<&'a EnvVarMap>,
}

impl<'a> ValidationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origins(mut self, fragment: &'a Fragment) -> Self {
        self.origins = Some(fragment);
        self
    }

    pub fn with_env_map(mut self, map: &'a EnvVarMap) -> Self {
        self.env_map = Some(map);
        self
    }

    fn location(&self, path: &str) -> Option<SourceLocation> {
        self.origins.and_then(|f| f.origin(path)).cloned()
    }

    fn env_var(&self, path: &str) -> Option<String> {
        self.env_map
            .and_then(|m| m.var_for_path(path))
            .map(str::to_string)
    }
}

/// Validate a merged configuration tree against `schema`.
///
/// On success the returned tree has defaults applied, transforms
/// materialized, and undeclared keys removed.
pub fn validate_config(
    schema: &SchemaNode,
    value: &Value,
    ctx: &ValidationContext<'_>,
) -> ConfigValidation<Value> {
    validate_node(schema, Some(value), "", ctx).map(Option::unwrap_or_default)
}

fn validate_node(
    node: &SchemaNode,
    value: Option<&Value>,
    path: &str,
    ctx: &ValidationContext<'_>,
) -> ConfigValidation<Option<Value>> {
    match node {
        SchemaNode::Wrapper { kind, inner } => validate_wrapper(kind, inner, value, path, ctx),
        SchemaNode::Leaf(leaf) => match value {
            None => missing(path, ctx.env_var(path)),
            Some(v) => check_leaf(leaf, v, path, ctx).map(|_| Some(v.clone())),
        },
        SchemaNode::Branch(children) => match value {
            None => missing(path, None),
            Some(Value::Table(table)) => validate_branch(children, table, path, ctx),
            Some(other) => mismatch(path, ctx, "object", other),
        },
        SchemaNode::Array(item) => match value {
            None => missing(path, None),
            Some(Value::Array(items)) => {
                let results: Vec<ConfigValidation<Value>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, element)| {
                        validate_node(item, Some(element), &format!("{}[{}]", path, i), ctx)
                            .map(Option::unwrap_or_default)
                    })
                    .collect();
                all(results).map(|values| Some(Value::Array(values)))
            }
            Some(other) => mismatch(path, ctx, "array", other),
        },
        SchemaNode::Union(variants) => match value {
            None => missing(path, None),
            Some(v) => variants
                .iter()
                .map(|variant| validate_node(variant, Some(v), path, ctx))
                .find(|result| result.is_success())
                .unwrap_or_else(|| {
                    invalid(
                        path,
                        ctx,
                        v,
                        format!("did not match any of {} alternatives", variants.len()),
                    )
                }),
        },
    }
}

fn validate_wrapper(
    kind: &WrapperKind,
    inner: &SchemaNode,
    value: Option<&Value>,
    path: &str,
    ctx: &ValidationContext<'_>,
) -> ConfigValidation<Option<Value>> {
    match kind {
        WrapperKind::Optional => match value {
            None => Validation::Success(None),
            Some(_) => validate_node(inner, value, path, ctx),
        },
        WrapperKind::Nullable => match value {
            Some(Value::Null) => Validation::Success(Some(Value::Null)),
            _ => validate_node(inner, value, path, ctx),
        },
        WrapperKind::Default(declared) => match value {
            None => validate_node(inner, Some(declared), path, ctx),
            Some(_) => validate_node(inner, value, path, ctx),
        },
        WrapperKind::Preprocess(f) => match value {
            None => validate_node(inner, None, path, ctx),
            Some(v) => match f(v.clone()) {
                Ok(processed) => validate_node(inner, Some(&processed), path, ctx),
                Err(message) => invalid(path, ctx, v, message),
            },
        },
        WrapperKind::Transform(f) => match validate_node(inner, value, path, ctx) {
            Validation::Success(Some(v)) => {
                let shown = v.clone();
                match f(v) {
                    Ok(transformed) => Validation::Success(Some(transformed)),
                    Err(message) => invalid(path, ctx, &shown, message),
                }
            }
            other => other,
        },
    }
}

fn validate_branch(
    children: &[(String, SchemaNode)],
    table: &BTreeMap<String, Value>,
    path: &str,
    ctx: &ValidationContext<'_>,
) -> ConfigValidation<Option<Value>> {
    for key in table.keys() {
        if !children.iter().any(|(k, _)| k == key) {
            debug!(path = %join_path(path, key), "dropping key not declared in schema");
        }
    }

    let results: Vec<ConfigValidation<(String, Option<Value>)>> = children
        .iter()
        .map(|(key, child)| {
            validate_node(child, table.get(key), &join_path(path, key), ctx)
                .map(|v| (key.clone(), v))
        })
        .collect();

    all(results).map(|pairs| {
        Some(Value::Table(
            pairs
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect(),
        ))
    })
}

fn check_leaf(
    leaf: &Leaf,
    value: &Value,
    path: &str,
    ctx: &ValidationContext<'_>,
) -> ConfigValidation<()> {
    match (leaf, value) {
        (Leaf::String, Value::String(_)) => Validation::Success(()),
        (Leaf::Boolean, Value::Bool(_)) => Validation::Success(()),
        (Leaf::Number(rules), Value::Integer(_) | Value::Float(_)) => {
            let n = value.as_float().unwrap_or_default();
            let problems = number_problems(rules, n);
            match ConfigErrors::from_vec(
                problems
                    .into_iter()
                    .map(|message| validation_error(path, ctx, value, message))
                    .collect(),
            ) {
                Some(errors) => Validation::Failure(errors),
                None => Validation::Success(()),
            }
        }
        (Leaf::Enum(variants), Value::String(s)) => {
            if variants.iter().any(|v| v == s) {
                Validation::Success(())
            } else {
                invalid(path, ctx, value, format!("must be {}", leaf.expected()))
            }
        }
        (Leaf::Literal(expected), v) => {
            if v == expected {
                Validation::Success(())
            } else {
                invalid(path, ctx, value, format!("expected {}", leaf.expected()))
            }
        }
        (Leaf::Date, Value::String(s)) => {
            if date_pattern().is_match(s) {
                Validation::Success(())
            } else {
                invalid(path, ctx, value, "invalid date, expected YYYY-MM-DD[THH:MM[:SS]]".to_string())
            }
        }
        (leaf, other) => mismatch(path, ctx, &leaf.expected(), other),
    }
}

fn number_problems(rules: &NumberRules, n: f64) -> Vec<String> {
    let mut problems = Vec::new();
    if rules.integer && n.fract() != 0.0 {
        problems.push("expected an integer".to_string());
    }
    if let Some(min) = rules.min {
        if n < min {
            problems.push(format!("must be at least {}", min));
        }
    }
    if let Some(max) = rules.max {
        if n > max {
            problems.push(format!("must be at most {}", max));
        }
    }
    problems
}

/// `Validation::all_vec` that also accepts an empty list.
fn all<T>(results: Vec<ConfigValidation<T>>) -> ConfigValidation<Vec<T>> {
    if results.is_empty() {
        Validation::Success(Vec::new())
    } else {
        Validation::all_vec(results)
    }
}

fn missing<T>(path: &str, env_var: Option<String>) -> ConfigValidation<T> {
    ConfigValidation::fail_with(ConfigError::MissingField {
        path: path.to_string(),
        env_var,
    })
}

fn mismatch<T>(
    path: &str,
    ctx: &ValidationContext<'_>,
    expected: &str,
    actual: &Value,
) -> ConfigValidation<T> {
    ConfigValidation::fail_with(ConfigError::TypeMismatch {
        path: path.to_string(),
        source_location: ctx.location(path),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    })
}

fn validation_error(path: &str, ctx: &ValidationContext<'_>, value: &Value, message: String) -> ConfigError {
    ConfigError::ValidationError {
        path: path.to_string(),
        source_location: ctx.location(path),
        value: Some(value.to_string()),
        message,
    }
}

fn invalid<T>(path: &str, ctx: &ValidationContext<'_>, value: &Value, message: String) -> ConfigValidation<T> {
    ConfigValidation::fail_with(validation_error(path, ctx, value, message))
}
