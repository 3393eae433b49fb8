//! Declarative schema tree.
//!
//! A schema is a tagged-variant tree: primitive [`Leaf`] nodes, named-child
//! branches, wrappers that modify optionality, nullability, defaults or apply
//! a transform, plus arrays and unions that the walker treats as opaque.
//!
//! ```
//! use strata::schema::{boolean, integer, object, string};
//!
//! let schema = object([
//!     ("host", string().default("localhost")),
//!     ("port", integer().min(0.0).max(65325.0).default(3333).coerce()),
//!     ("ssl", boolean().default(false).coerce()),
//!     ("uri", string().optional()),
//! ]);
//! assert!(schema.child("port").is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// A fallible value-to-value function attached to a wrapper node.
///
/// The `Err` string becomes the validation message for the path.
pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Bounds checked on numeric leaves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Reject values with a fractional part.
    pub integer: bool,
}

/// Primitive terminal kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    String,
    Number(NumberRules),
    Boolean,
    /// One of a fixed set of strings
    Enum(Vec<String>),
    /// Exactly this value
    Literal(Value),
    /// ISO-8601 date or date-time string
    Date,
}

impl Leaf {
    /// Human-readable description used in type mismatch errors.
    pub fn expected(&self) -> String {
        match self {
            Leaf::String => "string".to_string(),
            Leaf::Number(rules) if rules.integer => "integer".to_string(),
            Leaf::Number(_) => "number".to_string(),
            Leaf::Boolean => "boolean".to_string(),
            Leaf::Enum(variants) => format!("one of [{}]", variants.join(", ")),
            Leaf::Literal(v) => format!("literal {}", v),
            Leaf::Date => "date".to_string(),
        }
    }
}

/// Modifier carried by a wrapper node.
#[derive(Clone)]
pub enum WrapperKind {
    /// Absent values pass validation and stay absent.
    Optional,
    /// `null` passes validation.
    Nullable,
    /// Absent values are replaced by this value, then validated.
    Default(Value),
    /// Applied to a present value before the inner node checks it.
    Preprocess(TransformFn),
    /// Applied to the value after the inner node accepts it.
    Transform(TransformFn),
}

impl fmt::Debug for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapperKind::Optional => write!(f, "Optional"),
            WrapperKind::Nullable => write!(f, "Nullable"),
            WrapperKind::Default(v) => f.debug_tuple("Default").field(v).finish(),
            WrapperKind::Preprocess(_) => write!(f, "Preprocess(<fn>)"),
            WrapperKind::Transform(_) => write!(f, "Transform(<fn>)"),
        }
    }
}

/// One node of a configuration schema.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Leaf(Leaf),
    /// Named children in declaration order
    Branch(Vec<(String, SchemaNode)>),
    Wrapper {
        kind: WrapperKind,
        inner: Box<SchemaNode>,
    },
    /// Homogeneous list; never walked for defaults or env bindings
    Array(Box<SchemaNode>),
    /// First matching alternative wins; never walked for defaults or env bindings
    Union(Vec<SchemaNode>),
}

pub fn string() -> SchemaNode {
    SchemaNode::Leaf(Leaf::String)
}

pub fn number() -> SchemaNode {
    SchemaNode::Leaf(Leaf::Number(NumberRules::default()))
}

pub fn integer() -> SchemaNode {
    SchemaNode::Leaf(Leaf::Number(NumberRules {
        integer: true,
        ..NumberRules::default()
    }))
}

pub fn boolean() -> SchemaNode {
    SchemaNode::Leaf(Leaf::Boolean)
}

pub fn enumeration<I, S>(variants: I) -> SchemaNode
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SchemaNode::Leaf(Leaf::Enum(variants.into_iter().map(Into::into).collect()))
}

pub fn literal(value: impl Into<Value>) -> SchemaNode {
    SchemaNode::Leaf(Leaf::Literal(value.into()))
}

pub fn date() -> SchemaNode {
    SchemaNode::Leaf(Leaf::Date)
}

/// Build a branch from `(key, node)` pairs.
pub fn object<I, K>(fields: I) -> SchemaNode
where
    I: IntoIterator<Item = (K, SchemaNode)>,
    K: Into<String>,
{
    SchemaNode::Branch(fields.into_iter().map(|(k, n)| (k.into(), n)).collect())
}

pub fn array(item: SchemaNode) -> SchemaNode {
    SchemaNode::Array(Box::new(item))
}

pub fn union(variants: Vec<SchemaNode>) -> SchemaNode {
    SchemaNode::Union(variants)
}

impl SchemaNode {
    fn wrap(self, kind: WrapperKind) -> Self {
        SchemaNode::Wrapper {
            kind,
            inner: Box::new(self),
        }
    }

    pub fn optional(self) -> Self {
        self.wrap(WrapperKind::Optional)
    }

    pub fn nullable(self) -> Self {
        self.wrap(WrapperKind::Nullable)
    }

    pub fn default(self, value: impl Into<Value>) -> Self {
        self.wrap(WrapperKind::Default(value.into()))
    }

    pub fn preprocess<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.wrap(WrapperKind::Preprocess(Arc::new(f)))
    }

    pub fn transform<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.wrap(WrapperKind::Transform(Arc::new(f)))
    }

    /// Accept string input for number and boolean leaves.
    ///
    /// Environment variables are always strings; this attaches the strict
    /// string parser matching the unwrapped leaf kind. Other nodes are
    /// returned unchanged.
    pub fn coerce(self) -> Self {
        let parser: Option<fn(Value) -> Result<Value, String>> = match self.terminal() {
            SchemaNode::Leaf(Leaf::Number(_)) => Some(transforms::strict_number),
            SchemaNode::Leaf(Leaf::Boolean) => Some(transforms::strict_boolean),
            _ => None,
        };
        match parser {
            Some(parse) => self.preprocess(parse),
            None => self,
        }
    }

    /// Lower bound for a number leaf, applied through wrappers.
    pub fn min(self, min: f64) -> Self {
        self.map_number_rules(&|rules| rules.min = Some(min))
    }

    /// Upper bound for a number leaf, applied through wrappers.
    pub fn max(self, max: f64) -> Self {
        self.map_number_rules(&|rules| rules.max = Some(max))
    }

    fn map_number_rules(self, f: &dyn Fn(&mut NumberRules)) -> Self {
        match self {
            SchemaNode::Leaf(Leaf::Number(mut rules)) => {
                f(&mut rules);
                SchemaNode::Leaf(Leaf::Number(rules))
            }
            SchemaNode::Wrapper { kind, inner } => SchemaNode::Wrapper {
                kind,
                inner: Box::new(inner.map_number_rules(f)),
            },
            other => other,
        }
    }

    /// The node beneath all wrappers.
    pub fn terminal(&self) -> &SchemaNode {
        let mut node = self;
        while let SchemaNode::Wrapper { inner, .. } = node {
            node = inner;
        }
        node
    }

    /// Named child of the branch beneath any wrappers.
    pub fn child(&self, key: &str) -> Option<&SchemaNode> {
        match self.terminal() {
            SchemaNode::Branch(children) => {
                children.iter().find(|(k, _)| k == key).map(|(_, n)| n)
            }
            _ => None,
        }
    }
}

/// Strict string parsers for values that arrive as text.
pub mod transforms {
    use crate::value::Value;

    /// `true`/`false`/`1`/`0`, case-insensitive. Booleans pass through.
    pub fn strict_boolean(value: Value) -> Result<Value, String> {
        match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!(
                    "expected one of true, false, 1, 0 but got '{}'",
                    s
                )),
            },
            other => Ok(other),
        }
    }

    /// Integers and finite floats. Empty strings are rejected rather than read as zero.
    pub fn strict_number(value: Value) -> Result<Value, String> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err("expected a number but got an empty string".to_string());
                }
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Value::Integer(i));
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                    _ => Err(format!("expected a number but got '{}'", s)),
                }
            }
            other => Ok(other),
        }
    }

    /// Comma-separated string into a list of trimmed, non-empty strings.
    pub fn string_list(value: Value) -> Result<Value, String> {
        match value {
            Value::String(s) => Ok(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(Value::from)
                    .collect(),
            )),
            other => Ok(other),
        }
    }
}
