//! Default extraction guided by user-supplied configuration.
//!
//! Defaults are only materialized for the subtrees the user actually touched.
//! A schema with hundreds of optional defaulted sections yields nothing for a
//! user fragment of `{}`.

use std::collections::BTreeMap;

use crate::merge::deep_merge;
use crate::schema::{SchemaNode, WrapperKind};
use crate::value::Value;

/// Collect the defaults that apply to `fragment`.
///
/// - A defaulted node yields its declared default, whatever the fragment holds.
/// - Other wrappers are unwrapped with the same fragment.
/// - A branch recurses only into keys present in the fragment, and yields
///   `None` when the fragment is not a table or nothing below it has a default.
/// - Everything else yields `None`.
///
/// # Example
///
/// ```
/// use strata::defaults::extract_defaults;
/// use strata::schema::{integer, object, string};
/// use strata::Value;
///
/// let schema = object([
///     ("basic", object([("listenPort", integer().default(3000))]).default(Value::table())),
///     ("db", object([("host", string().default("localhost"))]).default(Value::table())),
/// ]);
///
/// assert_eq!(extract_defaults(&schema, Some(&Value::table())), None);
///
/// let mut touched = Value::table();
/// touched.set_path("basic", Value::table());
/// let defaults = extract_defaults(&schema, Some(&touched)).unwrap();
/// assert_eq!(defaults.get_path("basic.listenPort"), Some(&Value::Integer(3000)));
/// assert!(defaults.get_path("db").is_none());
/// ```
pub fn extract_defaults(node: &SchemaNode, fragment: Option<&Value>) -> Option<Value> {
    match node {
        SchemaNode::Wrapper {
            kind: WrapperKind::Default(declared),
            inner,
        } => Some(complete_default(inner, declared.clone())),
        SchemaNode::Wrapper { inner, .. } => extract_defaults(inner, fragment),
        SchemaNode::Branch(children) => {
            let Some(Value::Table(user)) = fragment else {
                return None;
            };

            let defaults: BTreeMap<String, Value> = children
                .iter()
                .filter_map(|(key, child)| {
                    let child_fragment = user.get(key)?;
                    extract_defaults(child, Some(child_fragment)).map(|d| (key.clone(), d))
                })
                .collect();

            if defaults.is_empty() {
                None
            } else {
                Some(Value::Table(defaults))
            }
        }
        _ => None,
    }
}

/// The value a node takes when every source is silent about it.
///
/// Only nodes carrying a default (possibly under other wrappers) have one;
/// a bare branch does not.
pub fn declared_default(node: &SchemaNode) -> Option<Value> {
    match node {
        SchemaNode::Wrapper {
            kind: WrapperKind::Default(declared),
            inner,
        } => Some(complete_default(inner, declared.clone())),
        SchemaNode::Wrapper { inner, .. } => declared_default(inner),
        _ => None,
    }
}

/// A branch default like `{}` picks up the defaults of its own children.
/// Declared keys win over child defaults.
fn complete_default(inner: &SchemaNode, declared: Value) -> Value {
    match (inner.terminal(), &declared) {
        (SchemaNode::Branch(children), Value::Table(_)) => {
            let base: BTreeMap<String, Value> = children
                .iter()
                .filter_map(|(key, child)| declared_default(child).map(|d| (key.clone(), d)))
                .collect();
            deep_merge(Value::Table(base), declared)
        }
        _ => declared,
    }
}
