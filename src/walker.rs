//! Schema traversal and leaf/branch classification.
//!
//! Every algorithm that needs to know the shape of a schema (defaults,
//! environment binding, path checks) goes through these functions. Arrays and
//! unions classify as [`NodeClass::Unsupported`]: they are visited but never
//! recursed into, so they receive no defaults and no environment bindings.

use crate::schema::SchemaNode;
use crate::value::join_path;

/// Shape of a schema node after all wrappers are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Leaf,
    Branch,
    Unsupported,
}

/// Strip optional/nullable/default/transform wrappers.
pub fn unwrap(node: &SchemaNode) -> &SchemaNode {
    node.terminal()
}

pub fn classify(node: &SchemaNode) -> NodeClass {
    match unwrap(node) {
        SchemaNode::Leaf(_) => NodeClass::Leaf,
        SchemaNode::Branch(_) => NodeClass::Branch,
        SchemaNode::Array(_) | SchemaNode::Union(_) | SchemaNode::Wrapper { .. } => {
            NodeClass::Unsupported
        }
    }
}

pub fn is_leaf(node: &SchemaNode) -> bool {
    classify(node) == NodeClass::Leaf
}

/// Depth-first walk over every node below `schema`.
///
/// The visitor receives the segment path, the node as declared (wrappers
/// intact) and its class. Branches are recursed after being visited; leaves
/// and unsupported nodes are not. The root itself is not visited.
pub fn walk<F>(schema: &SchemaNode, mut visitor: F)
where
    F: FnMut(&[String], &SchemaNode, NodeClass),
{
    let mut path = Vec::new();
    walk_inner(schema, &mut path, &mut visitor);
}

fn walk_inner<F>(node: &SchemaNode, path: &mut Vec<String>, visitor: &mut F)
where
    F: FnMut(&[String], &SchemaNode, NodeClass),
{
    let SchemaNode::Branch(children) = unwrap(node) else {
        return;
    };

    for (key, child) in children {
        path.push(key.clone());
        let class = classify(child);
        visitor(path, child, class);
        if class == NodeClass::Branch {
            walk_inner(child, path, visitor);
        }
        path.pop();
    }
}

/// Segment paths of every leaf, in declaration order.
pub fn leaf_paths(schema: &SchemaNode) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    walk(schema, |path, _, class| {
        if class == NodeClass::Leaf {
            out.push(path.to_vec());
        }
    });
    out
}

/// Dot-path and declared node of every leaf, in declaration order.
pub fn flatten_schema(schema: &SchemaNode) -> Vec<(String, &SchemaNode)> {
    let mut out = Vec::new();
    flatten_into(schema, "", &mut out);
    out
}

fn flatten_into<'a>(node: &'a SchemaNode, prefix: &str, out: &mut Vec<(String, &'a SchemaNode)>) {
    let SchemaNode::Branch(children) = unwrap(node) else {
        return;
    };
    for (key, child) in children {
        let path = join_path(prefix, key);
        match classify(child) {
            NodeClass::Leaf => out.push((path, child)),
            NodeClass::Branch => flatten_into(child, &path, out),
            NodeClass::Unsupported => {}
        }
    }
}

/// Look up the declared node at a dot-path. The empty path is the root.
pub fn find<'a>(schema: &'a SchemaNode, path: &str) -> Option<&'a SchemaNode> {
    if path.is_empty() {
        return Some(schema);
    }
    path.split('.')
        .try_fold(schema, |node, segment| node.child(segment))
}

/// Whether every segment of `path` names a child of the branch above it.
pub fn has_path(schema: &SchemaNode, path: &str) -> bool {
    find(schema, path).is_some()
}
