//! Deep merge of configuration layers.
//!
//! Tables merge key by key; any other value in the overlay replaces the base
//! wholesale (arrays are not concatenated). When one layer holds a table and
//! the next holds a scalar at the same path, the later layer wins and the
//! conflict is logged at `warn`; validation then reports the shape against the
//! schema.

use tracing::warn;

use crate::source::Fragment;
use crate::value::{join_path, Value};

/// Merge `overlay` on top of `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    merge_at(base, overlay, "")
}

fn merge_at(base: Value, overlay: Value, path: &str) -> Value {
    match (base, overlay) {
        (Value::Table(mut base_map), Value::Table(overlay_map)) => {
            for (key, value) in overlay_map {
                let child_path = join_path(path, &key);
                let merged = match base_map.remove(&key) {
                    Some(existing) => merge_at(existing, value, &child_path),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            Value::Table(base_map)
        }
        (base, overlay) => {
            if base.is_table() != overlay.is_table() && !base.is_null() && !overlay.is_null() {
                warn!(
                    path = %path,
                    replaced = base.type_name(),
                    with = overlay.type_name(),
                    "configuration layers disagree on shape; later layer wins"
                );
            }
            overlay
        }
    }
}

/// Merge fragments in ascending precedence: later fragments win.
pub fn merge_fragments(fragments: impl IntoIterator<Item = Fragment>) -> Fragment {
    fragments
        .into_iter()
        .fold(Fragment::empty(), |acc, next| acc.merge(next))
}
