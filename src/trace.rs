//! Per-path origin history across configuration layers.
//!
//! Each layer (schema defaults, YAML, environment, input) that supplied a
//! leaf adds an entry to that leaf's history, lowest precedence first. The
//! last entry is the one that won the merge.
//!
//! ```
//! use strata::env::MockEnv;
//! use strata::schema::{integer, object};
//! use strata::{Input, Resolver, Value};
//!
//! let schema = object([("basic", object([("listenPort", integer().default(3000).coerce())]).default(Value::table()))]);
//! let env = MockEnv::new().with_env("APP_BASIC_LISTEN_PORT", "8080");
//! let resolved = Resolver::new(schema)
//!     .resolve_with_env(&env, Some(Input::partial().set("basic.listenPort", 9000).build()))
//!     .unwrap();
//!
//! assert!(resolved.was_overridden("basic.listenPort"));
//! println!("{}", resolved.trace_report());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::error::SourceLocation;
use crate::source::Fragment;
use crate::value::Value;

/// A value with its source information.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedValue {
    pub value: Value,
    pub source: SourceLocation,
    /// Whether this value won the merge
    pub is_final: bool,
}

impl TracedValue {
    pub fn new(value: Value, source: SourceLocation, is_final: bool) -> Self {
        Self {
            value,
            source,
            is_final,
        }
    }
}

/// Trace of a single configuration leaf.
#[derive(Debug, Clone)]
pub struct ValueTrace {
    /// The value from the highest-precedence layer
    pub final_value: TracedValue,
    /// Every layer's value, lowest precedence first
    pub history: Vec<TracedValue>,
}

impl ValueTrace {
    /// Build a trace from a history. The last entry is marked final.
    pub fn new(mut history: Vec<TracedValue>) -> Option<Self> {
        let last = history.last_mut()?;
        last.is_final = true;
        let final_value = last.clone();

        Some(Self {
            final_value,
            history,
        })
    }

    /// More than one layer supplied this leaf.
    pub fn was_overridden(&self) -> bool {
        self.history.len() > 1
    }

    pub fn source_count(&self) -> usize {
        self.history.len()
    }
}

impl fmt::Display for ValueTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Final: {} (from {})",
            self.final_value.value, self.final_value.source
        )?;

        if self.history.len() > 1 {
            writeln!(f, "History:")?;
            for val in &self.history {
                let marker = if val.is_final { "→" } else { " " };
                writeln!(f, "  {} [{}] {}", marker, val.source, val.value)?;
            }
        }

        Ok(())
    }
}

/// Collects layer values while a configuration is resolved.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    values: BTreeMap<String, Vec<TracedValue>>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&mut self, path: String, value: Value, source: SourceLocation) {
        self.values
            .entry(path)
            .or_default()
            .push(TracedValue::new(value, source, false));
    }

    /// Record every tracked leaf of a layer.
    pub fn add_fragment(&mut self, fragment: &Fragment) {
        for (path, source) in fragment.origins() {
            if let Some(value) = fragment.get(path) {
                self.add_value(path.clone(), value.clone(), source.clone());
            }
        }
    }

    pub fn build(self) -> BTreeMap<String, ValueTrace> {
        self.values
            .into_iter()
            .filter_map(|(path, history)| ValueTrace::new(history).map(|trace| (path, trace)))
            .collect()
    }
}

/// Human-readable report of every traced path.
pub fn trace_report(traces: &BTreeMap<String, ValueTrace>) -> String {
    let mut report = String::new();

    for (path, trace) in traces {
        report.push_str(&format!("{} = {}\n", path, trace.final_value.value));

        for val in &trace.history {
            let marker = if val.is_final { "✓" } else { "○" };
            let override_note = if !val.is_final { " <- overridden" } else { "" };
            report.push_str(&format!(
                "  {} [{}] {}{}\n",
                marker, val.source, val.value, override_note
            ));
        }
        report.push('\n');
    }

    report
}
