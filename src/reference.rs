//! Snapshots of referenced options, captured each time a referencing option
//! is matched.

use crate::schema::{OptionSpec, Schema};
use crate::store::{Cell, Store};
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// The state of a referenced option at the moment of capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Snapshot {
    /// A flag: whether it had been seen.
    Found(bool),
    /// A multiple option: an independent copy of its values so far.
    Values(Vec<Value>),
    /// Any other option: its value, or `None` if not yet matched.
    Value(Option<Value>),
}

impl Snapshot {
    pub fn found(&self) -> Option<bool> {
        match self {
            Snapshot::Found(found) => Some(*found),
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Snapshot::Values(values) => Some(values),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Snapshot::Value(value) => value.as_ref(),
            _ => None,
        }
    }
}

/// An option's own value followed by one snapshot per referenced option,
/// in the order the references were declared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefTuple {
    value: Box<Value>,
    snapshots: IndexMap<String, Snapshot>,
}

impl RefTuple {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn snapshot(&self, name: &str) -> Option<&Snapshot> {
        self.snapshots.get(name)
    }

    /// Snapshots in declaration order of the references.
    pub fn snapshots(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.snapshots.iter().map(|(name, snap)| (name.as_str(), snap))
    }
}

/// Bundle `value` with the current state of everything `spec` references.
/// Options without references get their value back unchanged.
pub(crate) fn capture(schema: &Schema, store: &Store, spec: &OptionSpec, value: Value) -> Value {
    if spec.reference_names().is_empty() {
        return value;
    }

    let snapshots = spec
        .reference_names()
        .iter()
        .filter_map(|name| {
            let index = schema.index_of(name)?;
            Some((name.clone(), snapshot_of(store, index)))
        })
        .collect();

    Value::Tuple(RefTuple {
        value: Box::new(value),
        snapshots,
    })
}

fn snapshot_of(store: &Store, index: usize) -> Snapshot {
    match store.cell(index) {
        Cell::Unit => Snapshot::Found(store.is_found(index)),
        Cell::Multiple(values) => Snapshot::Values(values.clone()),
        Cell::Single(value) => Snapshot::Value(value.clone()),
    }
}
