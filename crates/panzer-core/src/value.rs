//! The compiled value graph: one node per emitted declaration.
//!
//! Nodes live in an arena indexed by [`Handle`]. Children are referenced by
//! handle, so structurally identical subtrees collapse onto one node.

use std::fmt;

use crate::normalize::{NumberRepr, StringRepr};

/// Run-scoped reference to one declaration.
///
/// Handles are allocated in emission order and never reused within a run.
/// They mean nothing outside the run that produced them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(u32);

impl Handle {
    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Kind of a compiled value, used for naming and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

/// One deduplicated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(NumberRepr),
    String(StringRepr),
    /// Element handles in document order.
    Array(Vec<Handle>),
    /// `(key string handle, value handle)` pairs sorted by key bytes.
    Object(Vec<(Handle, Handle)>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

/// Arena of compiled values produced by one run.
#[derive(Debug, Clone, Default)]
pub struct ValueGraph {
    nodes: Vec<Value>,
}

impl ValueGraph {
    pub(crate) fn push(&mut self, value: Value) -> Handle {
        let handle = Handle::new(self.nodes.len() as u32);
        self.nodes.push(value);
        handle
    }

    /// Get a value by handle. Panics on a handle from another run.
    pub fn get(&self, handle: Handle) -> &Value {
        &self.nodes[handle.index()]
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Values with their handles, in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Value)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, v)| (Handle::new(i as u32), v))
    }

    /// Text of a string node, if `handle` refers to one.
    pub fn string(&self, handle: Handle) -> Option<&str> {
        match self.get(handle) {
            Value::String(s) => Some(&s.text),
            _ => None,
        }
    }

    /// Look up an object member by key text.
    pub fn member(&self, object: Handle, key: &str) -> Option<Handle> {
        let Value::Object(entries) = self.get(object) else {
            return None;
        };
        entries
            .binary_search_by(|(k, _)| {
                self.string(*k)
                    .unwrap_or_default()
                    .as_bytes()
                    .cmp(key.as_bytes())
            })
            .ok()
            .map(|i| entries[i].1)
    }
}
