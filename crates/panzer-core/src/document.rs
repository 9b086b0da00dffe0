//! Input tree handed to the compiler by an external parser.
//!
//! `Document` mirrors JSON but keeps strings and keys as raw bytes and numbers
//! as their literal text. Producers other than `serde_json` can therefore hand
//! over content without validating it first; the compiler checks UTF-8 and
//! number grammar itself and reports failures as data errors.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;

use crate::error::Result;

/// A parsed hierarchical value.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    /// Original numeric literal text, e.g. `"-12.5e3"`.
    Number(String),
    /// String content, expected to be UTF-8.
    String(Vec<u8>),
    Array(Vec<Document>),
    /// Members in source order. Duplicate keys are allowed here; the last
    /// occurrence wins during compilation.
    Object(Vec<(Vec<u8>, Document)>),
}

impl Document {
    /// Parse a JSON string into a `Document`.
    ///
    /// Number leaves keep their literal text exactly as written, and object
    /// members keep duplicate keys in source order.
    ///
    /// ```
    /// use panzer_core::Document;
    /// let doc = Document::from_json_str(r#"{"n": 1.50, "e": 1E5}"#).unwrap();
    /// assert_eq!(
    ///     doc,
    ///     Document::object([("n", Document::number("1.50")), ("e", Document::number("1E5"))])
    /// );
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: &RawValue = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw)?)
    }

    /// Convert one validated JSON value, dispatching on its first byte.
    fn from_raw(raw: &RawValue) -> serde_json::Result<Self> {
        let text = raw.get();
        Ok(match text.as_bytes().first() {
            Some(b'n') => Document::Null,
            Some(b't' | b'f') => Document::Bool(serde_json::from_str(text)?),
            Some(b'"') => Document::String(serde_json::from_str::<String>(text)?.into_bytes()),
            Some(b'[') => {
                let items: Vec<&RawValue> = serde_json::from_str(text)?;
                Document::Array(
                    items
                        .into_iter()
                        .map(Self::from_raw)
                        .collect::<serde_json::Result<_>>()?,
                )
            }
            Some(b'{') => {
                let RawMembers(members) = serde_json::from_str(text)?;
                Document::Object(
                    members
                        .into_iter()
                        .map(|(k, v)| Ok((k.into_bytes(), Self::from_raw(v)?)))
                        .collect::<serde_json::Result<_>>()?,
                )
            }
            _ => Document::Number(text.to_string()),
        })
    }

    /// Shorthand for a string node.
    pub fn string(s: impl Into<String>) -> Self {
        Document::String(s.into().into_bytes())
    }

    /// Shorthand for a number node from its literal text.
    pub fn number(literal: impl Into<String>) -> Self {
        Document::Number(literal.into())
    }

    /// Shorthand for an object node built from `(key, value)` pairs.
    pub fn object<K: Into<String>>(members: impl IntoIterator<Item = (K, Document)>) -> Self {
        Document::Object(
            members
                .into_iter()
                .map(|(k, v)| (k.into().into_bytes(), v))
                .collect(),
        )
    }

    /// Total number of nodes in the tree, including this one.
    pub fn node_count(&self) -> usize {
        match self {
            Document::Array(items) => 1 + items.iter().map(Document::node_count).sum::<usize>(),
            Document::Object(members) => {
                1 + members.iter().map(|(_, v)| v.node_count()).sum::<usize>()
            }
            _ => 1,
        }
    }
}

/// Object members with their values left unparsed. Unlike
/// `serde_json::Map`, duplicate keys are kept.
struct RawMembers<'a>(Vec<(String, &'a RawValue)>);

impl<'de> Deserialize<'de> for RawMembers<'de> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MembersVisitor;

        impl<'de> Visitor<'de> for MembersVisitor {
            type Value = RawMembers<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut members = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(member) = map.next_entry::<String, &'de RawValue>()? {
                    members.push(member);
                }
                Ok(RawMembers(members))
            }
        }

        deserializer.deserialize_map(MembersVisitor)
    }
}

/// Numbers take `serde_json`'s rendering of the literal, which may differ
/// from the source text (`1E5` becomes `1e+5`). Use
/// [`Document::from_json_str`] when the literal text matters.
impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => Document::Number(n.to_string()),
            Value::String(s) => Document::String(s.into_bytes()),
            Value::Array(items) => Document::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => Document::Object(
                map.into_iter()
                    .map(|(k, v)| (k.into_bytes(), v.into()))
                    .collect(),
            ),
        }
    }
}

/// One step of a JSON pointer.
#[derive(Debug, Clone)]
pub(crate) enum PathSegment {
    Index(usize),
    Key(String),
}

/// Location of the node currently being compiled, for diagnostics.
#[derive(Debug, Default)]
pub(crate) struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    pub(crate) fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub(crate) fn push_key(&mut self, key: &[u8]) {
        self.segments
            .push(PathSegment::Key(String::from_utf8_lossy(key).into_owned()));
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    /// Render as an RFC 6901 JSON pointer (`""` for the root).
    pub(crate) fn pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                PathSegment::Index(i) => out.push_str(&i.to_string()),
                PathSegment::Key(k) => out.push_str(&k.replace('~', "~0").replace('/', "~1")),
            }
        }
        out
    }
}
