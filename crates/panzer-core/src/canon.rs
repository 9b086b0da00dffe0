//! Post-order canonicalization of a [`Document`] into the value graph.
//!
//! Children are resolved to handles before their parent's signature is
//! built, so equal subtrees anywhere in the document produce equal
//! signatures and share one declaration.

use crate::document::{Document, NodePath};
use crate::emitter::DeclarationEmitter;
use crate::error::{CompileError, Result};
use crate::normalize::{normalize_number, normalize_string, RangeAdjustment, StringRepr};
use crate::options::CompileOptions;
use crate::pool::{InternKey, InternPoolSet};
use crate::report::{AdjustedNumber, CompileReport, KindCounts};
use crate::value::{Handle, Value};
use crate::CompiledDocument;

/// State of one compilation run. Created fresh per run and consumed by
/// [`Compiler::finish`]; nothing outlives the run.
pub(crate) struct Compiler<'a> {
    options: &'a CompileOptions,
    pools: InternPoolSet,
    emitter: DeclarationEmitter,
    path: NodePath,
    report: CompileReport,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            pools: InternPoolSet::default(),
            emitter: DeclarationEmitter::new(options),
            path: NodePath::default(),
            report: CompileReport::default(),
        }
    }

    /// Resolve `node` to the handle of its canonical declaration.
    pub(crate) fn resolve(&mut self, node: &Document) -> Result<Handle> {
        self.report.nodes_visited += 1;
        match node {
            Document::Null => Ok(self.intern(InternKey::Null, || Value::Null)),
            Document::Bool(b) => Ok(self.intern(InternKey::Bool(*b), || Value::Bool(*b))),
            Document::Number(raw) => self.resolve_number(raw),
            Document::String(bytes) => {
                let repr = self.normalize_str(bytes)?;
                Ok(self.intern_string(repr))
            }
            Document::Array(items) => self.resolve_array(items),
            Document::Object(members) => self.resolve_object(members),
        }
    }

    fn resolve_number(&mut self, raw: &str) -> Result<Handle> {
        let repr = normalize_number(raw, self.options.include_number_source_text).ok_or_else(
            || CompileError::MalformedNumber {
                path: self.path.pointer(),
                literal: raw.to_string(),
            },
        )?;
        for &adjustment in &repr.adjustments {
            self.record_adjustment(raw, adjustment);
        }
        let key = InternKey::Number(repr.intern_key());
        Ok(self.intern(key, || Value::Number(repr)))
    }

    /// Elements keep document order; only their handles enter the signature.
    fn resolve_array(&mut self, items: &[Document]) -> Result<Handle> {
        let mut elements = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            self.path.push_index(i);
            elements.push(self.resolve(item)?);
            self.path.pop();
        }
        Ok(self.intern(InternKey::Array(elements.clone()), || {
            Value::Array(elements)
        }))
    }

    fn resolve_object(&mut self, members: &[(Vec<u8>, Document)]) -> Result<Handle> {
        let members = canonical_members(members);
        let mut entries = Vec::with_capacity(members.len());
        let mut signature = Vec::with_capacity(members.len());
        for (key, value) in members {
            self.path.push_key(key);
            let key_repr = self.normalize_str(key)?;
            let key_text = key_repr.text.clone();
            let key_handle = self.intern_string(key_repr);
            let value_handle = self.resolve(value)?;
            self.path.pop();
            entries.push((key_handle, value_handle));
            signature.push((key_text, value_handle));
        }
        Ok(self.intern(InternKey::Object(signature), || Value::Object(entries)))
    }

    fn normalize_str(&self, bytes: &[u8]) -> Result<StringRepr> {
        normalize_string(bytes).map_err(|source| CompileError::InvalidUtf8 {
            path: self.path.pointer(),
            source,
        })
    }

    fn intern_string(&mut self, repr: StringRepr) -> Handle {
        let key = InternKey::String(repr.text.clone());
        self.intern(key, || Value::String(repr))
    }

    /// Look up `key`; on a miss, declare the value built by `value`.
    fn intern(&mut self, key: InternKey, value: impl FnOnce() -> Value) -> Handle {
        self.pools
            .get_or_create(key, &mut self.emitter, |emitter, handle| {
                emitter.declare(handle, value());
            })
    }

    fn record_adjustment(&mut self, literal: &str, adjustment: RangeAdjustment) {
        let path = self.path.pointer();
        if adjustment.is_out_of_range() {
            tracing::warn!(path = %path, literal, %adjustment, "number outside representable range");
        } else {
            tracing::debug!(path = %path, literal, %adjustment, "number projection adjusted");
        }
        self.report.adjustments.push(AdjustedNumber {
            path,
            literal: literal.to_string(),
            adjustment,
        });
    }

    /// Bind the root, render the artifacts and freeze the run.
    pub(crate) fn finish(self, root: Handle) -> CompiledDocument {
        let Compiler {
            options,
            pools,
            emitter,
            mut report,
            ..
        } = self;
        let emitted = emitter.finish(root, options);

        report.distinct = KindCounts::from_graph(&emitted.graph);
        report.emitted_declarations = emitted.emitted_declarations;
        report.dedup_hits = pools.dedup_hits();
        debug_assert_eq!(pools.len(), emitted.graph.len());

        CompiledDocument {
            declarations: emitted.declarations,
            definitions: emitted.definitions,
            root,
            graph: emitted.graph,
            report,
        }
    }
}

/// Sort members by key bytes and collapse duplicate keys, keeping the last
/// occurrence in source order.
fn canonical_members(members: &[(Vec<u8>, Document)]) -> Vec<&(Vec<u8>, Document)> {
    let mut sorted: Vec<&(Vec<u8>, Document)> = members.iter().collect();
    // Stable: equal keys stay in source order.
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out: Vec<&(Vec<u8>, Document)> = Vec::with_capacity(sorted.len());
    for member in sorted {
        match out.last_mut() {
            Some(last) if last.0 == member.0 => *last = member,
            _ => out.push(member),
        }
    }
    out
}
