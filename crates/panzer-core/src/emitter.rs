//! C++ declaration emitter for the PanzerJson runtime layout.
//!
//! The emitter owns the output stream, the handle counter and the value
//! arena. Declarations are appended in handle order, and a handle is only
//! allocated after all of its children are declared, so every declaration
//! precedes everything that references it.
//!
//! Generated shapes, for handle `n`:
//!
//! ```text
//! constexpr const NullValue null_value_n{};
//! constexpr const BoolValue bool_value_n( true );
//! constexpr const NumberValue number_value_n( 42, 42.0 );
//! constexpr const NumberValueWithStringStorage<3> number_value_n{ NumberValue( 42, 42.0, true ), "42" };
//! constexpr const StringValueWithStorage<4> string_value_n{ StringValue(), "abc" };
//! constexpr const ArrayValueWithElementsStorage<2> array_value_n
//! {
//!     ArrayValue( 2u ),
//!     {
//!         &number_value_0,
//!         &string_value_1.value,
//!     },
//! };
//! ```
//!
//! Objects follow the array shape with `{ key_chars, &value }` entries. Empty
//! containers are emitted as bare `ArrayValue( 0u )` / `ObjectValue( 0u )`.

use crate::normalize::{escape_string, NumberRepr, StringRepr};
use crate::options::CompileOptions;
use crate::value::{Handle, Value, ValueGraph, ValueKind};

const BANNER: &str = "// Generated by panzer-gen. Do not edit.\n";
const PACKED_STRINGS_TYPE: &str = "PackedStrings";
const PACKED_STRINGS: &str = "packed_strings";

/// Supplies fresh handles. Never reused, never decremented.
#[derive(Debug, Default)]
pub(crate) struct EmissionCounter {
    next: u32,
}

impl EmissionCounter {
    fn fresh(&mut self) -> Handle {
        let handle = Handle::new(self.next);
        self.next += 1;
        handle
    }
}

/// The two text artifacts of a run plus the value arena behind them.
#[derive(Debug)]
pub(crate) struct Emitted {
    pub(crate) declarations: String,
    pub(crate) definitions: String,
    pub(crate) graph: ValueGraph,
    pub(crate) emitted_declarations: usize,
}

#[derive(Debug)]
pub(crate) struct DeclarationEmitter {
    counter: EmissionCounter,
    graph: ValueGraph,
    out: String,
    pack_strings: bool,
    /// String handles deferred into the aggregate block.
    packed: Vec<Handle>,
    emitted: usize,
}

impl DeclarationEmitter {
    pub(crate) fn new(options: &CompileOptions) -> Self {
        Self {
            counter: EmissionCounter::default(),
            graph: ValueGraph::default(),
            out: String::new(),
            pack_strings: options.pack_strings,
            packed: Vec::new(),
            emitted: 0,
        }
    }

    pub(crate) fn fresh_handle(&mut self) -> Handle {
        self.counter.fresh()
    }

    /// Append the declaration for `value` under `handle`.
    ///
    /// Handles must be declared in the order they were allocated, and all
    /// handles referenced by `value` must already be declared.
    pub(crate) fn declare(&mut self, handle: Handle, value: Value) {
        let name = symbol(value.kind(), handle);
        match &value {
            Value::String(_) if self.pack_strings => self.packed.push(handle),
            Value::Null => self.write(format!("constexpr const NullValue {name}{{}};\n\n")),
            Value::Bool(b) => self.write(format!("constexpr const BoolValue {name}( {b} );\n\n")),
            Value::Number(n) => self.write(number_declaration(&name, n)),
            Value::String(s) => self.write(format!(
                "constexpr const StringValueWithStorage<{}> {name}{{ {} }};\n\n",
                s.byte_len(),
                string_initializer(s)
            )),
            Value::Array(elements) => {
                let text = self.array_declaration(&name, elements);
                self.write(text);
            }
            Value::Object(entries) => {
                let text = self.object_declaration(&name, entries);
                self.write(text);
            }
        }
        let pushed = self.graph.push(value);
        debug_assert_eq!(pushed, handle, "declarations must follow allocation order");
    }

    fn write(&mut self, declaration: String) {
        self.out.push_str(&declaration);
        self.emitted += 1;
    }

    /// Qualified name of the constant holding `handle`.
    fn path(&self, handle: Handle) -> String {
        let kind = self.graph.get(handle).kind();
        if kind == ValueKind::String && self.pack_strings {
            format!("{PACKED_STRINGS}.{}", symbol(kind, handle))
        } else {
            symbol(kind, handle)
        }
    }

    /// Expression naming the `ValueBase` object of `handle`.
    fn reference(&self, handle: Handle) -> String {
        let wrapped = match self.graph.get(handle) {
            Value::Null | Value::Bool(_) => false,
            Value::Number(n) => n.source_text.is_some(),
            Value::String(_) => true,
            Value::Array(items) => !items.is_empty(),
            Value::Object(entries) => !entries.is_empty(),
        };
        let path = self.path(handle);
        if wrapped {
            format!("{path}.value")
        } else {
            path
        }
    }

    fn array_declaration(&self, name: &str, elements: &[Handle]) -> String {
        let len = elements.len();
        if len == 0 {
            return format!("constexpr const ArrayValue {name}( 0u );\n\n");
        }
        let mut out = format!(
            "constexpr const ArrayValueWithElementsStorage<{len}> {name}\n{{\n\tArrayValue( {len}u ),\n\t{{\n"
        );
        for &element in elements {
            out.push_str(&format!("\t\t&{},\n", self.reference(element)));
        }
        out.push_str("\t},\n};\n\n");
        out
    }

    fn object_declaration(&self, name: &str, entries: &[(Handle, Handle)]) -> String {
        let len = entries.len();
        if len == 0 {
            return format!("constexpr const ObjectValue {name}( 0u );\n\n");
        }
        let mut out = format!(
            "constexpr const ObjectValueWithEntriesStorage<{len}> {name}\n{{\n\tObjectValue( {len}u ),\n\t{{\n"
        );
        for &(key, value) in entries {
            out.push_str(&format!(
                "\t\t{{ {}.string, &{} }},\n",
                self.path(key),
                self.reference(value)
            ));
        }
        out.push_str("\t},\n};\n\n");
        out
    }

    /// The aggregate string block, or an empty string when nothing was packed.
    fn packed_block(&self) -> String {
        if self.packed.is_empty() {
            return String::new();
        }
        let mut fields = format!("struct {PACKED_STRINGS_TYPE}\n{{\n");
        let mut values = format!("constexpr const {PACKED_STRINGS_TYPE} {PACKED_STRINGS}\n{{\n");
        for &handle in &self.packed {
            if let Value::String(s) = self.graph.get(handle) {
                fields.push_str(&format!(
                    "\tStringValueWithStorage<{}> {};\n",
                    s.byte_len(),
                    symbol(ValueKind::String, handle)
                ));
                values.push_str(&format!("\t{{ {} }},\n", string_initializer(s)));
            }
        }
        fields.push_str("};\n\n");
        values.push_str("};\n\n");
        fields + &values
    }

    /// Bind `root` and render both artifacts. Consumes the emitter; nothing
    /// can be declared after the root binding.
    pub(crate) fn finish(mut self, root: Handle, options: &CompileOptions) -> Emitted {
        let packed = self.packed_block();
        if !packed.is_empty() {
            self.emitted += 1;
        }
        let root_ref = self.reference(root);
        let root_name = &options.root_name;

        let mut declarations = format!(
            "{BANNER}#pragma once\n\n#include <{}>\n\n",
            options.runtime_include
        );
        declarations.push_str(&in_namespace(
            options.namespace.as_deref(),
            &format!("extern const PanzerJson::ValueBase& {root_name};\n"),
        ));

        let mut definitions = format!("{BANNER}\n#include \"{}\"\n\n", options.header_name);
        definitions.push_str("namespace\n{\n\nusing namespace PanzerJson;\n\n");
        definitions.push_str(&packed);
        definitions.push_str(&self.out);
        definitions.push_str("} // namespace\n\n");
        definitions.push_str(&in_namespace(
            options.namespace.as_deref(),
            &format!("const PanzerJson::ValueBase& {root_name}= {root_ref};\n"),
        ));

        Emitted {
            declarations,
            definitions,
            graph: self.graph,
            emitted_declarations: self.emitted,
        }
    }
}

/// Unqualified constant name for `handle`, e.g. `string_value_7`.
fn symbol(kind: ValueKind, handle: Handle) -> String {
    let prefix = match kind {
        ValueKind::Null => "null",
        ValueKind::Bool => "bool",
        ValueKind::Number => "number",
        ValueKind::String => "string",
        ValueKind::Array => "array",
        ValueKind::Object => "object",
    };
    format!("{prefix}_value_{}", handle.raw())
}

fn string_initializer(s: &StringRepr) -> String {
    format!("StringValue(), \"{}\"", s.escaped)
}

fn number_declaration(name: &str, n: &NumberRepr) -> String {
    match &n.source_text {
        Some(text) => format!(
            "constexpr const NumberValueWithStringStorage<{}> {name}{{ NumberValue( {}, {}, true ), \"{}\" }};\n\n",
            text.len() + 1,
            n.int_literal(),
            n.double_literal(),
            escape_string(text)
        ),
        None => format!(
            "constexpr const NumberValue {name}( {}, {} );\n\n",
            n.int_literal(),
            n.double_literal()
        ),
    }
}

/// Wrap `body` in `namespace ns { ... }` when a namespace is configured.
fn in_namespace(namespace: Option<&str>, body: &str) -> String {
    match namespace {
        Some(ns) => format!("namespace {ns}\n{{\n\n{body}\n}} // namespace {ns}\n"),
        None => body.to_string(),
    }
}
