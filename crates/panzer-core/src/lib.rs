//! # panzer-core
//!
//! Compiles a JSON document into deduplicated `constexpr` C++ declarations
//! for the PanzerJson runtime, so a program can read the document with no
//! parsing at startup.
//!
//! The pipeline is a single post-order pass: scalars are normalized,
//! containers are canonicalized from their already-resolved children, and
//! each value is looked up in a content-addressed pool before anything is
//! emitted. Equal values anywhere in the document share one declaration.
//!
//! ## Quick start
//!
//! ```rust
//! use panzer_core::{compile_str, CompileOptions};
//!
//! let out = compile_str(r#"{"b":[1,1],"a":"x"}"#, &CompileOptions::default()).unwrap();
//! assert!(out.declarations.contains("extern const PanzerJson::ValueBase& json_root;"));
//! assert!(out.definitions.contains("const PanzerJson::ValueBase& json_root="));
//! // Both `1`s share a declaration.
//! assert_eq!(out.report.distinct.number, 1);
//! ```
//!
//! ## Modules
//!
//! - [`document`] — input tree handed over by an external parser
//! - [`normalize`] — number range projection and string escaping
//! - [`value`] — the compiled value graph and its handles
//! - [`options`] — run configuration
//! - [`report`] — statistics and the range-adjustment audit trail
//! - [`error`] — data errors that abort a run

mod canon;
pub mod document;
mod emitter;
pub mod error;
pub mod normalize;
pub mod options;
mod pool;
pub mod report;
pub mod value;

pub use document::Document;
pub use error::{CompileError, Result};
pub use normalize::{escape_string, NumberRepr, RangeAdjustment, StringRepr};
pub use options::CompileOptions;
pub use report::{AdjustedNumber, CompileReport, KindCounts};
pub use value::{Handle, Value, ValueGraph, ValueKind};

use canon::Compiler;

/// Output of one compilation run.
#[derive(Debug)]
pub struct CompiledDocument {
    /// Header artifact: the `extern` root reference.
    pub declarations: String,
    /// Source artifact: every pool declaration plus the root binding.
    pub definitions: String,
    /// Handle bound to the root name.
    pub root: Handle,
    pub graph: ValueGraph,
    pub report: CompileReport,
}

/// Compile a parsed document.
///
/// A run is all-or-nothing: on a data error no artifacts are produced.
pub fn compile(document: &Document, options: &CompileOptions) -> Result<CompiledDocument> {
    tracing::debug!(
        pack_strings = options.pack_strings,
        number_text = options.include_number_source_text,
        root = %options.root_name,
        "compiling document"
    );
    let mut compiler = Compiler::new(options);
    let root = compiler.resolve(document)?;
    let compiled = compiler.finish(root);
    tracing::debug!(
        nodes = compiled.report.nodes_visited,
        distinct = compiled.report.distinct.total(),
        declarations = compiled.report.emitted_declarations,
        adjustments = compiled.report.adjustments.len(),
        "document compiled"
    );
    Ok(compiled)
}

/// Parse `json` with `serde_json` and compile it.
pub fn compile_str(json: &str, options: &CompileOptions) -> Result<CompiledDocument> {
    let document = Document::from_json_str(json)?;
    compile(&document, options)
}
