//! Error types for document compilation.

use thiserror::Error;

/// Errors that abort a compilation run.
///
/// Every variant except `JsonParse` is a data error: the document holds
/// content the generator cannot express. Numeric range problems are not
/// errors; they are recorded as [`crate::RangeAdjustment`]s instead.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The input string was not valid JSON (convenience entry point only).
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A string or object key was not valid UTF-8.
    /// `path` is a JSON pointer to the offending node.
    #[error("invalid UTF-8 at {path}: {source}")]
    InvalidUtf8 {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    /// A number node whose text is not a JSON number literal.
    #[error("malformed number literal at {path}: {literal:?}")]
    MalformedNumber { path: String, literal: String },
}

/// Convenience alias used throughout panzer-core.
pub type Result<T> = std::result::Result<T, CompileError>;
