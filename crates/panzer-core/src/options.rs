//! Compilation options.

use serde::{Deserialize, Serialize};

/// Options for one compilation run.
///
/// Identifiers (`root_name`, `namespace`, `header_name`, `runtime_include`)
/// are written into the generated C++ verbatim and are not validated.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use panzer_core::CompileOptions;
/// let opts: CompileOptions = serde_json::from_str(r#"{"pack_strings": true}"#).unwrap();
/// assert!(opts.pack_strings);
/// assert_eq!(opts.root_name, "json_root");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Keep each number's original literal text next to its projections.
    /// Costs one extra string per distinct number.
    pub include_number_source_text: bool,
    /// Emit all distinct strings as fields of a single aggregate constant.
    pub pack_strings: bool,
    /// Name of the externally visible root reference.
    pub root_name: String,
    /// Namespace wrapping the root reference. `None` places it at global scope.
    pub namespace: Option<String>,
    /// Path used in the definitions artifact's `#include "..."` line.
    pub header_name: String,
    /// Runtime header included by the declarations artifact, `<...>` form.
    pub runtime_include: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            include_number_source_text: false,
            pack_strings: false,
            root_name: "json_root".to_string(),
            namespace: None,
            header_name: "json_root.hpp".to_string(),
            runtime_include: "PanzerJson/value.hpp".to_string(),
        }
    }
}
