//! Per-run statistics and the audit trail of adjusted number projections.

use serde::Serialize;

use crate::normalize::RangeAdjustment;
use crate::value::{ValueGraph, ValueKind};

/// Distinct values per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub null: usize,
    pub bool: usize,
    pub number: usize,
    pub string: usize,
    pub array: usize,
    pub object: usize,
}

impl KindCounts {
    pub(crate) fn from_graph(graph: &ValueGraph) -> Self {
        let mut counts = Self::default();
        for (_, value) in graph.iter() {
            match value.kind() {
                ValueKind::Null => counts.null += 1,
                ValueKind::Bool => counts.bool += 1,
                ValueKind::Number => counts.number += 1,
                ValueKind::String => counts.string += 1,
                ValueKind::Array => counts.array += 1,
                ValueKind::Object => counts.object += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.null + self.bool + self.number + self.string + self.array + self.object
    }
}

/// One adjustment applied to a number by the range policy. Recorded for
/// every occurrence, including ones that hit the pool; a number with two
/// adjustments appears twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedNumber {
    /// JSON pointer to the node.
    pub path: String,
    pub literal: String,
    pub adjustment: RangeAdjustment,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    /// Document nodes visited, object keys excluded.
    pub nodes_visited: usize,
    /// Distinct values, one per handle.
    pub distinct: KindCounts,
    /// Top-level constant declarations written. With string packing all
    /// strings count as one.
    pub emitted_declarations: usize,
    /// Pool lookups answered by an existing handle, object keys included.
    pub dedup_hits: usize,
    pub adjustments: Vec<AdjustedNumber>,
}

impl CompileReport {
    /// Fraction of visited nodes that did not need their own declaration.
    pub fn dedup_ratio(&self) -> f64 {
        if self.nodes_visited == 0 {
            return 0.0;
        }
        let distinct = self.distinct.total().min(self.nodes_visited);
        1.0 - distinct as f64 / self.nodes_visited as f64
    }
}
