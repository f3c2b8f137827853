//! FILENAME: crosstab-engine/src/view.rs
//! Report View - The JSON-serializable output structure.
//!
//! This module holds the finished report the presentation layer consumes:
//! per-sheet entity columns, sorted category rows, the zero-filled value
//! matrix, recomputed totals and formatted remark blocks. Numeric fields
//! are raw; decimal-place formatting belongs downstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rows::KeyValue;

// ============================================================================
// ENTITY COLUMNS
// ============================================================================

/// One registered entity: identity, display name, and the passthrough
/// metric fields captured from its metrics rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityColumn {
    pub id: KeyValue,

    pub name: String,

    /// Numeric fields from the metrics rows not consumed by a binding,
    /// keyed by field name. Display-only passthrough: an externally
    /// supplied total lands here untouched and is never consulted when
    /// totals are computed.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

// ============================================================================
// SHEETS
// ============================================================================

/// One independent sub-report partition.
///
/// The matrix is a fixed-shape table indexed through the category and
/// entity lists rather than a nested map, which makes "every cell exists"
/// a structural property instead of a bookkeeping obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub label: String,

    /// Registered entities in first-occurrence order; one column each.
    pub entities: Vec<EntityColumn>,

    /// Discovered category labels in ordinal sort order; one matrix row
    /// each.
    pub categories: Vec<String>,

    /// Row-major value matrix: `values[category][entity]`. Every cell is
    /// present, zero when unobserved.
    pub values: Vec<Vec<f64>>,

    /// Per-entity column sums over all category rows, aligned with
    /// `entities`.
    pub totals: Vec<f64>,

    /// Per-entity formatted remark blocks, aligned with `entities`. An
    /// entity with no remarks has an empty string here.
    pub remarks: Vec<String>,
}

impl Sheet {
    pub fn entity_index(&self, id: &KeyValue) -> Option<usize> {
        self.entities.iter().position(|entity| &entity.id == id)
    }

    pub fn category_index(&self, label: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == label)
    }

    /// Mapping-style matrix lookup by labels instead of indexes.
    pub fn value(&self, category: &str, id: &KeyValue) -> Option<f64> {
        let row = self.category_index(category)?;
        let col = self.entity_index(id)?;
        Some(self.values[row][col])
    }

    pub fn total(&self, id: &KeyValue) -> Option<f64> {
        Some(self.totals[self.entity_index(id)?])
    }

    pub fn remarks_for(&self, id: &KeyValue) -> Option<&str> {
        Some(self.remarks[self.entity_index(id)?].as_str())
    }
}

// ============================================================================
// BUILD STATISTICS
// ============================================================================

/// Statistics about one build, for logging and data-quality diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub metrics_rows: usize,
    pub detail_rows: usize,
    pub annotation_rows: usize,

    /// Metrics rows skipped because they carried no entity id.
    pub skipped_metrics_rows: usize,

    /// Detail rows excluded by sheet routing, entity resolution or a null
    /// category label.
    pub dropped_detail_rows: usize,

    /// Annotation rows excluded by sheet routing or entity resolution.
    pub dropped_annotation_rows: usize,

    /// Detail/annotation rows attributed by display name because they
    /// carried no entity id.
    pub name_fallback_resolutions: usize,

    /// Name-fallback resolutions where more than one registered entity
    /// shared the display name. The first-registered entity won.
    pub ambiguous_name_matches: usize,

    pub sheet_count: usize,
    pub build_time_ms: u64,
}

// ============================================================================
// REPORT
// ============================================================================

/// The finished report: ordered sheets plus build statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub name: Option<String>,

    pub sheets: Vec<Sheet>,

    pub stats: BuildStats,
}

impl Report {
    pub fn sheet(&self, label: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.label == label)
    }
}
