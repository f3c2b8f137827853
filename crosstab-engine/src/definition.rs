//! FILENAME: crosstab-engine/src/definition.rs
//! Report Definition - The serializable configuration.
//!
//! This module contains the types that DESCRIBE a cross-tabulation report.
//! A definition names the input fields that carry entity identity, sheet
//! grouping, category labels, numeric values and remark data, plus the
//! report-level options. The two shipped stoppage reports are plain
//! definition values over the same builder, so flavors can live in
//! configuration and be sent across process boundaries.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::rows::RowSetKind;

// ============================================================================
// FIELD BINDINGS
// ============================================================================

/// Field bindings for the metrics rows. Entity identity, display order and
/// sheet membership are all established from these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsBinding {
    /// Field carrying the entity identifier.
    pub entity_id: String,

    /// Field carrying the entity display name.
    pub entity_name: String,

    /// Field carrying the sheet-grouping value. None for single-sheet
    /// flavors.
    #[serde(default)]
    pub group: Option<String>,

    /// Field carrying a display label for the grouping value. When absent
    /// the sheet label is the grouping value rendered as text.
    #[serde(default)]
    pub group_label: Option<String>,
}

/// Field bindings for the category-detail rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailBinding {
    /// Field carrying the entity identifier, when the upstream query
    /// provides one.
    #[serde(default)]
    pub entity_id: Option<String>,

    /// Field carrying the entity display name, used for exact-name
    /// resolution when no identifier is present.
    #[serde(default)]
    pub entity_name: Option<String>,

    /// Field carrying the sheet-grouping value.
    #[serde(default)]
    pub group: Option<String>,

    /// Field carrying the category label (the matrix row label).
    pub category: String,

    /// Field carrying the numeric value summed into the matrix.
    pub value: String,
}

/// Field bindings for the annotation rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationBinding {
    #[serde(default)]
    pub entity_id: Option<String>,

    #[serde(default)]
    pub entity_name: Option<String>,

    #[serde(default)]
    pub group: Option<String>,

    /// Field carrying the free-text remark.
    pub remark: String,

    /// Field carrying the source tag that distinguishes time-windowed
    /// annotations from plain remarks.
    #[serde(default)]
    pub source: Option<String>,

    /// Field carrying the window start time.
    #[serde(default)]
    pub start_time: Option<String>,

    /// Field carrying the window end time.
    #[serde(default)]
    pub end_time: Option<String>,

    /// Field carrying the window duration in hours.
    #[serde(default)]
    pub duration_hours: Option<String>,
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete, serializable definition of one report flavor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// User-friendly name for this report flavor.
    #[serde(default)]
    pub name: Option<String>,

    pub metrics: MetricsBinding,

    pub details: DetailBinding,

    pub annotations: AnnotationBinding,

    /// Source-tag value that marks an annotation as time-windowed. Rows
    /// whose source field equals this value get the "time .. to .." prefix
    /// treatment.
    #[serde(default)]
    pub time_window_tag: Option<String>,

    /// Label of the sheet that collects metrics rows with a null grouping
    /// value when grouping is engaged.
    #[serde(default = "default_unknown_sheet_label")]
    pub unknown_sheet_label: String,
}

fn default_unknown_sheet_label() -> String {
    "Unknown".to_string()
}

impl ReportDefinition {
    /// Whether this flavor binds a sheet-grouping field at all. Whether
    /// grouping actually engages also depends on the data; see the builder.
    pub fn grouping_bound(&self) -> bool {
        self.metrics.group.is_some()
    }

    /// Checks that every required binding names a field. Optional bindings
    /// may be None; required ones must be non-blank.
    pub fn validate(&self) -> Result<(), BuildError> {
        fn require(
            field: &str,
            kind: RowSetKind,
            role: &'static str,
        ) -> Result<(), BuildError> {
            if field.trim().is_empty() {
                Err(BuildError::MissingBinding {
                    collection: kind,
                    role,
                })
            } else {
                Ok(())
            }
        }

        require(&self.metrics.entity_id, RowSetKind::Metrics, "entity id")?;
        require(&self.metrics.entity_name, RowSetKind::Metrics, "entity name")?;
        require(&self.details.category, RowSetKind::Details, "category")?;
        require(&self.details.value, RowSetKind::Details, "value")?;
        require(&self.annotations.remark, RowSetKind::Annotations, "remark")?;
        Ok(())
    }

    /// The shift-wise stoppage report: one sheet per shift, plants as
    /// columns, stoppage reasons as rows.
    pub fn shift_stoppage() -> Self {
        ReportDefinition {
            name: Some("Shift Stoppage Report".to_string()),
            metrics: MetricsBinding {
                entity_id: "PlantId".to_string(),
                entity_name: "PlantName".to_string(),
                group: Some("ShiftName".to_string()),
                group_label: None,
            },
            details: DetailBinding {
                entity_id: Some("PlantId".to_string()),
                entity_name: Some("PlantName".to_string()),
                group: Some("ShiftName".to_string()),
                category: "Reason".to_string(),
                value: "Hrs".to_string(),
            },
            annotations: AnnotationBinding {
                entity_id: Some("PlantId".to_string()),
                entity_name: Some("PlantName".to_string()),
                group: Some("ShiftName".to_string()),
                remark: "Remark".to_string(),
                source: Some("Source".to_string()),
                start_time: Some("FromTime".to_string()),
                end_time: Some("ToTime".to_string()),
                duration_hours: Some("DurationHours".to_string()),
            },
            time_window_tag: Some("Stop".to_string()),
            unknown_sheet_label: default_unknown_sheet_label(),
        }
    }

    /// The cumulative stoppage report: a single sheet over the whole
    /// period, no shift partitioning.
    pub fn cumulative_stoppage() -> Self {
        let mut definition = Self::shift_stoppage();
        definition.name = Some("Cumulative Stoppage Report".to_string());
        definition.metrics.group = None;
        definition.metrics.group_label = None;
        definition.details.group = None;
        definition.annotations.group = None;
        definition
    }
}
