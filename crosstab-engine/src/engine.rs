//! FILENAME: crosstab-engine/src/engine.rs
//! Report Builder - The calculation core that turns flat rows into a report.
//!
//! This module takes a ReportDefinition (configuration) and RowSets (data)
//! and produces a Report (sheets ready for rendering).
//!
//! Algorithm:
//! 1. Partition metrics rows into sheets by the grouping value, first-seen order
//! 2. Register entity columns per sheet in first-occurrence order
//! 3. Route detail rows to their sheet, resolve entities, sum values into cells
//! 4. Route annotation rows, resolve entities, collect formatted remark lines
//! 5. Sort categories, lay out the zero-filled matrix, recompute column totals
//!
//! Sheet and entity order never rely on any ordering the data source may
//! have applied; both are re-derived here from observation order.

use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::definition::{MetricsBinding, ReportDefinition};
use crate::error::BuildError;
use crate::remarks::{window_prefix, RemarkWriter};
use crate::rows::{
    optional_numeric, required_numeric, FieldValue, KeyValue, Row, RowSetKind, RowSets,
};
use crate::view::{BuildStats, EntityColumn, Report, Sheet};

// ============================================================================
// SHEET ASSEMBLY STATE
// ============================================================================

/// Index entry for one registered display name: the column of the first
/// entity registered under the name, and how many entities share it.
struct NameSlot {
    column: usize,
    count: usize,
}

/// Per-sheet working state while the report is being built.
struct SheetBuild {
    label: String,

    entities: Vec<EntityColumn>,

    /// Entity id -> column index.
    entity_ids: FxHashMap<KeyValue, usize>,

    /// Display name -> first-registered column, for name-only resolution.
    entity_names: FxHashMap<String, NameSlot>,

    /// Category label -> discovery index. Matrix rows are re-sorted at the
    /// end; during ingestion cells are keyed by discovery index.
    category_ids: FxHashMap<String, usize>,
    categories: Vec<String>,

    /// (discovery category index, entity column) -> summed value.
    cells: FxHashMap<(usize, usize), f64>,

    /// Remark accumulation, aligned with `entities`.
    writers: Vec<RemarkWriter>,
}

impl SheetBuild {
    fn new(label: String) -> Self {
        SheetBuild {
            label,
            entities: Vec::new(),
            entity_ids: FxHashMap::default(),
            entity_names: FxHashMap::default(),
            category_ids: FxHashMap::default(),
            categories: Vec::new(),
            cells: FxHashMap::default(),
            writers: Vec::new(),
        }
    }

    /// Returns the column for an entity id, registering a new column on
    /// first sight. A repeated id never creates a second column.
    fn register_entity(&mut self, id: KeyValue, name: String) -> usize {
        if let Some(&column) = self.entity_ids.get(&id) {
            return column;
        }
        let column = self.entities.len();
        self.entity_ids.insert(id.clone(), column);
        self.entity_names
            .entry(name.clone())
            .and_modify(|slot| slot.count += 1)
            .or_insert(NameSlot { column, count: 1 });
        self.entities.push(EntityColumn {
            id,
            name,
            metrics: Default::default(),
        });
        self.writers.push(RemarkWriter::new());
        column
    }

    /// Resolves a detail/annotation row to a registered column: by id when
    /// the row carries one, otherwise by exact display-name equality. A row
    /// with an id that matches nothing is unresolved; the name is not
    /// consulted as a second chance.
    fn resolve(
        &self,
        row: &Row,
        id_field: Option<&str>,
        name_field: Option<&str>,
        stats: &mut BuildStats,
    ) -> Option<usize> {
        if let Some(field) = id_field {
            if let Some(id) = KeyValue::from_field(row.field(field)) {
                return self.entity_ids.get(&id).copied();
            }
        }
        let name_value = row.field(name_field?);
        if name_value.is_null() {
            return None;
        }
        let slot = self.entity_names.get(&name_value.display())?;
        stats.name_fallback_resolutions += 1;
        if slot.count > 1 {
            stats.ambiguous_name_matches += 1;
        }
        Some(slot.column)
    }

    /// Returns the discovery index for a category label, registering it on
    /// first sight.
    fn category_id(&mut self, label: String) -> usize {
        if let Some(&id) = self.category_ids.get(&label) {
            return id;
        }
        let id = self.categories.len();
        self.category_ids.insert(label.clone(), id);
        self.categories.push(label);
        id
    }

    /// Accumulates a value into a cell. Repeated contributions for the same
    /// (category, entity) pair sum, they never overwrite.
    fn add_value(&mut self, category: usize, column: usize, value: f64) {
        *self.cells.entry((category, column)).or_insert(0.0) += value;
    }

    /// Freezes the sheet: categories sorted, the matrix laid out dense and
    /// zero-filled, totals recomputed from the matrix cells.
    fn finish(self) -> Sheet {
        // Ordinal sort over discovery order, remapped through a permutation
        let mut order: Vec<usize> = (0..self.categories.len()).collect();
        order.sort_by(|&a, &b| self.categories[a].cmp(&self.categories[b]));
        let mut position = vec![0usize; order.len()];
        for (row, &discovery) in order.iter().enumerate() {
            position[discovery] = row;
        }

        let categories: Vec<String> =
            order.iter().map(|&i| self.categories[i].clone()).collect();

        let mut values = vec![vec![0.0; self.entities.len()]; categories.len()];
        for ((category, column), value) in self.cells {
            values[position[category]][column] = value;
        }

        let mut totals = vec![0.0; self.entities.len()];
        for row in &values {
            for (column, value) in row.iter().enumerate() {
                totals[column] += value;
            }
        }

        let remarks = self.writers.iter().map(RemarkWriter::finish).collect();

        Sheet {
            label: self.label,
            entities: self.entities,
            categories,
            values,
            totals,
            remarks,
        }
    }
}

// ============================================================================
// REPORT BUILDER
// ============================================================================

/// The main assembly state for one report build.
pub struct ReportBuilder<'a> {
    definition: &'a ReportDefinition,
    rows: &'a RowSets,

    sheets: Vec<SheetBuild>,

    /// Grouping key -> sheet index. The None key is the sheet collecting
    /// rows with a null grouping value.
    sheet_ids: FxHashMap<Option<KeyValue>, usize>,

    /// Whether grouping is engaged for this build: a grouping field is
    /// bound AND at least one metrics row carries a non-null value for it.
    grouped: bool,

    stats: BuildStats,
}

impl<'a> ReportBuilder<'a> {
    /// Creates a builder and decides grouping engagement from the data.
    pub fn new(definition: &'a ReportDefinition, rows: &'a RowSets) -> Self {
        let grouped = match definition.metrics.group.as_deref() {
            Some(field) => rows.metrics.iter().any(|row| !row.field(field).is_null()),
            None => false,
        };

        ReportBuilder {
            definition,
            rows,
            sheets: Vec::new(),
            sheet_ids: FxHashMap::default(),
            grouped,
            stats: BuildStats::default(),
        }
    }

    /// Executes the full build and returns the finished report.
    pub fn build(mut self) -> Result<Report, BuildError> {
        let rows = self.rows;

        // Step 1 + 2: partition metrics rows into sheets, register entities
        self.ingest_metrics(&rows.metrics);

        // Step 3: discover categories, sum detail values into cells
        self.ingest_details(&rows.details)?;

        // Step 4: collect formatted remark lines
        self.ingest_annotations(&rows.annotations);

        // Step 5: freeze the sheets into their final shape
        Ok(self.finish())
    }

    /// Partitions metrics rows into sheets and registers entity columns,
    /// plus capture of the passthrough metric fields.
    fn ingest_metrics(&mut self, rows: &[Row]) {
        let definition = self.definition;
        for row in rows {
            self.stats.metrics_rows += 1;
            let sheet_index = self.sheet_for_metrics(row);

            let Some(id) = KeyValue::from_field(row.field(&definition.metrics.entity_id))
            else {
                // No identity, no column
                self.stats.skipped_metrics_rows += 1;
                continue;
            };
            let name = row.field(&definition.metrics.entity_name).display();

            let sheet = &mut self.sheets[sheet_index];
            let column = sheet.register_entity(id, name);

            // Unbound numeric fields ride along for display, last write
            // wins across duplicate rows. Totals never read from here.
            let metrics = &mut sheet.entities[column].metrics;
            for (field, value) in row.iter() {
                if is_bound_metrics_field(&definition.metrics, field) {
                    continue;
                }
                if let Some(number) = value.numeric() {
                    metrics.insert(field.to_string(), number);
                }
            }
        }
    }

    /// Returns the sheet for a metrics row, creating it on first sight of
    /// its grouping value.
    fn sheet_for_metrics(&mut self, row: &Row) -> usize {
        let definition = self.definition;
        if !self.grouped {
            if self.sheets.is_empty() {
                self.sheet_ids.insert(None, 0);
                self.sheets.push(SheetBuild::new(String::new()));
            }
            return 0;
        }

        let binding = &definition.metrics;
        let key = binding
            .group
            .as_deref()
            .and_then(|field| KeyValue::from_field(row.field(field)));
        if let Some(&index) = self.sheet_ids.get(&key) {
            return index;
        }

        let label = match &key {
            None => definition.unknown_sheet_label.clone(),
            Some(value) => binding
                .group_label
                .as_deref()
                .map(|field| row.field(field))
                .filter(|label| !label.is_null())
                .map(|label| label.display())
                .unwrap_or_else(|| value.label()),
        };

        let index = self.sheets.len();
        self.sheet_ids.insert(key, index);
        self.sheets.push(SheetBuild::new(label));
        index
    }

    /// Routes a detail/annotation row to a sheet by its grouping value.
    /// None means the row belongs to no sheet and is excluded.
    fn route(&self, group_field: Option<&str>, row: &Row) -> Option<usize> {
        if !self.grouped {
            return if self.sheets.is_empty() { None } else { Some(0) };
        }
        let key = group_field.and_then(|field| KeyValue::from_field(row.field(field)));
        self.sheet_ids.get(&key).copied()
    }

    /// Discovers categories and sums detail values into matrix cells.
    ///
    /// Exclusion precedes coercion: a row that fails routing, resolution or
    /// the category check never has its value read, so it cannot fail the
    /// build.
    fn ingest_details(&mut self, rows: &[Row]) -> Result<(), BuildError> {
        let definition = self.definition;
        let binding = &definition.details;
        for (index, row) in rows.iter().enumerate() {
            self.stats.detail_rows += 1;

            let Some(sheet_index) = self.route(binding.group.as_deref(), row) else {
                self.stats.dropped_detail_rows += 1;
                continue;
            };
            let Some(column) = self.sheets[sheet_index].resolve(
                row,
                binding.entity_id.as_deref(),
                binding.entity_name.as_deref(),
                &mut self.stats,
            ) else {
                self.stats.dropped_detail_rows += 1;
                continue;
            };

            let category_value = row.field(&binding.category);
            if category_value.is_null() {
                self.stats.dropped_detail_rows += 1;
                continue;
            }

            let value = required_numeric(row, &binding.value, RowSetKind::Details, index)?;

            let sheet = &mut self.sheets[sheet_index];
            let category = sheet.category_id(category_value.display());
            sheet.add_value(category, column, value);
        }
        Ok(())
    }

    /// Collects remark lines per entity, in input order.
    fn ingest_annotations(&mut self, rows: &[Row]) {
        let definition = self.definition;
        let binding = &definition.annotations;
        for row in rows {
            self.stats.annotation_rows += 1;

            let Some(sheet_index) = self.route(binding.group.as_deref(), row) else {
                self.stats.dropped_annotation_rows += 1;
                continue;
            };
            let Some(column) = self.sheets[sheet_index].resolve(
                row,
                binding.entity_id.as_deref(),
                binding.entity_name.as_deref(),
                &mut self.stats,
            ) else {
                self.stats.dropped_annotation_rows += 1;
                continue;
            };

            let windowed = match (&definition.time_window_tag, &binding.source) {
                (Some(tag), Some(field)) => {
                    row.field(field).as_text() == Some(tag.as_str())
                }
                _ => false,
            };

            let mut body = String::new();
            if windowed {
                let start = binding
                    .start_time
                    .as_deref()
                    .map(|field| row.field(field))
                    .unwrap_or(&FieldValue::Null);
                let end = binding
                    .end_time
                    .as_deref()
                    .map(|field| row.field(field))
                    .unwrap_or(&FieldValue::Null);
                let duration = binding
                    .duration_hours
                    .as_deref()
                    .map(|field| optional_numeric(row, field))
                    .unwrap_or(0.0);
                if let Some(prefix) = window_prefix(start, end, duration) {
                    body.push_str(&prefix);
                }
            }
            body.push_str(&row.field(&binding.remark).display());

            self.sheets[sheet_index].writers[column].push(body);
        }
    }

    /// Freezes every sheet into its final shape.
    fn finish(self) -> Report {
        let mut stats = self.stats;
        stats.sheet_count = self.sheets.len();
        Report {
            name: self.definition.name.clone(),
            sheets: self.sheets.into_iter().map(SheetBuild::finish).collect(),
            stats,
        }
    }
}

fn is_bound_metrics_field(binding: &MetricsBinding, field: &str) -> bool {
    field == binding.entity_id
        || field == binding.entity_name
        || binding.group.as_deref() == Some(field)
        || binding.group_label.as_deref() == Some(field)
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Builds a report from a definition and one reporting period's row sets.
/// This is the main entry point for the calculation core.
pub fn build_report(
    definition: &ReportDefinition,
    rows: &RowSets,
) -> Result<Report, BuildError> {
    definition.validate()?;

    let started = Instant::now();
    let mut report = ReportBuilder::new(definition, rows).build()?;
    report.stats.build_time_ms = started.elapsed().as_millis() as u64;
    Ok(report)
}
