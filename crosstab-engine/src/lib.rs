//! FILENAME: crosstab-engine/src/lib.rs
//! Cross-tabulation report subsystem for Minelog.
//!
//! This crate is the calculation core behind the shift-wise and cumulative
//! stoppage reports: it ingests the flat row sets an upstream query layer
//! fetched for one reporting period and reassembles them into a pivoted,
//! aggregated, annotated report. It performs no I/O and holds no state
//! across builds, so arbitrarily many reports can be built concurrently.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the report IS)
//! - `rows`: Flat-mapping input model (WHAT we ingest)
//! - `engine`: Report builder (HOW we calculate)
//! - `remarks`: Annotation text formatting (HOW remark blocks read)
//! - `view`: Serializable output (WHAT we return)

pub mod definition;
pub mod engine;
pub mod error;
pub mod remarks;
pub mod rows;
pub mod view;

pub use definition::*;
pub use engine::{build_report, ReportBuilder};
pub use error::BuildError;
pub use rows::*;
pub use view::*;
