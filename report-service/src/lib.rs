//! FILENAME: report-service/src/lib.rs
//! Request/response surface for the Minelog stoppage reports.
//!
//! The service layer is deliberately thin: it validates a request, pulls
//! the period's row sets from a [`source::RowSource`], hands them to
//! `crosstab-engine`, and wraps the outcome in the `{ success, data,
//! message }` envelope the frontend consumes. Transport and storage live
//! behind the `RowSource` trait and are not this crate's business.

pub mod api_types;
pub mod handler;
pub mod source;

pub use api_types::{ReportEnvelope, ReportRequest};
pub use handler::{ReportHandler, ServiceError};
pub use source::{FetchError, RowSource};
