//! FILENAME: report-service/src/source.rs
//! Row source boundary.
//!
//! The service never talks to a database itself. The embedding application
//! supplies something that, given a reporting period, returns the three row
//! sets; whether that is one stored procedure or three ad hoc queries is
//! invisible on this side of the boundary. Connection pooling, timeouts and
//! retries all live behind the implementation.

use chrono::NaiveDate;
use thiserror::Error;

use crosstab_engine::{RowSetKind, RowSets};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch {kind} rows: {message}")]
    Collection { kind: RowSetKind, message: String },

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies one reporting period's row sets.
pub trait RowSource {
    /// Fetches the metrics, category-detail and annotation rows for the
    /// period, optionally narrowed to one shift.
    fn fetch(&self, period: NaiveDate, shift: Option<&str>) -> Result<RowSets, FetchError>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn fetch(&self, period: NaiveDate, shift: Option<&str>) -> Result<RowSets, FetchError> {
        (**self).fetch(period, shift)
    }
}

impl<S: RowSource + ?Sized> RowSource for &S {
    fn fetch(&self, period: NaiveDate, shift: Option<&str>) -> Result<RowSets, FetchError> {
        (**self).fetch(period, shift)
    }
}
