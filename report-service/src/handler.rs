//! FILENAME: report-service/src/handler.rs
//! Report request handling: validate, fetch, build, wrap.

use thiserror::Error;

use crosstab_engine::{build_report, BuildError, Report, ReportDefinition};

use crate::api_types::{ReportEnvelope, ReportRequest};
use crate::source::{FetchError, RowSource};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("period date is required")]
    MissingPeriod,

    #[error("report fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("report build failed: {0}")]
    Build(#[from] BuildError),
}

/// Dispatches report requests against a row source. One handler serves
/// both shipped flavors; custom definitions go through [`ReportHandler::build`].
pub struct ReportHandler<S> {
    source: S,
    shift_definition: ReportDefinition,
    cumulative_definition: ReportDefinition,
}

impl<S: RowSource> ReportHandler<S> {
    pub fn new(source: S) -> Self {
        ReportHandler {
            source,
            shift_definition: ReportDefinition::shift_stoppage(),
            cumulative_definition: ReportDefinition::cumulative_stoppage(),
        }
    }

    /// The shift-wise stoppage report endpoint.
    pub fn shift_stoppage(&self, request: &ReportRequest) -> ReportEnvelope {
        self.build(&self.shift_definition, request)
    }

    /// The cumulative stoppage report endpoint.
    pub fn cumulative_stoppage(&self, request: &ReportRequest) -> ReportEnvelope {
        self.build(&self.cumulative_definition, request)
    }

    /// Runs one request end to end and wraps the outcome in the envelope.
    pub fn build(
        &self,
        definition: &ReportDefinition,
        request: &ReportRequest,
    ) -> ReportEnvelope {
        match self.run(definition, request) {
            Ok(report) => ReportEnvelope::ok(report),
            Err(error) => {
                log::warn!(
                    "report request failed ({}): {}",
                    definition.name.as_deref().unwrap_or("unnamed"),
                    error
                );
                ReportEnvelope::failure(error.to_string())
            }
        }
    }

    fn run(
        &self,
        definition: &ReportDefinition,
        request: &ReportRequest,
    ) -> Result<Report, ServiceError> {
        log::debug!(
            "handling {} request for {:?}",
            definition.name.as_deref().unwrap_or("report"),
            request.period
        );

        // Validation happens before any fetch
        let period = request.period.ok_or(ServiceError::MissingPeriod)?;

        let rows = self.source.fetch(period, request.shift.as_deref())?;
        log::debug!(
            "rows fetched for {}: {} metrics, {} details, {} annotations",
            period,
            rows.metrics.len(),
            rows.details.len(),
            rows.annotations.len()
        );

        let report = build_report(definition, &rows)?;
        log::info!(
            "report built for {}: {} sheets in {} ms",
            period,
            report.stats.sheet_count,
            report.stats.build_time_ms
        );
        Ok(report)
    }
}
