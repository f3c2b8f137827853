//! FILENAME: report-service/src/api_types.rs
// PURPOSE: Request and response envelope types for the report endpoints.
// CONTEXT: These structs use camelCase serialization for the presentation
// layer; the embedded Report keeps the core's own field names.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crosstab_engine::Report;

/// One report request as received from the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// The reporting period. Required; requests without it are rejected
    /// before any data fetch is attempted.
    #[serde(default)]
    pub period: Option<NaiveDate>,

    /// Optional shift filter, passed through to the row source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
}

impl ReportRequest {
    pub fn for_period(period: NaiveDate) -> Self {
        ReportRequest {
            period: Some(period),
            shift: None,
        }
    }
}

/// The response envelope every report endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Report>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReportEnvelope {
    pub fn ok(report: Report) -> Self {
        ReportEnvelope {
            success: true,
            data: Some(report),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ReportEnvelope {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parses_with_camel_case_keys() {
        let request: ReportRequest =
            serde_json::from_str(r#"{"period":"2024-03-01","shift":"Day"}"#).unwrap();
        assert_eq!(
            request.period,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(request.shift.as_deref(), Some("Day"));

        let bare: ReportRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(bare.period, None);
        assert_eq!(bare.shift, None);
    }

    #[test]
    fn test_failure_envelope_omits_data() {
        let envelope = ReportEnvelope::failure("period date is required");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["message"], serde_json::json!("period date is required"));
        assert!(json.get("data").is_none());
    }
}
