//! Ambient diagnostics for failed requests.
//!
//! Every error the upload handler produces is reported to an injected [`DiagnosticsSink`]
//! before the response envelope is sent. The sink decides whether to transmit, buffer, or
//! discard the record; the default is a no-op. This keeps the external error-reporting hook
//! out of the request path's type signatures while making it swappable in one place.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A structured record describing one failed request.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent {
    /// When the failure was observed
    pub timestamp: DateTime<Utc>,
    /// HTTP method of the failing request
    pub method: String,
    /// Request path
    pub path: String,
    /// Short categorical error string (matches the envelope `error` field)
    pub message: String,
    /// Underlying cause, when known
    pub detail: Option<String>,
    /// Raw request body as received, lossily decoded
    pub body: Option<String>,
}

/// Sink for diagnostic records.
///
/// Implementations must be cheap to call: `record` runs on the request path,
/// after the failure but before the response is sent.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Discards every record. The default sink.
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn record(&self, _event: DiagnosticEvent) {}
}

/// Forwards records to the tracing subscriber as structured error events.
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        tracing::error!(
            timestamp = %event.timestamp,
            method = %event.method,
            path = %event.path,
            detail = ?event.detail,
            body = ?event.body,
            "request failed: {}",
            event.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_without_optional_fields() {
        let event = DiagnosticEvent {
            timestamp: Utc::now(),
            method: "POST".to_string(),
            path: "/api/upload".to_string(),
            message: "Missing file data".to_string(),
            detail: None,
            body: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["path"], "/api/upload");
        assert!(json["detail"].is_null());
    }

    #[test]
    fn test_noop_sink_accepts_records() {
        let sink = NoopDiagnostics;
        sink.record(DiagnosticEvent {
            timestamp: Utc::now(),
            method: "POST".to_string(),
            path: "/api/upload".to_string(),
            message: "File too large".to_string(),
            detail: Some("Maximum file size is 5MB".to_string()),
            body: Some("{}".to_string()),
        });
    }
}
