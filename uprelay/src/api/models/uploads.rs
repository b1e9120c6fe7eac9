use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of an upload request.
///
/// Both fields are required and non-empty; missing fields deserialize to empty strings so
/// that the handler can reject them with the envelope contract instead of a framework
/// rejection.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Desired object name, synthesized client-side (timestamp + random token + extension)
    #[serde(default)]
    pub file_name: String,
    /// File bytes, base64-encoded
    #[serde(default)]
    pub file_data: String,
}

/// Result envelope for a successful upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    /// Always `true`
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
    /// Storage-assigned path for the stored blob
    pub file_path: String,
}

/// Result envelope for a failed upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadRejected {
    /// Always `false`
    pub success: bool,
    /// Short categorical error string
    pub error: String,
    /// Underlying cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine code, present only for storage-originated failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Estimate the decoded length of a base64 payload without decoding it.
///
/// Uses the algebraic relationship between encoded and raw length: every 4 encoded bytes
/// carry 3 raw bytes, minus one raw byte per trailing padding character. Trailing padding
/// never exceeds two characters in well-formed base64, so the adjustment is clamped.
pub fn estimated_decoded_len(encoded: &str) -> usize {
    let padding = encoded.bytes().rev().take_while(|&b| b == b'=').count().min(2);
    (encoded.len() * 3 / 4).saturating_sub(padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    #[test]
    fn test_upload_request_missing_fields_default_to_empty() {
        let request: UploadRequest = serde_json::from_str("{}").unwrap();
        assert!(request.file_name.is_empty());
        assert!(request.file_data.is_empty());

        let request: UploadRequest = serde_json::from_str(r#"{"fileName":"x"}"#).unwrap();
        assert_eq!(request.file_name, "x");
        assert!(request.file_data.is_empty());
    }

    #[test]
    fn test_rejected_envelope_omits_absent_fields() {
        let envelope = UploadRejected {
            success: false,
            error: "Missing file data".to_string(),
            details: None,
            code: None,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("details"));
        assert!(!json.contains("code"));
    }

    #[test]
    fn test_accepted_envelope_uses_camel_case() {
        let envelope = UploadAccepted {
            success: true,
            message: "File uploaded successfully".to_string(),
            file_path: "review-uploads/abc".to_string(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["filePath"], "review-uploads/abc");
    }

    #[test]
    fn test_estimated_decoded_len_matches_decoder() {
        for len in [0usize, 1, 2, 3, 4, 5, 63, 64, 65, 1000] {
            let raw = vec![0xA5u8; len];
            let encoded = STANDARD.encode(&raw);
            assert_eq!(estimated_decoded_len(&encoded), len, "length {len}");
        }
    }

    #[test]
    fn test_estimated_decoded_len_handles_degenerate_input() {
        assert_eq!(estimated_decoded_len(""), 0);
        assert_eq!(estimated_decoded_len("="), 0);
        assert_eq!(estimated_decoded_len("===="), 1);
    }
}
