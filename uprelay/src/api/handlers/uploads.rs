use crate::AppState;
use crate::api::models::uploads::{UploadAccepted, UploadRequest, estimated_decoded_len};
use crate::diagnostics::DiagnosticEvent;
use crate::errors::{Error, Result};
use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "uploads",
    summary = "Upload file",
    description = "Accepts a base64-encoded file and relays the decoded bytes to the storage backend. \
                   Every response carries the uniform result envelope, success or failure.",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "File stored", body = UploadAccepted),
        (status = 400, description = "Missing fileName or fileData", body = crate::api::models::uploads::UploadRejected),
        (status = 413, description = "Estimated payload size exceeds the ceiling", body = crate::api::models::uploads::UploadRejected),
        (status = 500, description = "Storage failure or unhandled error", body = crate::api::models::uploads::UploadRejected)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    body: Bytes,
) -> Response {
    match relay_upload(&state, &body).await {
        Ok(accepted) => (StatusCode::OK, Json(accepted)).into_response(),
        Err(err) => {
            state.diagnostics.record(diagnostic_event(&method, &uri, &body, &err));
            err.into_response()
        }
    }
}

/// Validate, bound, decode, and relay a single upload.
///
/// Each failure short-circuits all later steps; the size check runs on the encoded
/// representation so oversized payloads are rejected before any decode is attempted.
async fn relay_upload(state: &AppState, body: &Bytes) -> Result<UploadAccepted> {
    // Parse the body by hand so malformed JSON follows the envelope contract rather than
    // surfacing as a framework rejection.
    let request: UploadRequest = serde_json::from_slice(body).map_err(|e| Error::Internal {
        details: format!("invalid request body: {e}"),
    })?;

    if request.file_name.is_empty() || request.file_data.is_empty() {
        return Err(Error::MissingInput);
    }

    let limit_bytes = state.config.upload.max_file_size;
    let estimated = estimated_decoded_len(&request.file_data);
    if estimated > limit_bytes {
        tracing::warn!(
            file_name = %request.file_name,
            estimated_bytes = estimated,
            limit_bytes,
            "rejecting oversized upload before decode"
        );
        return Err(Error::PayloadTooLarge { limit_bytes });
    }

    let raw = STANDARD.decode(request.file_data.as_bytes()).map_err(|e| Error::Internal {
        details: format!("payload is not valid base64: {e}"),
    })?;
    let size_bytes = raw.len();

    // Exactly one write attempt; no retries, no idempotency keys
    let stored = state
        .store
        .put(&request.file_name, Bytes::from(raw), &state.config.upload.content_type)
        .await
        .map_err(|e| {
            tracing::error!(
                file_name = %request.file_name,
                details = ?e.details,
                "storage backend rejected upload: {}",
                e.message
            );
            Error::Storage {
                message: e.message,
                code: e.code,
            }
        })?;

    tracing::info!(
        file_name = %request.file_name,
        size_bytes,
        path = %stored.path,
        "file uploaded"
    );

    Ok(UploadAccepted {
        success: true,
        message: "File uploaded successfully".to_string(),
        file_path: stored.path,
    })
}

fn diagnostic_event(method: &Method, uri: &Uri, body: &Bytes, err: &Error) -> DiagnosticEvent {
    DiagnosticEvent {
        timestamp: Utc::now(),
        method: method.to_string(),
        path: uri.path().to_string(),
        message: err.category().to_string(),
        detail: Some(err.details()),
        body: Some(String::from_utf8_lossy(body).into_owned()),
    }
}
