//! Object-storage backends the upload handler relays to.
//!
//! The storage capability is opaque to the rest of the crate: store a named blob, get back
//! an addressable path or an error. Backends are selected by configuration through
//! [`create_object_store`].

use crate::config::StorageConfig;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error as ThisError;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Error reported by a storage backend.
///
/// `code` is a backend-assigned machine code when one exists; `details` carries any extra
/// context the backend returned beyond its primary message.
#[derive(Debug, Clone, ThisError)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
    pub code: Option<String>,
    pub details: Option<String>,
}

impl StorageError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
        }
    }
}

/// A successfully stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Addressable path assigned by the backend (e.g., "review-uploads/171234-x7k2f9a.pdf")
    pub path: String,
}

/// Trait for object-storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a named blob and return its addressable path
    async fn put(&self, name: &str, bytes: Bytes, content_type: &str) -> Result<StoredObject, StorageError>;
}

// ============================================================================
// Local Filesystem Storage Implementation
// ============================================================================

/// Local filesystem backend - writes objects under a base directory.
/// Useful for development and testing.
pub struct LocalObjectStore {
    base_path: PathBuf,
    prefix: String,
}

impl LocalObjectStore {
    pub fn new(base_path: PathBuf, prefix: String) -> Self {
        Self { base_path, prefix }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, name: &str, bytes: Bytes, _content_type: &str) -> Result<StoredObject, StorageError> {
        // Object names are single path segments; anything else would escape the base directory
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(StorageError::new(format!("invalid object name: {name:?}")));
        }

        let dir = self.base_path.join(&self.prefix);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::new(format!("failed to create storage directory: {e}")))?;

        let full_path = dir.join(name);
        let mut file = fs::File::create(&full_path)
            .await
            .map_err(|e| StorageError::new(format!("failed to create object file: {e}")))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| StorageError::new(format!("failed to write object: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::new(format!("failed to sync object: {e}")))?;

        Ok(StoredObject {
            path: format!("{}/{}", self.prefix, name),
        })
    }
}

// ============================================================================
// Remote HTTP Storage Implementation
// ============================================================================

/// Error body returned by the remote storage API on failure.
///
/// Mirrors the common object-storage service shape `{statusCode, error, message}`;
/// all fields are optional so a partially-conforming body still maps cleanly.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
    #[serde(alias = "statusCode")]
    code: Option<String>,
    error: Option<String>,
}

/// Success body returned by the remote storage API.
#[derive(Debug, Deserialize)]
struct RemoteStoredBody {
    path: Option<String>,
    #[serde(rename = "Key")]
    key: Option<String>,
}

/// Remote object-storage backend - relays objects to an HTTP storage API.
///
/// Objects are uploaded with `POST {endpoint}/object/{prefix}/{name}`, bearer-authenticated
/// when an API key is configured, with the payload as the raw request body.
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    prefix: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: Url, api_key: Option<String>, prefix: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            prefix,
        })
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.prefix,
            name
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, name: &str, bytes: Bytes, content_type: &str) -> Result<StoredObject, StorageError> {
        let mut request = self
            .client
            .post(self.object_url(name))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::new(format!("storage request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<RemoteErrorBody>(&text) {
                Ok(body) => StorageError {
                    message: body
                        .message
                        .or(body.error)
                        .unwrap_or_else(|| format!("storage returned {status}")),
                    code: body.code,
                    details: if text.is_empty() { None } else { Some(text) },
                },
                Err(_) => StorageError {
                    message: format!("storage returned {status}"),
                    code: Some(status.as_u16().to_string()),
                    details: if text.is_empty() { None } else { Some(text) },
                },
            });
        }

        // Backends differ on the success body; fall back to the computed path when absent
        let path = match response.json::<RemoteStoredBody>().await {
            Ok(body) => body.path.or(body.key),
            Err(_) => None,
        };

        Ok(StoredObject {
            path: path.unwrap_or_else(|| format!("{}/{}", self.prefix, name)),
        })
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create an object-storage backend based on configuration
pub async fn create_object_store(config: &StorageConfig, prefix: &str) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::Local { path } => {
            tracing::info!("Creating local object store (path: {:?}, prefix: {})", path, prefix);
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create local storage directory {:?}: {}", path, e))?;
            Ok(Arc::new(LocalObjectStore::new(path.clone(), prefix.to_string())))
        }
        StorageConfig::Http { endpoint, api_key, timeout } => {
            tracing::info!("Creating remote object store (endpoint: {}, prefix: {})", endpoint, prefix);
            let store = HttpObjectStore::new(endpoint.clone(), api_key.clone(), prefix.to_string(), *timeout)?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_local_store_writes_bytes_and_returns_prefixed_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(temp_dir.path().to_path_buf(), "review-uploads".to_string());

        let content = Bytes::from_static(b"local object content");
        let stored = store
            .put("1712000000000-x7k2f9a.pdf", content.clone(), "application/octet-stream")
            .await
            .unwrap();

        assert_eq!(stored.path, "review-uploads/1712000000000-x7k2f9a.pdf");

        let on_disk = std::fs::read(temp_dir.path().join("review-uploads/1712000000000-x7k2f9a.pdf")).unwrap();
        assert_eq!(on_disk, content.to_vec());
    }

    #[tokio::test]
    async fn test_local_store_rejects_path_traversal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(temp_dir.path().to_path_buf(), "review-uploads".to_string());

        let err = store
            .put("../escape.bin", Bytes::from_static(b"x"), "application/octet-stream")
            .await
            .unwrap_err();
        assert!(err.message.contains("invalid object name"));
    }

    #[tokio::test]
    async fn test_http_store_relays_bytes_with_auth_and_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/object/review-uploads/abc.bin"))
            .and(header("authorization", "Bearer svc-key"))
            .and(header("content-type", "application/octet-stream"))
            .and(body_bytes(b"remote object content".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Key": "review-uploads/abc.bin"
            })))
            .mount(&mock_server)
            .await;

        let store = HttpObjectStore::new(
            Url::parse(&mock_server.uri()).unwrap(),
            Some("svc-key".to_string()),
            "review-uploads".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let stored = store
            .put("abc.bin", Bytes::from_static(b"remote object content"), "application/octet-stream")
            .await
            .unwrap();
        assert_eq!(stored.path, "review-uploads/abc.bin");
    }

    #[test_log::test(tokio::test)]
    async fn test_http_store_maps_json_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "statusCode": "404",
                "error": "Not Found",
                "message": "Bucket not found"
            })))
            .mount(&mock_server)
            .await;

        let store = HttpObjectStore::new(
            Url::parse(&mock_server.uri()).unwrap(),
            None,
            "review-uploads".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = store
            .put("abc.bin", Bytes::from_static(b"x"), "application/octet-stream")
            .await
            .unwrap_err();
        assert_eq!(err.message, "Bucket not found");
        assert_eq!(err.code.as_deref(), Some("404"));
        assert!(err.details.is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_http_store_tolerates_plain_text_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&mock_server)
            .await;

        let store = HttpObjectStore::new(
            Url::parse(&mock_server.uri()).unwrap(),
            None,
            "review-uploads".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = store
            .put("abc.bin", Bytes::from_static(b"x"), "application/octet-stream")
            .await
            .unwrap_err();
        assert!(err.message.contains("503"));
        assert_eq!(err.code.as_deref(), Some("503"));
        assert_eq!(err.details.as_deref(), Some("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_http_store_computes_path_when_body_is_unparseable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let store = HttpObjectStore::new(
            Url::parse(&mock_server.uri()).unwrap(),
            None,
            "review-uploads".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let stored = store
            .put("abc.bin", Bytes::from_static(b"x"), "application/octet-stream")
            .await
            .unwrap();
        assert_eq!(stored.path, "review-uploads/abc.bin");
    }

    #[tokio::test]
    async fn test_factory_creates_local_store_and_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().join("objects");
        let config = StorageConfig::Local { path: base.clone() };

        let store = create_object_store(&config, "review-uploads").await.unwrap();
        assert!(base.is_dir());

        let stored = store
            .put("abc.bin", Bytes::from_static(b"x"), "application/octet-stream")
            .await
            .unwrap();
        assert_eq!(stored.path, "review-uploads/abc.bin");
    }
}
