//! Test utilities for integration testing (available with `test-utils` feature).

use crate::AppState;
use crate::config::Config;
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, NoopDiagnostics};
use crate::storage::{ObjectStore, StorageError, StoredObject};
use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use std::sync::{Arc, Mutex};

/// One recorded `put` call against a [`StubObjectStore`].
#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub name: String,
    pub bytes: Bytes,
    pub content_type: String,
}

/// Object store that records every call and answers with a fixed path.
pub struct StubObjectStore {
    path: String,
    calls: Mutex<Vec<RecordedPut>>,
}

impl StubObjectStore {
    pub fn returning(path: &str) -> Self {
        Self {
            path: path.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedPut> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for StubObjectStore {
    async fn put(&self, name: &str, bytes: Bytes, content_type: &str) -> Result<StoredObject, StorageError> {
        self.calls.lock().unwrap().push(RecordedPut {
            name: name.to_string(),
            bytes,
            content_type: content_type.to_string(),
        });
        Ok(StoredObject { path: self.path.clone() })
    }
}

/// Object store that fails every call with a fixed error.
pub struct FailingObjectStore {
    pub message: String,
    pub code: Option<String>,
}

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn put(&self, _name: &str, _bytes: Bytes, _content_type: &str) -> Result<StoredObject, StorageError> {
        Err(StorageError {
            message: self.message.clone(),
            code: self.code.clone(),
            details: None,
        })
    }
}

/// Diagnostics sink that captures every recorded event.
#[derive(Default)]
pub struct CapturingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CapturingDiagnostics {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DiagnosticsSink for CapturingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    }
}

/// Build a test server over the full router with the given store and a no-op diagnostics sink.
pub fn create_test_app(store: Arc<dyn ObjectStore>) -> TestServer {
    create_test_app_with(store, Arc::new(NoopDiagnostics))
}

/// Build a test server over the full router with the given store and diagnostics sink.
pub fn create_test_app_with(store: Arc<dyn ObjectStore>, diagnostics: Arc<dyn DiagnosticsSink>) -> TestServer {
    let state = AppState {
        config: create_test_config(),
        store,
        diagnostics,
    };
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}
