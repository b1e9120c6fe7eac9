//! # uprelay: A Minimal Upload Relay
//!
//! `uprelay` accepts browser file uploads as base64-encoded JSON and forwards the decoded
//! bytes to an object-storage backend. It validates the request, bounds the payload size,
//! performs exactly one storage write, and shapes every outcome into a uniform JSON result
//! envelope.
//!
//! ## Overview
//!
//! The server exposes one operation, `POST /api/upload`, accepting
//! `{"fileName": "...", "fileData": "<base64>"}`. The handler checks that both fields are
//! present, estimates the decoded size from the encoded length (rejecting oversized payloads
//! before any decode), decodes the payload, and relays the bytes to the configured storage
//! backend under a fixed content type. Success returns the storage-assigned path; every
//! failure is converted into the same envelope shape with an appropriate status code
//! (400 missing input, 413 too large, 500 storage or unhandled failure).
//!
//! The handler is stateless and reentrant: the only shared resource is the storage backend
//! behind an `Arc`, and each request is fully isolated. There are no retries and no partial
//! success - either the blob is stored and a path returned, or nothing is considered stored.
//!
//! The upload form itself ships inside the binary: the `static/` directory is embedded at
//! compile time and served for any route the API doesn't claim.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer.
//! Storage backends implement the [`storage::ObjectStore`] trait; a local-filesystem backend
//! serves development, and an HTTP backend relays to a remote object-storage API. Failed
//! requests are additionally reported to an injected [`diagnostics::DiagnosticsSink`]
//! (no-op by default) carrying the request context.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use uprelay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = uprelay::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging)
//!     uprelay::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod errors;
mod openapi;
pub mod static_assets;
pub mod storage;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::diagnostics::{DiagnosticsSink, NoopDiagnostics};
use crate::openapi::ApiDoc;
use crate::storage::ObjectStore;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    Router, http,
    routing::{get, post},
};
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `config`: Application configuration loaded from file/environment
/// - `store`: The object-storage backend uploads are relayed to
/// - `diagnostics`: Sink receiving a structured record for every failed request
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObjectStore>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A wildcard anywhere in the list means "any origin"; tower-http rejects a literal `*`
    // inside an origin list. Config validation has already refused wildcard + credentials.
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Url renders with a trailing slash the Origin header never carries
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - The upload endpoint, with the transport body limit applied to it alone
/// - OpenAPI documentation at `/docs`
/// - Static asset serving with upload-form fallback
/// - CORS configuration
/// - Tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // The whole-body ceiling is a coarse bound above the payload ceiling the handler enforces
    let max_body_bytes = state.config.max_body_bytes;

    let api_routes = Router::new()
        .route(
            "/api/upload",
            post(api::handlers::uploads::upload_file).layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback_service(get(api::handlers::static_assets::serve_embedded_asset))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] loads the storage backend and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, in-flight requests drain gracefully
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with the default (no-op) diagnostics sink
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_diagnostics(config, Arc::new(NoopDiagnostics)).await
    }

    /// Create a new application instance with an injected diagnostics sink
    pub async fn with_diagnostics(config: Config, diagnostics: Arc<dyn DiagnosticsSink>) -> anyhow::Result<Self> {
        let store = storage::create_object_store(&config.storage, &config.upload.prefix).await?;

        let state = AppState {
            config: config.clone(),
            store,
            diagnostics,
        };

        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Upload relay listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::{StubObjectStore, create_test_app};
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_healthz() {
        let server = create_test_app(Arc::new(StubObjectStore::returning("review-uploads/abc")));

        let response = server.get("/healthz").await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.text(), "OK");
    }

    #[tokio::test]
    async fn test_unmatched_route_serves_upload_form() {
        let server = create_test_app(Arc::new(StubObjectStore::returning("review-uploads/abc")));

        let response = server.get("/nonexistent").await;

        response.assert_status(StatusCode::OK);
        assert!(
            response
                .headers()
                .get("content-type")
                .map(|v| v.to_str().unwrap())
                .unwrap()
                .contains("text/html")
        );
    }

    #[tokio::test]
    async fn test_docs_are_served() {
        let server = create_test_app(Arc::new(StubObjectStore::returning("review-uploads/abc")));

        let response = server.get("/docs").await;

        response.assert_status(StatusCode::OK);
    }
}
