//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Uploads** (`/api/upload`): the upload-validation-and-relay endpoint
//! - **Static assets** (fallback): the embedded upload form
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`; the rendered
//! documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
