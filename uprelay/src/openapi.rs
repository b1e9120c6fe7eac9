//! OpenAPI documentation configuration.
//!
//! The rendered documentation is served at `/docs` when the server is running.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "uprelay",
        description = "A minimal upload relay. Files arrive base64-encoded in a JSON body and are \
                       forwarded to the configured object-storage backend; every response carries \
                       the uniform result envelope."
    ),
    paths(api::handlers::uploads::upload_file),
    components(schemas(
        api::models::uploads::UploadRequest,
        api::models::uploads::UploadAccepted,
        api::models::uploads::UploadRejected,
    )),
    tags(
        (name = "uploads", description = "Upload validation and relay")
    )
)]
pub struct ApiDoc;
