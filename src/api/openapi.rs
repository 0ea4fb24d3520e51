//! OpenAPI documentation and schema generation
//!
//! The taskfeed OpenAPI document is generated at compile time with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the taskfeed REST API
///
/// Served at `/openapi.json` and, when enabled, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "taskfeed REST API",
        version = "0.1.0",
        description = "Pull-based work distribution: agents request tasks scanned from the catalog, operators watch run statistics",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::request_tasks,
        crate::api::routes::get_stats,
        crate::api::routes::trigger_run,

        // Client version
        crate::api::routes::get_client_version,
        crate::api::routes::set_client_version,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::TaskView,
        crate::types::Stats,
        crate::types::RunStatus,
        crate::types::RunSnapshot,
        crate::types::Trigger,
        crate::types::Event,

        crate::api::routes::RequestTasksBody,
        crate::api::routes::TriggerResponse,
        crate::api::routes::ClientVersionBody,

        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::error::ServerErrorKind,
    )),
    tags(
        (name = "tasks", description = "Task hand-out, run statistics and manual triggers"),
        (name = "client", description = "Published client version"),
        (name = "system", description = "Health checks, OpenAPI spec, lifecycle events"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `X-Api-Key` header scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
