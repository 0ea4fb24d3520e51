//! Client version handlers.

use super::ClientVersionBody;
use crate::api::AppState;
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode};

/// GET /client-version - Published client version
#[utoipa::path(
    get,
    path = "/client-version",
    tag = "client",
    responses(
        (status = 200, description = "Current client version (\"1\" if never set)", body = ClientVersionBody),
        (status = 500, description = "Key-value store failure", body = crate::error::ApiError)
    )
)]
pub async fn get_client_version(State(state): State<AppState>) -> Result<Json<ClientVersionBody>> {
    let version = state.service.get_client_version().await?;
    Ok(Json(ClientVersionBody { version }))
}

/// PUT /client-version - Publish a new client version
#[utoipa::path(
    put,
    path = "/client-version",
    tag = "client",
    request_body = ClientVersionBody,
    responses(
        (status = 204, description = "Version stored"),
        (status = 400, description = "Empty version", body = crate::error::ApiError),
        (status = 500, description = "Key-value store failure", body = crate::error::ApiError)
    )
)]
pub async fn set_client_version(
    State(state): State<AppState>,
    Json(body): Json<ClientVersionBody>,
) -> Result<StatusCode> {
    state.service.set_client_version(&body.version).await?;
    Ok(StatusCode::NO_CONTENT)
}
