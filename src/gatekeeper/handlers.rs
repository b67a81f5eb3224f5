use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::Value;
use tracing::Instrument;

use super::sanitizer::{SANITIZATION_ERROR, is_sanitized};
use crate::error::{GatewayError, GatewayResult};
use crate::membership::loader::MembershipFile;
use crate::relay::client::{RelayClient, into_reply, outbound_headers, request_id};
use crate::relay::protocol::{ENDPOINT_HEALTH, ENDPOINT_PROCESS, HealthResponse};

pub struct GatekeeperState {
    pub trusted_hosts: MembershipFile,
    pub relay: RelayClient,
    pub node_port: u16,
}

pub fn router(state: Arc<GatekeeperState>) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_PROCESS, post(handle_process))
        .layer(Extension(state))
}

pub async fn handle_health() -> Json<HealthResponse> {
    tracing::info!("Health check endpoint accessed");
    Json(HealthResponse::healthy())
}

pub async fn handle_process(
    Extension(state): Extension<Arc<GatekeeperState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<Value>)> {
    let request_id = request_id(&headers);
    let span = tracing::info_span!("process", role = "gatekeeper", request_id = %request_id);

    async move {
        // An unparseable body is treated like an unsanitized one: rejected before any I/O.
        let Ok(Json(envelope)) = body else {
            tracing::warn!("Request body is not valid JSON");
            return Err(GatewayError::Validation(SANITIZATION_ERROR.to_string()));
        };
        let query = envelope.get("query").and_then(Value::as_str);
        tracing::debug!("Received query: {:?}", query);

        match query {
            Some(query) if is_sanitized(query) => {}
            _ => {
                tracing::warn!("Query failed sanitization check");
                return Err(GatewayError::Validation(SANITIZATION_ERROR.to_string()));
            }
        }

        let trusted_host = state.trusted_hosts.first("trusted host").await?;
        tracing::info!(
            "Forwarding request to trusted host: {}",
            trusted_host.public_address
        );

        let url = trusted_host.url(state.node_port, ENDPOINT_PROCESS);
        let result = state
            .relay
            .post(&url, &envelope, outbound_headers(&headers, &request_id, true))
            .await;

        Ok(into_reply(result))
    }
    .instrument(span)
    .await
}
