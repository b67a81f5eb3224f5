use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::Value;
use tracing::Instrument;

use super::auth::{authenticate, validate_envelope};
use crate::config::Credentials;
use crate::error::{GatewayError, GatewayResult};
use crate::membership::loader::MembershipFile;
use crate::relay::client::{Delivery, RelayClient, into_reply, outbound_headers, request_id};
use crate::relay::protocol::{ENDPOINT_HEALTH, ENDPOINT_PROCESS, HealthResponse, ProcessRequest};

pub struct TrustedHostState {
    pub proxy_managers: MembershipFile,
    pub credentials: Credentials,
    pub relay: RelayClient,
    pub node_port: u16,
}

pub fn router(state: Arc<TrustedHostState>) -> Router {
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
    Extension(state): Extension<Arc<TrustedHostState>>,
    headers: HeaderMap,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<Value>)> {
    let request_id = request_id(&headers);
    let span = tracing::info_span!("process", role = "trusted-host", request_id = %request_id);

    async move {
        let Json(request) = body.map_err(|rejection| {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            GatewayError::Validation(format!("Malformed request body: {}", rejection.body_text()))
        })?;
        tracing::debug!("Received request payload: {:?}", request);

        // Envelope first, then credentials: a malformed request is a 400 whoever sends it.
        let (query, mode) = validate_envelope(&request)?;
        authenticate(&headers, &state.credentials)?;

        let proxy_manager = state.proxy_managers.first("proxy manager").await?;
        let url = proxy_manager.url(state.node_port, ENDPOINT_PROCESS);

        let result = state
            .relay
            .post(
                &url,
                &ProcessRequest::new(query, mode),
                outbound_headers(&headers, &request_id, false),
            )
            .await;

        if matches!(result, Ok(Delivery::Accepted(_))) {
            tracing::info!("Query processed successfully");
        }

        Ok(into_reply(result))
    }
    .instrument(span)
    .await
}
