use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::Value;
use tracing::Instrument;

use super::policy::QueryRouter;
use crate::error::{GatewayError, GatewayResult};
use crate::membership::loader::MembershipFile;
use crate::relay::client::{RelayClient, into_reply, outbound_headers, request_id};
use crate::relay::protocol::{
    ENDPOINT_HEALTH, ENDPOINT_PROCESS, HealthResponse, Mode, ProcessRequest, QueryRequest,
};

pub struct ProxyState {
    pub membership: MembershipFile,
    pub router: QueryRouter,
    pub relay: RelayClient,
    pub node_port: u16,
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_PROCESS, post(handle_process))
        .layer(Extension(state))
}

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

pub async fn handle_process(
    Extension(state): Extension<Arc<ProxyState>>,
    headers: HeaderMap,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<Value>)> {
    let request_id = request_id(&headers);
    let span = tracing::info_span!("process", role = "proxy-manager", request_id = %request_id);

    async move {
        let Json(request) = body.map_err(|rejection| {
            GatewayError::Validation(format!("Malformed request body: {}", rejection.body_text()))
        })?;

        let query = request.query.filter(|query| !query.trim().is_empty());
        let (Some(query), Some(mode)) = (query, request.mode) else {
            return Err(GatewayError::Validation("Missing query or mode".to_string()));
        };
        let mode = mode.parse::<Mode>().map_err(|e| {
            tracing::warn!("Invalid mode provided: {}", e.0);
            GatewayError::Validation(e.to_string())
        })?;

        // Fresh snapshot per request: membership edits apply to the next call.
        let view = state.membership.load().await?;
        let target = state.router.route(mode, &view).await.map_err(|e| {
            tracing::error!("Routing failed for {}: {}", mode, e);
            e
        })?;

        let url = target.url(state.node_port);
        tracing::info!("Redirecting to URL: {}", url);

        let result = state
            .relay
            .post(
                &url,
                &QueryRequest::new(query),
                outbound_headers(&headers, &request_id, false),
            )
            .await;

        Ok(into_reply(result))
    }
    .instrument(span)
    .await
}
