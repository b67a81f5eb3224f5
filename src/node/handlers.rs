use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tracing::Instrument;

use super::database::Database;
use super::replication::Replicator;
use crate::error::{GatewayError, GatewayResult};
use crate::membership::loader::MembershipFile;
use crate::relay::client::request_id;
use crate::relay::protocol::{
    ENDPOINT_HEALTH, ENDPOINT_READ, ENDPOINT_WRITE, HealthResponse, QueryOutcome, QueryRequest,
    ReadResponse,
};

pub const MISSING_QUERY: &str = "Query is missing";

/// What the primary needs on top of its database to replicate writes.
pub struct PrimaryState {
    pub membership: MembershipFile,
    pub replicator: Replicator,
}

pub fn replica_router(database: Database) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_READ, post(handle_read))
        .route(ENDPOINT_WRITE, post(handle_write))
        .layer(Extension(database))
}

pub fn primary_router(database: Database, state: Arc<PrimaryState>) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_READ, post(handle_read))
        .route(ENDPOINT_WRITE, post(handle_replicated_write))
        .layer(Extension(database))
        .layer(Extension(state))
}

pub async fn handle_health(
    Extension(database): Extension<Database>,
) -> (StatusCode, Json<HealthResponse>) {
    match database.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::healthy())),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse::unhealthy(e)),
            )
        }
    }
}

pub async fn handle_read(
    Extension(database): Extension<Database>,
    headers: HeaderMap,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<ReadResponse>)> {
    let span = tracing::info_span!("read", request_id = %request_id(&headers));

    async move {
        let query = require_query(body)?;
        tracing::debug!("Read: {}", query);

        match database.read(query).await {
            Ok(rows) => {
                tracing::info!("Read returned {} row(s)", rows.len());
                Ok((StatusCode::OK, Json(ReadResponse { rows, error: None })))
            }
            Err(e) => {
                tracing::error!("Read failed: {}", e);
                Ok((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ReadResponse {
                        rows: Vec::new(),
                        error: Some(e.to_string()),
                    }),
                ))
            }
        }
    }
    .instrument(span)
    .await
}

/// Local-only write, served by replicas and by the primary's fan-out targets.
pub async fn handle_write(
    Extension(database): Extension<Database>,
    headers: HeaderMap,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<QueryOutcome>)> {
    let span = tracing::info_span!("write", request_id = %request_id(&headers));

    async move {
        let query = require_query(body)?;
        let outcome = execute_locally(&database, query).await;
        let status = if outcome.is_failure() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        Ok((status, Json(outcome)))
    }
    .instrument(span)
    .await
}

/// Primary write: local execution first, then one outcome per other node.
///
/// Always 200 once the membership is loaded; failures live in the outcomes.
pub async fn handle_replicated_write(
    Extension(database): Extension<Database>,
    Extension(state): Extension<Arc<PrimaryState>>,
    headers: HeaderMap,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> GatewayResult<Json<Vec<QueryOutcome>>> {
    let request_id = request_id(&headers);
    let span = tracing::info_span!("write", role = "primary", request_id = %request_id);

    async move {
        let query = require_query(body)?;
        let view = state.membership.load().await?;

        let mut outcomes = vec![execute_locally(&database, query.clone()).await];
        outcomes.extend(state.replicator.replicate(&view, &query, &request_id).await);

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        if failed > 0 {
            tracing::warn!("{} of {} write(s) failed", failed, outcomes.len());
        }

        Ok(Json(outcomes))
    }
    .instrument(span)
    .await
}

async fn execute_locally(database: &Database, query: String) -> QueryOutcome {
    tracing::debug!("Write: {}", query);
    match database.write(query).await {
        Ok(affected) => {
            tracing::info!("Write affected {} row(s)", affected);
            QueryOutcome::executed(affected)
        }
        Err(e) => {
            tracing::error!("Write failed: {}", e);
            QueryOutcome::failed(e)
        }
    }
}

fn require_query(body: Result<Json<QueryRequest>, JsonRejection>) -> GatewayResult<String> {
    let Json(request) = body.map_err(|rejection| {
        GatewayError::Validation(format!("Malformed request body: {}", rejection.body_text()))
    })?;

    request
        .query
        .filter(|query| !query.trim().is_empty())
        .ok_or_else(|| GatewayError::Validation(MISSING_QUERY.to_string()))
}
