use axum::http::HeaderMap;
use futures::future::join_all;
use serde_json::Value;

use crate::membership::types::{MembershipView, NodeDescriptor};
use crate::relay::client::{Delivery, RelayClient, outbound_headers};
use crate::relay::protocol::{ENDPOINT_WRITE, QueryOutcome, QueryRequest};

/// Best-effort fan-out of a write from the primary to every other node.
///
/// A failed replica is reported in its outcome and never stops the others.
/// Nothing is retried, rolled back or reconciled afterwards.
#[derive(Debug, Clone)]
pub struct Replicator {
    relay: RelayClient,
    node_port: u16,
}

impl Replicator {
    pub fn new(relay: RelayClient, node_port: u16) -> Self {
        Self { relay, node_port }
    }

    /// One outcome per non-primary node, in membership order.
    pub async fn replicate(
        &self,
        view: &MembershipView,
        statement: &str,
        request_id: &str,
    ) -> Vec<QueryOutcome> {
        let targets = view.non_primary();
        tracing::info!("Replicating write to {} node(s)", targets.len());

        join_all(
            targets
                .into_iter()
                .map(|node| self.replicate_to(node, statement, request_id)),
        )
        .await
    }

    async fn replicate_to(
        &self,
        node: &NodeDescriptor,
        statement: &str,
        request_id: &str,
    ) -> QueryOutcome {
        let url = node.url(self.node_port, ENDPOINT_WRITE);
        let headers = outbound_headers(&HeaderMap::new(), request_id, false);

        match self.relay.post(&url, &QueryRequest::new(statement), headers).await {
            Ok(Delivery::Accepted(body)) => replica_outcome(body),
            Ok(Delivery::Rejected { status, body }) => {
                tracing::warn!("Replica {} rejected write with {}", node.instance_id, status);
                QueryOutcome::forwarding_failed(error_value(body))
            }
            Err(e) => {
                tracing::error!("Replica {} unreachable: {}", node.instance_id, e);
                QueryOutcome::forwarding_failed(e.to_string())
            }
        }
    }
}

/// Decodes a replica's 2xx reply; missing fields fall back to their defaults.
fn replica_outcome(body: Value) -> QueryOutcome {
    serde_json::from_value(body).unwrap_or_else(|e| {
        tracing::warn!("Undecodable replica reply: {}", e);
        QueryOutcome::forwarding_failed(format!("undecodable reply: {}", e))
    })
}

/// Rejection bodies are kept as JSON when they parse, as text otherwise.
fn error_value(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}
