use std::time::Duration;

use axum::Json;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::protocol::{
    HEADER_PASSWORD, HEADER_REQUEST_ID, HEADER_USERNAME, MSG_EXECUTION_FAILED, MSG_FORWARDING_FAILED,
    QueryOutcome,
};

/// What a downstream hop answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// 2xx with a JSON body.
    Accepted(Value),
    /// Any other status. The body is kept as text.
    Rejected { status: StatusCode, body: String },
}

/// Single-shot JSON POST client shared by every hop. No retries.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
        headers: HeaderMap,
    ) -> Result<Delivery, reqwest::Error> {
        tracing::info!("Forwarding request to {}", url);

        let response = self
            .http
            .post(url)
            .headers(headers)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: Value = response.json().await?;
            Ok(Delivery::Accepted(body))
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Downstream {} answered {}: {}", url, status, body);
            Ok(Delivery::Rejected { status, body })
        }
    }
}

/// Turns a forward attempt into the reply a gateway hop sends upstream.
///
/// Success bodies pass through untouched; failures become a
/// [`QueryOutcome`] envelope so no transport error leaves the hop raw. A
/// rejection that already carries a hop envelope is relayed as is, so the
/// client sees one envelope however deep the failure happened.
pub fn into_reply(result: Result<Delivery, reqwest::Error>) -> (StatusCode, Json<Value>) {
    match result {
        Ok(Delivery::Accepted(body)) => (StatusCode::OK, Json(body)),
        Ok(Delivery::Rejected { status, body }) => match hop_envelope(&body) {
            Some(envelope) => (status, Json(envelope)),
            None => (
                status,
                Json(outcome_json(QueryOutcome::execution_failed(body))),
            ),
        },
        Err(e) => {
            tracing::error!("Query forwarding failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(outcome_json(QueryOutcome::forwarding_failed(e.to_string()))),
            )
        }
    }
}

/// Parses `body` as an envelope built by [`into_reply`] further downstream.
fn hop_envelope(body: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value.get("message").and_then(Value::as_str)?;
    let built_by_hop = message == MSG_EXECUTION_FAILED || message == MSG_FORWARDING_FAILED;

    (built_by_hop && value.get("error").is_some()).then_some(value)
}

fn outcome_json(outcome: QueryOutcome) -> Value {
    serde_json::to_value(outcome).unwrap_or(Value::Null)
}

/// Request id from the incoming headers, or a fresh one.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(HEADER_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Headers to send downstream: the request id, plus credentials when `carry_credentials`.
pub fn outbound_headers(
    incoming: &HeaderMap,
    request_id: &str,
    carry_credentials: bool,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(HEADER_REQUEST_ID, value);
    }
    if carry_credentials {
        for name in [HEADER_USERNAME, HEADER_PASSWORD] {
            if let Some(value) = incoming.get(name) {
                headers.insert(name, value.clone());
            }
        }
    }
    headers
}
