//! Latency Probing
//!
//! CUSTOMIZED routing needs one round-trip measurement per candidate node.
//! The measurement sits behind [`LatencyProbe`]; the deployed implementation
//! is [`HealthEchoProbe`], an application-level echo that times a `GET /health`.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::membership::types::NodeDescriptor;
use crate::relay::protocol::ENDPOINT_HEALTH;

/// One probe result. `round_trip` is `None` when the node did not answer in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySample {
    pub node_address: String,
    pub round_trip: Option<Duration>,
}

impl LatencySample {
    pub fn round_trip_millis(&self) -> Option<f64> {
        self.round_trip.map(|rtt| rtt.as_secs_f64() * 1000.0)
    }
}

#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// Measures a single round trip to `node`. Must give up after its timeout.
    async fn probe(&self, node: &NodeDescriptor) -> LatencySample;
}

/// Times `GET /health` against the node. Only a 2xx answer within the timeout counts.
#[derive(Debug, Clone)]
pub struct HealthEchoProbe {
    http: reqwest::Client,
    timeout: Duration,
    node_port: u16,
}

impl HealthEchoProbe {
    pub fn new(timeout: Duration, node_port: u16) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            timeout,
            node_port,
        })
    }
}

#[async_trait]
impl LatencyProbe for HealthEchoProbe {
    async fn probe(&self, node: &NodeDescriptor) -> LatencySample {
        let url = node.url(self.node_port, ENDPOINT_HEALTH);
        let started = Instant::now();

        let answered = tokio::time::timeout(self.timeout, self.http.get(&url).send()).await;
        let round_trip = match answered {
            Ok(Ok(response)) if response.status().is_success() => Some(started.elapsed()),
            Ok(Ok(response)) => {
                tracing::warn!("Probe of {} answered {}", url, response.status());
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("Probe failed for {}: {}", url, e);
                None
            }
            Err(_) => {
                tracing::warn!("Probe of {} timed out after {:?}", url, self.timeout);
                None
            }
        };

        LatencySample {
            node_address: node.public_address.clone(),
            round_trip,
        }
    }
}
