use std::sync::Arc;

use futures::future::join_all;
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use super::probe::{LatencyProbe, LatencySample};
use crate::membership::types::{MembershipView, NodeDescriptor};
use crate::relay::protocol::{ENDPOINT_READ, ENDPOINT_WRITE, Mode};

/// No node is eligible under the requested policy. Never answered by falling
/// back to another policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("no primary found")]
    NoPrimary,

    #[error("multiple primary nodes found")]
    MultiplePrimaries,

    #[error("no read nodes found")]
    NoReadNodes,

    #[error("no reachable node found")]
    NoReachableNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Read,
    Write,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Read => ENDPOINT_READ,
            Endpoint::Write => ENDPOINT_WRITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub node: NodeDescriptor,
    pub endpoint: Endpoint,
}

impl RouteTarget {
    pub fn url(&self, node_port: u16) -> String {
        self.node.url(node_port, self.endpoint.path())
    }
}

/// DIRECT: the one node tagged `primary`.
pub fn select_primary(view: &MembershipView) -> Result<&NodeDescriptor, RoutingError> {
    let primaries: Vec<&NodeDescriptor> = view.primaries().collect();
    match primaries.as_slice() {
        [] => Err(RoutingError::NoPrimary),
        [primary] => Ok(primary),
        many => {
            tracing::error!("{} nodes are tagged primary", many.len());
            Err(RoutingError::MultiplePrimaries)
        }
    }
}

/// RANDOM: uniform choice among the non-primary nodes.
pub fn select_random<'a, R: Rng + ?Sized>(
    view: &'a MembershipView,
    rng: &mut R,
) -> Result<&'a NodeDescriptor, RoutingError> {
    view.non_primary()
        .choose(rng)
        .copied()
        .ok_or(RoutingError::NoReadNodes)
}

/// CUSTOMIZED: the candidate with the strictly lowest round trip.
///
/// `samples[i]` must belong to `candidates[i]`. Ties keep the earlier candidate.
pub fn select_lowest_latency<'a>(
    candidates: &[&'a NodeDescriptor],
    samples: &[LatencySample],
) -> Result<&'a NodeDescriptor, RoutingError> {
    let mut best: Option<(&'a NodeDescriptor, std::time::Duration)> = None;

    for (&node, sample) in candidates.iter().zip(samples) {
        let Some(rtt) = sample.round_trip else {
            continue;
        };
        match best {
            Some((_, best_rtt)) if rtt >= best_rtt => {}
            _ => best = Some((node, rtt)),
        }
    }

    best.map(|(node, _)| node)
        .ok_or(RoutingError::NoReachableNode)
}

/// Applies a routing policy to a membership snapshot.
#[derive(Clone)]
pub struct QueryRouter {
    probe: Arc<dyn LatencyProbe>,
}

impl QueryRouter {
    pub fn new(probe: Arc<dyn LatencyProbe>) -> Self {
        Self { probe }
    }

    pub async fn route(
        &self,
        mode: Mode,
        view: &MembershipView,
    ) -> Result<RouteTarget, RoutingError> {
        let target = match mode {
            Mode::Direct => RouteTarget {
                node: select_primary(view)?.clone(),
                endpoint: Endpoint::Write,
            },
            Mode::Random => {
                let mut rng = rand::thread_rng();
                RouteTarget {
                    node: select_random(view, &mut rng)?.clone(),
                    endpoint: Endpoint::Read,
                }
            }
            Mode::Customized => {
                let candidates = view.non_primary();
                let samples = self.probe_all(&candidates).await;
                for sample in &samples {
                    tracing::debug!(
                        "Latency of {}: {:?} ms",
                        sample.node_address,
                        sample.round_trip_millis()
                    );
                }
                RouteTarget {
                    node: select_lowest_latency(&candidates, &samples)?.clone(),
                    endpoint: Endpoint::Read,
                }
            }
        };

        tracing::info!(
            "{} routed to {} ({})",
            mode,
            target.node.public_address,
            target.node.instance_id
        );
        Ok(target)
    }

    /// Probes all candidates concurrently; results come back in candidate order.
    async fn probe_all(&self, candidates: &[&NodeDescriptor]) -> Vec<LatencySample> {
        join_all(candidates.iter().map(|node| self.probe.probe(node))).await
    }
}
