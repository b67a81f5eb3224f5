//! Wires a role's configuration into its router and serves it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use crate::config::{RelayConfig, RoleConfig};
use crate::gatekeeper::handlers::GatekeeperState;
use crate::membership::loader::MembershipFile;
use crate::node::database::Database;
use crate::node::handlers::{PrimaryState, primary_router, replica_router};
use crate::node::replication::Replicator;
use crate::proxy::handlers::ProxyState;
use crate::proxy::policy::QueryRouter;
use crate::proxy::probe::HealthEchoProbe;
use crate::relay::client::RelayClient;
use crate::trusted_host::handlers::TrustedHostState;
use crate::{gatekeeper, proxy, trusted_host};

/// Builds the HTTP surface of one role. Fails only if an HTTP client cannot be built.
pub fn build_router(role: &RoleConfig) -> reqwest::Result<Router> {
    let router = match role {
        RoleConfig::Gatekeeper(config) => gatekeeper::handlers::router(Arc::new(GatekeeperState {
            trusted_hosts: MembershipFile::new(&config.trusted_host_file),
            relay: relay_client(&config.relay)?,
            node_port: config.relay.node_port,
        })),
        RoleConfig::TrustedHost(config) => {
            trusted_host::handlers::router(Arc::new(TrustedHostState {
                proxy_managers: MembershipFile::new(&config.proxy_manager_file),
                credentials: config.credentials.clone(),
                relay: relay_client(&config.relay)?,
                node_port: config.relay.node_port,
            }))
        }
        RoleConfig::ProxyManager(config) => {
            let probe = HealthEchoProbe::new(config.probe_timeout, config.relay.node_port)?;
            proxy::handlers::router(Arc::new(ProxyState {
                membership: MembershipFile::new(&config.membership_file),
                router: QueryRouter::new(Arc::new(probe)),
                relay: relay_client(&config.relay)?,
                node_port: config.relay.node_port,
            }))
        }
        RoleConfig::Primary(config) => {
            let replicator = Replicator::new(relay_client(&config.relay)?, config.relay.node_port);
            primary_router(
                Database::new(config.database.clone()),
                Arc::new(PrimaryState {
                    membership: MembershipFile::new(&config.membership_file),
                    replicator,
                }),
            )
        }
        RoleConfig::Replica(config) => replica_router(Database::new(config.database.clone())),
    };

    Ok(router)
}

fn relay_client(relay: &RelayConfig) -> reqwest::Result<RelayClient> {
    RelayClient::new(relay.forward_timeout)
}

/// Binds `addr` and serves `router` until the process stops.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await
}
