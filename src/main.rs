use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sql_gateway::config::{
    Credentials, DEFAULT_NODE_PORT, DatabaseConfig, GatekeeperConfig, PrimaryConfig,
    ProxyManagerConfig, RelayConfig, ReplicaConfig, RoleConfig, ServerConfig, TrustedHostConfig,
};
use sql_gateway::server;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sql-gateway", version, about = "Gateway chain and database nodes of a replicated SQL cluster")]
struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "GATEWAY_BIND", default_value = "0.0.0.0:80", global = true)]
    bind: SocketAddr,

    /// Log filter, e.g. `info` or `sql_gateway=debug`. `RUST_LOG` wins when set.
    #[arg(long, env = "GATEWAY_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Port appended to descriptor addresses that carry none.
    #[arg(long, default_value_t = DEFAULT_NODE_PORT, global = true)]
    node_port: u16,

    /// Timeout for every downstream call except latency probes.
    #[arg(long, default_value_t = 30_000, global = true)]
    forward_timeout_ms: u64,

    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Debug, Subcommand)]
enum RoleCommand {
    /// Public entry point: sanitizes statements and relays them to the trusted host.
    Gatekeeper {
        #[arg(long, default_value = "trustedhost_info.json")]
        trusted_host_file: PathBuf,
    },
    /// Checks the envelope and credentials, then relays to the proxy manager.
    TrustedHost {
        #[arg(long, default_value = "proxy_info.json")]
        proxy_manager_file: PathBuf,
        #[arg(long, env = "GATEWAY_USERNAME")]
        username: String,
        #[arg(long, env = "GATEWAY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Routes each statement to a database node.
    ProxyManager {
        #[arg(long, default_value = "instance_info.json")]
        membership_file: PathBuf,
        #[arg(long, default_value_t = 5_000)]
        probe_timeout_ms: u64,
    },
    /// Database node that replicates its writes.
    Primary {
        #[arg(long, default_value = "instance_info.json")]
        membership_file: PathBuf,
        #[command(flatten)]
        database: DatabaseArgs,
    },
    /// Database node.
    Replica {
        #[command(flatten)]
        database: DatabaseArgs,
    },
}

#[derive(Debug, Args)]
struct DatabaseArgs {
    /// Existing SQLite database file.
    #[arg(long)]
    database: PathBuf,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let relay = RelayConfig {
            node_port: self.node_port,
            forward_timeout: Duration::from_millis(self.forward_timeout_ms),
        };

        let role = match self.role {
            RoleCommand::Gatekeeper { trusted_host_file } => {
                RoleConfig::Gatekeeper(GatekeeperConfig {
                    relay,
                    trusted_host_file,
                })
            }
            RoleCommand::TrustedHost {
                proxy_manager_file,
                username,
                password,
            } => RoleConfig::TrustedHost(TrustedHostConfig {
                relay,
                proxy_manager_file,
                credentials: Credentials::new(username, password),
            }),
            RoleCommand::ProxyManager {
                membership_file,
                probe_timeout_ms,
            } => RoleConfig::ProxyManager(ProxyManagerConfig {
                relay,
                membership_file,
                probe_timeout: Duration::from_millis(probe_timeout_ms),
            }),
            RoleCommand::Primary {
                membership_file,
                database,
            } => RoleConfig::Primary(PrimaryConfig {
                relay,
                membership_file,
                database: DatabaseConfig::new(database.database),
            }),
            RoleCommand::Replica { database } => RoleConfig::Replica(ReplicaConfig {
                database: DatabaseConfig::new(database.database),
            }),
        };

        ServerConfig {
            bind: self.bind,
            role,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.into_config();
    tracing::info!("Starting {} on {}", config.role.name(), config.bind);
    tracing::debug!("Configuration: {:?}", config);

    let router = server::build_router(&config.role)?;
    tracing::info!("Press Ctrl+C to shutdown");
    server::serve(config.bind, router).await?;

    Ok(())
}
