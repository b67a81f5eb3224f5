//! Process configuration.
//!
//! Built once at start-up from the command line and handed to the role's
//! router. Nothing below this module reads the environment.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NODE_PORT: u16 = 80;
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by every hop that calls another hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Port appended to descriptor addresses that do not carry one.
    pub node_port: u16,
    /// Upper bound on any downstream call other than a latency probe.
    pub forward_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            node_port: DEFAULT_NODE_PORT,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
        }
    }
}

/// The single username/password pair the trusted host accepts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    pub relay: RelayConfig,
    pub trusted_host_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TrustedHostConfig {
    pub relay: RelayConfig,
    pub proxy_manager_file: PathBuf,
    pub credentials: Credentials,
}

#[derive(Debug, Clone)]
pub struct ProxyManagerConfig {
    pub relay: RelayConfig,
    pub membership_file: PathBuf,
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite database file. It must already exist.
    pub path: PathBuf,
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrimaryConfig {
    pub relay: RelayConfig,
    pub membership_file: PathBuf,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub enum RoleConfig {
    Gatekeeper(GatekeeperConfig),
    TrustedHost(TrustedHostConfig),
    ProxyManager(ProxyManagerConfig),
    Primary(PrimaryConfig),
    Replica(ReplicaConfig),
}

impl RoleConfig {
    pub fn name(&self) -> &'static str {
        match self {
            RoleConfig::Gatekeeper(_) => "gatekeeper",
            RoleConfig::TrustedHost(_) => "trusted-host",
            RoleConfig::ProxyManager(_) => "proxy-manager",
            RoleConfig::Primary(_) => "primary",
            RoleConfig::Replica(_) => "replica",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub role: RoleConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_match_exactly() {
        let credentials = Credentials::new("admin", "secret");

        assert!(credentials.matches("admin", "secret"));
        assert!(!credentials.matches("admin", "Secret"));
        assert!(!credentials.matches("Admin", "secret"));
        assert!(!credentials.matches("admin", ""));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));

        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_relay_defaults() {
        let relay = RelayConfig::default();

        assert_eq!(relay.node_port, 80);
        assert_eq!(relay.forward_timeout, Duration::from_secs(30));
    }
}
