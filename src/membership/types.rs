use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Role a node plays in the deployment.
///
/// The aliases accept the tags written by the provisioning scripts, which name
/// database nodes after the MySQL master/slave layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RoleTag {
    #[serde(alias = "mysql_master_node")]
    Primary,
    #[serde(alias = "mysql_slave_node")]
    Replica,
    #[serde(alias = "proxy_manager_node")]
    ProxyManager,
    #[serde(alias = "trusted_host_node")]
    TrustedHost,
    #[serde(alias = "gatekeeper_node")]
    Gatekeeper,
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            RoleTag::Primary => "primary",
            RoleTag::Replica => "replica",
            RoleTag::ProxyManager => "proxy-manager",
            RoleTag::TrustedHost => "trusted-host",
            RoleTag::Gatekeeper => "gatekeeper",
        };
        f.write_str(tag)
    }
}

/// A single entry of a descriptor file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    #[serde(alias = "Name")]
    pub name: RoleTag,
    #[serde(alias = "InstanceID")]
    pub instance_id: String,
    #[serde(alias = "PublicIP")]
    pub public_address: String,
}

impl NodeDescriptor {
    /// `host:port` used to reach this node.
    ///
    /// An address that already carries a port is used verbatim, otherwise
    /// `default_port` is appended.
    pub fn authority(&self, default_port: u16) -> String {
        let address = self.public_address.trim();
        if address.parse::<SocketAddr>().is_ok() {
            return address.to_string();
        }
        match address.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, default_port),
            Ok(IpAddr::V4(ip)) => format!("{}:{}", ip, default_port),
            // hostname, possibly with its own port
            Err(_) if address.contains(':') => address.to_string(),
            Err(_) => format!("{}:{}", address, default_port),
        }
    }

    pub fn url(&self, default_port: u16, path: &str) -> String {
        format!("http://{}{}", self.authority(default_port), path)
    }

    pub fn is_primary(&self) -> bool {
        self.name == RoleTag::Primary
    }
}

/// Ordered snapshot of a descriptor file.
///
/// Built per request and dropped with it; nothing in the crate caches a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipView {
    nodes: Vec<NodeDescriptor>,
}

impl MembershipView {
    pub fn new(nodes: Vec<NodeDescriptor>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First descriptor, used by gateway hops whose file lists their single upstream.
    pub fn first(&self) -> Option<&NodeDescriptor> {
        self.nodes.first()
    }

    pub fn primaries(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.iter().filter(|node| node.is_primary())
    }

    /// Every node that is not tagged `primary`, in file order.
    pub fn non_primary(&self) -> Vec<&NodeDescriptor> {
        self.nodes.iter().filter(|node| !node.is_primary()).collect()
    }
}

impl From<Vec<NodeDescriptor>> for MembershipView {
    fn from(nodes: Vec<NodeDescriptor>) -> Self {
        Self::new(nodes)
    }
}
