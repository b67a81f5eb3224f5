use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::{MembershipView, NodeDescriptor};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error decoding JSON from {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {0} found in the configuration")]
    NoUpstream(&'static str),
}

/// Descriptor file handle. Every call to [`MembershipFile::load`] reads the
/// file again, so provisioning changes are picked up on the next request.
#[derive(Debug, Clone)]
pub struct MembershipFile {
    path: PathBuf,
}

impl MembershipFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<MembershipView, ConfigError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!("{} not found", self.path.display());
                return Err(ConfigError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(ConfigError::Unreadable {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        parse_descriptors(&raw)
            .map(MembershipView::new)
            .map_err(|source| {
                tracing::error!("Error decoding JSON from {}", self.path.display());
                ConfigError::Malformed {
                    path: self.path.clone(),
                    source,
                }
            })
    }

    /// Loads the file and returns its first descriptor.
    ///
    /// `role` only names the missing upstream in the error.
    pub async fn first(&self, role: &'static str) -> Result<NodeDescriptor, ConfigError> {
        let view = self.load().await?;
        view.first().cloned().ok_or_else(|| {
            tracing::error!("No {} IP found in the configuration", role);
            ConfigError::NoUpstream(role)
        })
    }
}

pub fn parse_descriptors(raw: &[u8]) -> Result<Vec<NodeDescriptor>, serde_json::Error> {
    serde_json::from_slice(raw)
}
