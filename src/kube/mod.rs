/// Kubernetes resource reconciliation via the kubectl CLI
pub mod classify;
pub mod client;
pub mod manifest;

pub use classify::{classify_apply, classify_delete, CommandStatus};
pub use client::KubeClient;
pub use manifest::{ManifestSource, ResolvedManifest, ResourceManifest};

use std::fmt;
use thiserror::Error;

/// Resource kinds managed on the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Pod,
    Service,
    ReplicationController,
}

impl ResourceKind {
    /// Token passed to kubectl and matched in its error output
    pub fn cli_name(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Service => "service",
            ResourceKind::ReplicationController => "rc",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

/// Errors surfaced by the kube client.
///
/// Soft failures and invocation failures are deliberately absent: create,
/// update and delete report those through their boolean return value.
#[derive(Debug, Error)]
pub enum KubeError {
    /// Caller supplied a resource with neither inline content nor a reference
    #[error("resource has neither inline manifest content nor a manifest reference")]
    MissingManifest,

    /// The cluster reported the deletion target missing
    #[error("{kind} \"{name}\" not found on the cluster")]
    NotFound { kind: ResourceKind, name: String },

    /// Inline manifest content could not be written to a temporary file
    #[error("failed to stage manifest content: {0}")]
    ManifestIo(#[from] std::io::Error),
}
