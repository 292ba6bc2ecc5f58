/// Kubernetes resource client over the kubectl CLI
use std::sync::Arc;
use tracing::{debug, warn};

use crate::kube::classify::{classify_apply, classify_delete, CommandStatus};
use crate::kube::manifest::{ManifestSource, ResourceManifest};
use crate::kube::{KubeError, ResourceKind};
use crate::utils::command::{CommandRunner, ProcessRunner};

/// Client for idempotent create/update/delete of cluster resources.
///
/// Holds no session state; a single instance is safe to share across
/// concurrent call sites.
pub struct KubeClient {
    tool: String,
    runner: Arc<dyn CommandRunner>,
}

impl KubeClient {
    /// Create a client invoking the given tool (normally "kubectl")
    pub fn new(tool: impl Into<String>) -> Self {
        Self::with_runner(tool, Arc::new(ProcessRunner))
    }

    /// Create a client with an injected command runner
    pub fn with_runner(tool: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            tool: tool.into(),
            runner,
        }
    }

    /// Create a resource on the cluster behind `api_address`.
    ///
    /// Returns true only when the tool ran cleanly. A tool that ran and
    /// reported an error and a tool that could not be invoked both collapse
    /// to false; callers cannot tell them apart.
    pub async fn create(
        &self,
        api_address: &str,
        kind: ResourceKind,
        resource: &ResourceManifest,
    ) -> Result<bool, KubeError> {
        self.apply("create", api_address, kind, resource).await
    }

    /// Update a resource on the cluster; same contract as [`Self::create`]
    pub async fn update(
        &self,
        api_address: &str,
        kind: ResourceKind,
        resource: &ResourceManifest,
    ) -> Result<bool, KubeError> {
        self.apply("update", api_address, kind, resource).await
    }

    async fn apply(
        &self,
        verb: &str,
        api_address: &str,
        kind: ResourceKind,
        resource: &ResourceManifest,
    ) -> Result<bool, KubeError> {
        let source = ManifestSource::from_resource(resource)?;
        let resolved = source.materialize()?;

        let args = vec![
            verb.to_string(),
            "-s".to_string(),
            api_address.to_string(),
            "-f".to_string(),
            resolved.reference().to_string(),
        ];
        debug!("{} {} via: {} {}", verb, kind, self.tool, args.join(" "));

        let status = match self.runner.run(&self.tool, &args).await {
            Ok(output) => {
                if !output.stderr.is_empty() {
                    warn!("{} {} reported: {}", verb, kind, output.stderr.trim());
                }
                classify_apply(Some(&output.stderr))
            }
            Err(err) => {
                warn!("could not invoke {}: {}", self.tool, err);
                classify_apply(None)
            }
        };

        // `resolved` drops here, removing any staged manifest file
        Ok(status == CommandStatus::Success)
    }

    /// Delete a named resource from the cluster.
    ///
    /// Returns true on success and false on a soft failure (including a tool
    /// that could not be invoked). A not-found report from the control plane
    /// is the one outcome raised as an error, carrying the resource kind so
    /// callers wanting idempotent deletes can catch it.
    pub async fn delete(
        &self,
        api_address: &str,
        kind: ResourceKind,
        name: &str,
    ) -> Result<bool, KubeError> {
        let args = vec![
            "delete".to_string(),
            kind.cli_name().to_string(),
            name.to_string(),
            "-s".to_string(),
            api_address.to_string(),
        ];
        debug!("delete {} {} via: {} {}", kind, name, self.tool, args.join(" "));

        let status = match self.runner.run(&self.tool, &args).await {
            Ok(output) => classify_delete(kind, name, Some(&output.stderr)),
            Err(err) => {
                warn!("could not invoke {}: {}", self.tool, err);
                classify_delete(kind, name, None)
            }
        };

        match status {
            CommandStatus::Success => Ok(true),
            CommandStatus::SoftFailure => Ok(false),
            CommandStatus::NotFound => Err(KubeError::NotFound {
                kind,
                name: name.to_string(),
            }),
        }
    }
}
