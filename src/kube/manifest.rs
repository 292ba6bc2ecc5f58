/// Manifest source resolution for reconciliation operations
use std::io::Write;
use tempfile::NamedTempFile;

use crate::kube::KubeError;

/// A resource definition as supplied by callers: inline content, a remote
/// reference, or (erroneously) neither.
#[derive(Debug, Clone, Default)]
pub struct ResourceManifest {
    /// Inline manifest content
    pub manifest: Option<Vec<u8>>,

    /// URL or path understood by kubectl's -f flag
    pub manifest_url: Option<String>,
}

impl ResourceManifest {
    /// Build a resource carrying inline content
    pub fn inline(content: impl Into<Vec<u8>>) -> Self {
        Self {
            manifest: Some(content.into()),
            manifest_url: None,
        }
    }

    /// Build a resource carrying a remote reference
    pub fn reference(url: impl Into<String>) -> Self {
        Self {
            manifest: None,
            manifest_url: Some(url.into()),
        }
    }
}

/// Which delivery path a resource definition uses.
///
/// Inline content takes precedence when both fields are populated; empty
/// content falls through to the reference.
#[derive(Debug, Clone)]
pub enum ManifestSource {
    Inline(Vec<u8>),
    Reference(String),
}

impl ManifestSource {
    /// Resolve the delivery path from a caller-supplied resource
    pub fn from_resource(resource: &ResourceManifest) -> Result<Self, KubeError> {
        if let Some(content) = &resource.manifest {
            if !content.is_empty() {
                return Ok(ManifestSource::Inline(content.clone()));
            }
        }
        match &resource.manifest_url {
            Some(url) if !url.is_empty() => Ok(ManifestSource::Reference(url.clone())),
            _ => Err(KubeError::MissingManifest),
        }
    }

    /// Produce the reference to hand to kubectl's -f flag.
    ///
    /// Inline content is written to a uniquely named temporary file owned by
    /// the returned [`ResolvedManifest`]; the file is removed when that value
    /// drops, whatever the outcome of the operation. Every call stages its
    /// own file, so concurrent operations never share an artifact.
    pub fn materialize(&self) -> Result<ResolvedManifest, KubeError> {
        match self {
            ManifestSource::Inline(content) => {
                let mut file = NamedTempFile::new()?;
                file.write_all(content)?;
                file.flush()?;
                let reference = file.path().to_string_lossy().into_owned();
                Ok(ResolvedManifest {
                    reference,
                    staged: Some(file),
                })
            }
            ManifestSource::Reference(url) => Ok(ResolvedManifest {
                reference: url.clone(),
                staged: None,
            }),
        }
    }
}

/// A manifest ready to pass to kubectl, keeping any staged temporary file
/// alive for the duration of the command.
#[derive(Debug)]
pub struct ResolvedManifest {
    reference: String,
    // Unlinks the staged file on drop
    staged: Option<NamedTempFile>,
}

impl ResolvedManifest {
    /// The -f argument: a staged temporary path or the reference verbatim
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Whether inline content was staged to a temporary file
    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_inline_takes_precedence_over_reference() {
        let resource = ResourceManifest {
            manifest: Some(b"kind: Pod".to_vec()),
            manifest_url: Some("http://example.com/pod.yaml".to_string()),
        };

        let source = ManifestSource::from_resource(&resource).unwrap();
        assert!(matches!(source, ManifestSource::Inline(_)));
    }

    #[test]
    fn test_empty_inline_falls_through_to_reference() {
        let resource = ResourceManifest {
            manifest: Some(Vec::new()),
            manifest_url: Some("http://example.com/pod.yaml".to_string()),
        };

        let source = ManifestSource::from_resource(&resource).unwrap();
        match source {
            ManifestSource::Reference(url) => assert_eq!(url, "http://example.com/pod.yaml"),
            other => panic!("expected reference, got {:?}", other),
        }
    }

    #[test]
    fn test_neither_field_is_a_contract_violation() {
        let resource = ResourceManifest::default();
        let result = ManifestSource::from_resource(&resource);
        assert!(matches!(result, Err(KubeError::MissingManifest)));
    }

    #[test]
    fn test_inline_content_staged_to_temp_file_and_removed_on_drop() {
        let source = ManifestSource::Inline(b"kind: Service".to_vec());
        let resolved = source.materialize().unwrap();

        assert!(resolved.is_staged());
        let path = resolved.reference().to_string();
        let staged = std::fs::read(&path).unwrap();
        assert_eq!(staged, b"kind: Service");

        drop(resolved);
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn test_each_materialization_mints_its_own_file() {
        let source = ManifestSource::Inline(b"kind: Pod".to_vec());
        let first = source.materialize().unwrap();
        let second = source.materialize().unwrap();
        assert_ne!(first.reference(), second.reference());
    }

    #[test]
    fn test_reference_passes_through_verbatim() {
        let source = ManifestSource::Reference("http://example.com/rc.yaml".to_string());
        let resolved = source.materialize().unwrap();

        assert!(!resolved.is_staged());
        assert_eq!(resolved.reference(), "http://example.com/rc.yaml");
    }
}
