/// Configuration management for Baykeeper
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Bay catalog database
    pub database: DatabaseConfig,

    /// Kubernetes tool configuration
    #[serde(default)]
    pub kube: KubeConfig,
}

/// Bay catalog database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (can also be set via BAYKEEPER_DB env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Kubernetes tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubeConfig {
    /// Name or path of the kubectl binary to invoke
    #[serde(default = "default_kubectl")]
    pub kubectl_path: String,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            kubectl_path: default_kubectl(),
        }
    }
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

impl ServiceConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.kube.kubectl_path.is_empty() {
            anyhow::bail!("kube.kubectl_path cannot be empty");
        }
        Ok(())
    }

    /// Get the database path from config or environment
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        self.database
            .path
            .clone()
            .or_else(|| std::env::var("BAYKEEPER_DB").ok().map(PathBuf::from))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Database path not found. Set BAYKEEPER_DB environment variable or specify database.path in config"
                )
            })
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        Self {
            database: DatabaseConfig {
                path: Some(PathBuf::from("baykeeper.db")),
            },
            kube: KubeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_validates() {
        let config = ServiceConfig::example();
        assert!(config.validate().is_ok());
        assert_eq!(config.kube.kubectl_path, "kubectl");
    }

    #[test]
    fn test_empty_kubectl_path_is_invalid() {
        let mut config = ServiceConfig::example();
        config.kube.kubectl_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_yaml() {
        let config = ServiceConfig::example();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ServiceConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.database.path, config.database.path);
    }

    #[test]
    fn test_kube_section_is_optional() {
        let parsed: ServiceConfig = serde_yaml::from_str("database:\n  path: bays.db\n").unwrap();
        assert_eq!(parsed.kube.kubectl_path, "kubectl");
    }
}
