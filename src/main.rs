/// Baykeeper - cluster bay lifecycle
///
/// Reconciles declarative resource manifests against a cluster API endpoint
/// via kubectl, and maintains the catalog of bays and their child resources.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use baykeeper::config::ServiceConfig;
use baykeeper::kube::{KubeClient, KubeError, ResourceKind, ResourceManifest};
use baykeeper::store::{self, BayIdent, BayPatch, NewBay};
use baykeeper::utils::check_tool_installed;

#[derive(Parser)]
#[command(name = "baykeeper")]
#[command(about = "Manage cluster bays and reconcile their resources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "baykeeper.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration file
    Init,

    /// Manage the bay catalog
    Bay {
        #[command(subcommand)]
        command: BayCommands,
    },

    /// Reconcile resources against a cluster endpoint
    Resource {
        #[command(subcommand)]
        command: ResourceCommands,
    },
}

#[derive(Subcommand)]
enum BayCommands {
    /// Register a new bay
    Create {
        /// Bay name
        #[arg(long)]
        name: Option<String>,

        /// Referenced bay template
        #[arg(long)]
        baymodel_id: Option<String>,

        /// Number of nodes
        #[arg(long, default_value_t = 1)]
        node_count: i64,
    },

    /// Show a bay by id or uuid
    Get { ident: String },

    /// List bays, optionally filtered
    List {
        /// Filter by exact name
        #[arg(long)]
        name: Option<String>,

        /// Filter by bay template
        #[arg(long)]
        baymodel_id: Option<String>,

        /// Filter by node count
        #[arg(long)]
        node_count: Option<i64>,
    },

    /// Update a bay by id or uuid
    Update {
        ident: String,

        /// New bay name
        #[arg(long)]
        name: Option<String>,

        /// New bay template
        #[arg(long)]
        baymodel_id: Option<String>,

        /// New node count
        #[arg(long)]
        node_count: Option<i64>,

        /// New status
        #[arg(long)]
        status: Option<String>,
    },

    /// Destroy a bay and all of its dependent resources
    Delete { ident: String },
}

#[derive(Subcommand)]
enum ResourceCommands {
    /// Create a resource from a manifest
    Create {
        /// Resource kind: pod, service or rc
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Cluster API address
        #[arg(short = 's', long)]
        server: String,

        /// Manifest file to send inline
        #[arg(short, long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Manifest URL passed to kubectl as-is
        #[arg(long)]
        url: Option<String>,
    },

    /// Update a resource from a manifest
    Update {
        /// Resource kind: pod, service or rc
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Cluster API address
        #[arg(short = 's', long)]
        server: String,

        /// Manifest file to send inline
        #[arg(short, long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Manifest URL passed to kubectl as-is
        #[arg(long)]
        url: Option<String>,
    },

    /// Delete a named resource
    Delete {
        /// Resource kind: pod, service or rc
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Resource name
        name: String,

        /// Cluster API address
        #[arg(short = 's', long)]
        server: String,
    },
}

fn parse_kind(value: &str) -> Result<ResourceKind, String> {
    match value {
        "pod" => Ok(ResourceKind::Pod),
        "service" => Ok(ResourceKind::Service),
        "rc" => Ok(ResourceKind::ReplicationController),
        other => Err(format!(
            "unknown resource kind '{}', expected pod, service or rc",
            other
        )),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("baykeeper={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Init => init_config(&cli).await,
        Commands::Bay { ref command } => run_bay_command(&cli, command).await,
        Commands::Resource { ref command } => run_resource_command(&cli, command).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    if cli.config.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}",
            cli.config.display()
        );
    }

    let example_config = ServiceConfig::example();
    let yaml = serde_yaml::to_string(&example_config)?;

    tokio::fs::write(&cli.config, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", cli.config.display());
    Ok(())
}

/// Execute a bay catalog command
async fn run_bay_command(cli: &Cli, command: &BayCommands) -> Result<()> {
    let config = ServiceConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let pool = store::connect(&config.database_path()?)
        .await
        .context("Failed to open the bay catalog")?;

    match command {
        BayCommands::Create {
            name,
            baymodel_id,
            node_count,
        } => {
            let bay = store::bays::create_bay(
                &pool,
                NewBay {
                    uuid: None,
                    name: name.clone(),
                    baymodel_id: baymodel_id.clone(),
                    node_count: *node_count,
                    status: None,
                },
            )
            .await?;
            println!("{}", serde_yaml::to_string(&bay)?);
        }
        BayCommands::Get { ident } => {
            let bay = store::bays::get_bay(&pool, &BayIdent::parse(ident)).await?;
            println!("{}", serde_yaml::to_string(&bay)?);
        }
        BayCommands::List {
            name,
            baymodel_id,
            node_count,
        } => {
            let mut filters = HashMap::new();
            if let Some(name) = name {
                filters.insert("name".to_string(), name.clone());
            }
            if let Some(baymodel_id) = baymodel_id {
                filters.insert("baymodel_id".to_string(), baymodel_id.clone());
            }
            if let Some(node_count) = node_count {
                filters.insert("node_count".to_string(), node_count.to_string());
            }

            let bays = store::bays::list_bays(&pool, &filters).await?;
            if bays.is_empty() {
                info!("No bays found");
                return Ok(());
            }
            for bay in bays {
                info!(
                    "  - {} (id: {}, name: {}, nodes: {})",
                    bay.uuid,
                    bay.id,
                    bay.name.as_deref().unwrap_or("-"),
                    bay.node_count
                );
            }
        }
        BayCommands::Update {
            ident,
            name,
            baymodel_id,
            node_count,
            status,
        } => {
            let patch = BayPatch {
                uuid: None,
                name: name.clone(),
                baymodel_id: baymodel_id.clone(),
                node_count: *node_count,
                status: status.clone(),
            };
            let bay = store::bays::update_bay(&pool, &BayIdent::parse(ident), patch).await?;
            println!("{}", serde_yaml::to_string(&bay)?);
        }
        BayCommands::Delete { ident } => {
            store::bays::destroy_bay(&pool, &BayIdent::parse(ident)).await?;
            info!("Bay {} destroyed", ident);
        }
    }

    Ok(())
}

/// Execute a reconciliation command against a cluster endpoint
async fn run_resource_command(cli: &Cli, command: &ResourceCommands) -> Result<()> {
    let config = ServiceConfig::from_file(&cli.config).context("Failed to load configuration")?;

    check_tool_installed(
        &config.kube.kubectl_path,
        &["version", "--client"],
        "https://kubernetes.io/docs/tasks/tools/",
    )
    .await
    .context("kubectl is required")?;

    let client = KubeClient::new(&config.kube.kubectl_path);

    match command {
        ResourceCommands::Create {
            kind,
            server,
            file,
            url,
        } => {
            let resource = load_resource(file.as_deref(), url.as_deref()).await?;
            let ok = client.create(server, *kind, &resource).await?;
            report_outcome("create", *kind, ok)?;
        }
        ResourceCommands::Update {
            kind,
            server,
            file,
            url,
        } => {
            let resource = load_resource(file.as_deref(), url.as_deref()).await?;
            let ok = client.update(server, *kind, &resource).await?;
            report_outcome("update", *kind, ok)?;
        }
        ResourceCommands::Delete { kind, name, server } => {
            match client.delete(server, *kind, name).await {
                Ok(true) => info!("✓ {} {} deleted", kind, name),
                Ok(false) => anyhow::bail!("delete of {} {} failed", kind, name),
                Err(KubeError::NotFound { .. }) => {
                    info!("{} {} not found (already removed)", kind, name);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

/// Build the resource from a local file (sent inline) or a URL reference
async fn load_resource(file: Option<&std::path::Path>, url: Option<&str>) -> Result<ResourceManifest> {
    match (file, url) {
        (Some(path), _) => {
            let content = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read manifest {}", path.display()))?;
            Ok(ResourceManifest::inline(content))
        }
        (None, Some(url)) => Ok(ResourceManifest::reference(url)),
        (None, None) => anyhow::bail!("either --file or --url is required"),
    }
}

fn report_outcome(verb: &str, kind: ResourceKind, ok: bool) -> Result<()> {
    if ok {
        info!("✓ {} {} succeeded", verb, kind);
        Ok(())
    } else {
        anyhow::bail!("{} {} failed; check the cluster endpoint and manifest", verb, kind)
    }
}
