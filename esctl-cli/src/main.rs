mod commands;
mod output;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use commands::Context;
use esctl::allocation::ExplainRequest;
use esctl::{
    AgentPolicyUpdate, AgentQuery, Config, NewAgentPolicy, NewPackagePolicy, NewSnapshot,
    OutputFormat, PackagePolicyUpdate, PackageRef, RestoreRequest,
};
use output::Formatter;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "esctl")]
#[command(about = "esctl - drain nodes, manage allocation, snapshots and Fleet policies")]
#[command(version)]
struct Cli {
    /// Config file path (default: ./esctl.toml, ~/.config/esctl/config.toml, /etc/esctl/config.toml)
    #[arg(long, global = true, env = "ESCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, env = "ESCTL_FORMAT")]
    format: Option<OutputFormat>,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection overrides; each wins over the config file
#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// Elasticsearch addresses (comma-separated)
    #[arg(long, global = true, env = "ESCTL_ES_ADDRESSES", value_delimiter = ',')]
    es_addresses: Vec<String>,

    #[arg(long, global = true, env = "ESCTL_ES_USERNAME")]
    es_username: Option<String>,

    #[arg(long, global = true, env = "ESCTL_ES_PASSWORD", hide_env_values = true)]
    es_password: Option<String>,

    /// PEM CA bundle for Elasticsearch
    #[arg(long, global = true, env = "ESCTL_ES_CA_CERT")]
    es_ca_cert: Option<PathBuf>,

    /// Skip TLS certificate validation for Elasticsearch (insecure)
    #[arg(long, global = true, env = "ESCTL_ES_INSECURE")]
    es_insecure: bool,

    /// Kibana addresses (comma-separated)
    #[arg(long, global = true, env = "ESCTL_KB_ADDRESSES", value_delimiter = ',')]
    kb_addresses: Vec<String>,

    #[arg(long, global = true, env = "ESCTL_KB_USERNAME")]
    kb_username: Option<String>,

    #[arg(long, global = true, env = "ESCTL_KB_PASSWORD", hide_env_values = true)]
    kb_password: Option<String>,

    /// PEM CA bundle for Kibana
    #[arg(long, global = true, env = "ESCTL_KB_CA_CERT")]
    kb_ca_cert: Option<PathBuf>,

    /// Skip TLS certificate validation for Kibana (insecure)
    #[arg(long, global = true, env = "ESCTL_KB_INSECURE")]
    kb_insecure: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drain a node or see which nodes are draining
    Drain {
        #[command(subcommand)]
        action: DrainCommand,
    },

    /// Return drained nodes to shard allocation
    Fill {
        #[command(subcommand)]
        action: FillCommand,
    },

    /// Manage Fleet agent policies
    #[command(name = "agent_policy", alias = "agent-policy")]
    AgentPolicy {
        #[command(subcommand)]
        action: AgentPolicyCommand,
    },

    /// Manage Fleet package policies (integrations)
    #[command(name = "package_policy", alias = "package-policy")]
    PackagePolicy {
        #[command(subcommand)]
        action: PackagePolicyCommand,
    },

    /// List, inspect, update and reassign Fleet agents
    Agents {
        #[command(subcommand)]
        action: AgentsCommand,
    },

    /// Manage snapshot repositories
    #[command(alias = "repo")]
    Repository {
        #[command(subcommand)]
        action: RepositoryCommand,
    },

    /// Take, list, delete and restore snapshots
    Snapshot {
        #[command(subcommand)]
        action: SnapshotCommand,
    },

    /// Cluster-wide shard allocation
    Allocation {
        #[command(subcommand)]
        action: AllocationCommand,
    },

    /// Read and write cluster settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Check connectivity
    Ping {
        #[command(subcommand)]
        target: PingTarget,
    },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DrainCommand {
    /// Exclude a node from shard allocation so its shards move away
    Server {
        /// Node name
        #[arg(short, long)]
        name: String,

        /// Stop draining the node instead of starting it
        #[arg(short, long)]
        stop: bool,
    },

    /// Show the nodes currently excluded from allocation
    Status,
}

#[derive(Subcommand, Debug)]
enum FillCommand {
    /// Remove a single node from the exclusion list
    Server {
        /// Node name
        #[arg(short, long)]
        name: String,
    },

    /// Clear every persistent exclusion
    All,
}

#[derive(Subcommand, Debug)]
enum AgentPolicyCommand {
    /// List agent policies
    List,

    /// Create an agent policy
    Create {
        /// Custom policy ID (lowercase letters, digits, '-' and '_', max 36 chars)
        #[arg(long)]
        policy_id: Option<String>,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "default")]
        namespace: String,

        #[arg(long)]
        description: Option<String>,

        /// Monitoring to enable (comma-separated, e.g. logs,metrics)
        #[arg(long, value_delimiter = ',')]
        monitoring: Vec<String>,
    },

    /// Update fields of an existing policy
    Update {
        #[arg(long)]
        policy_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        namespace: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_delimiter = ',')]
        monitoring: Option<Vec<String>>,
    },

    /// Delete an agent policy
    Delete {
        #[arg(long)]
        policy_id: String,

        /// Reassign bound agents to the default policy before deleting
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AgentsCommand {
    /// List agents
    List {
        /// KQL filter, e.g. 'policy_id:"web"'
        #[arg(long)]
        kuery: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        per_page: u32,

        /// Include inactive and unenrolled agents
        #[arg(long)]
        show_inactive: bool,
    },

    /// Show one agent
    Get {
        #[arg(long)]
        agent_id: String,
    },

    /// Replace an agent's tags or user metadata
    Update {
        #[arg(long)]
        agent_id: String,

        /// Tags (comma-separated); replaces the current tags
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// JSON file holding the user metadata object
        #[arg(long)]
        metadata_file: Option<PathBuf>,
    },

    /// Delete an agent record
    Delete {
        #[arg(long)]
        agent_id: String,

        #[arg(long)]
        force: bool,
    },

    /// Move one agent to another policy
    Reassign {
        #[arg(long)]
        agent_id: String,

        #[arg(long)]
        policy_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum PackagePolicyCommand {
    /// List package policies
    List,

    /// Attach an integration to an agent policy
    Create {
        /// Custom package policy ID
        #[arg(long)]
        package_policy_id: Option<String>,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, default_value = "default")]
        namespace: String,

        /// Agent policy to attach to
        #[arg(long)]
        policy_id: String,

        /// Integration package name, e.g. nginx
        #[arg(long)]
        package: String,

        #[arg(long)]
        package_version: String,

        /// JSON file with the integration inputs
        #[arg(long)]
        config_json: Option<PathBuf>,
    },

    /// Update fields of an existing package policy
    Update {
        #[arg(long)]
        package_policy_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        namespace: Option<String>,

        /// JSON file with replacement inputs
        #[arg(long)]
        config_json: Option<PathBuf>,
    },

    /// Delete a package policy
    Delete {
        #[arg(long)]
        package_policy_id: String,

        /// Delete even if the integration is managed
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum RepositoryCommand {
    /// List registered repositories
    List,

    /// Register or update a repository
    Register {
        #[arg(long)]
        repository: String,

        /// Repository type, e.g. fs, s3, gcs, azure, url
        #[arg(long = "type", default_value = "fs")]
        repo_type: String,

        /// key=value settings (comma-separated), e.g. location=/mnt/backups,compress=true
        #[arg(long, value_delimiter = ',')]
        settings: Vec<String>,

        /// Skip the node verification Elasticsearch runs on registration
        #[arg(long)]
        no_verify: bool,
    },

    /// Check every node can access the repository
    Verify {
        #[arg(long)]
        repository: String,
    },

    /// Unregister a repository (its snapshots stay in storage)
    Remove {
        #[arg(long)]
        repository: String,
    },
}

#[derive(Subcommand, Debug)]
enum SnapshotCommand {
    /// List snapshots in a repository
    List {
        #[arg(long)]
        repository: String,
    },

    /// Take a snapshot
    Create {
        #[arg(long)]
        repository: String,

        #[arg(long)]
        name: String,

        /// Index patterns (comma-separated); all indices when omitted
        #[arg(long, value_delimiter = ',')]
        indices: Vec<String>,

        /// Leave the cluster state out of the snapshot
        #[arg(long)]
        no_global_state: bool,

        /// Wait until the snapshot completes
        #[arg(long)]
        wait: bool,
    },

    /// Delete a snapshot
    Delete {
        #[arg(long)]
        repository: String,

        #[arg(long)]
        name: String,
    },

    /// Restore a snapshot
    Restore {
        #[arg(long)]
        repository: String,

        #[arg(long)]
        name: String,

        #[arg(long, value_delimiter = ',')]
        indices: Vec<String>,

        /// Regex matched against restored index names
        #[arg(long)]
        rename_pattern: Option<String>,

        /// Replacement for --rename-pattern, e.g. restored-$1
        #[arg(long)]
        rename_replacement: Option<String>,

        #[arg(long)]
        wait: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AllocationCommand {
    /// Show the effective allocation status
    Status,

    /// Set allocation to all, primaries, new_primaries or none
    Set {
        #[arg(long)]
        status: String,
    },

    /// Explain why a shard is or is not allocated
    Explain {
        #[arg(long)]
        index: Option<String>,

        #[arg(long)]
        shard: Option<u32>,

        #[arg(long)]
        primary: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// List transient and persistent settings
    List {
        /// Include defaults
        #[arg(long)]
        defaults: bool,
    },

    /// Show one setting and where its value comes from
    Get {
        #[arg(long)]
        name: String,

        #[arg(long)]
        defaults: bool,
    },

    /// Set a setting
    Set {
        #[arg(long)]
        name: String,

        #[arg(long)]
        value: String,

        /// transient or persistent
        #[arg(long = "type", default_value = "persistent")]
        scope: String,
    },

    /// Reset a setting to its default
    Reset {
        #[arg(long)]
        name: String,

        #[arg(long = "type", default_value = "persistent")]
        scope: String,
    },
}

#[derive(Subcommand, Debug)]
enum PingTarget {
    /// Cluster info and health summary
    Es,
    /// Kibana status
    Kibana,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective configuration (passwords masked)
    Show,

    /// Write a default configuration file
    Init {
        /// Target file (default: ~/.config/esctl/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    let conn = &cli.connection;

    if !conn.es_addresses.is_empty() {
        config.elasticsearch.addresses = conn.es_addresses.clone();
    }
    if conn.es_username.is_some() {
        config.elasticsearch.username = conn.es_username.clone();
    }
    if conn.es_password.is_some() {
        config.elasticsearch.password = conn.es_password.clone();
    }
    if conn.es_ca_cert.is_some() {
        config.elasticsearch.ca_cert = conn.es_ca_cert.clone();
    }
    if conn.es_insecure {
        config.elasticsearch.insecure = true;
    }

    if !conn.kb_addresses.is_empty() {
        config.kibana.addresses = conn.kb_addresses.clone();
    }
    if conn.kb_username.is_some() {
        config.kibana.username = conn.kb_username.clone();
    }
    if conn.kb_password.is_some() {
        config.kibana.password = conn.kb_password.clone();
    }
    if conn.kb_ca_cert.is_some() {
        config.kibana.ca_cert = conn.kb_ca_cert.clone();
    }
    if conn.kb_insecure {
        config.kibana.insecure = true;
    }

    if let Some(format) = cli.format {
        config.output.format = format;
    }
}

/// Logs go to stderr; RUST_LOG wins over the configured level.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    result.context("error initializing logging")
}

async fn run(cli: Cli, ctx: Context) -> Result<()> {
    match cli.command {
        Commands::Drain { action } => match action {
            DrainCommand::Server { name, stop } => {
                commands::drain::run_drain_server(&ctx, &name, stop).await
            }
            DrainCommand::Status => commands::drain::run_drain_status(&ctx).await,
        },
        Commands::Fill { action } => match action {
            FillCommand::Server { name } => commands::fill::run_fill_server(&ctx, &name).await,
            FillCommand::All => commands::fill::run_fill_all(&ctx).await,
        },
        Commands::AgentPolicy { action } => match action {
            AgentPolicyCommand::List => commands::agent_policy::run_list(&ctx).await,
            AgentPolicyCommand::Create {
                policy_id,
                name,
                namespace,
                description,
                monitoring,
            } => {
                let policy = NewAgentPolicy {
                    id: policy_id.filter(|id| !id.is_empty()),
                    name,
                    namespace,
                    description,
                    monitoring_enabled: monitoring,
                };
                commands::agent_policy::run_create(&ctx, policy).await
            }
            AgentPolicyCommand::Update {
                policy_id,
                name,
                namespace,
                description,
                monitoring,
            } => {
                let update = AgentPolicyUpdate {
                    name,
                    namespace,
                    description,
                    monitoring_enabled: monitoring,
                };
                commands::agent_policy::run_update(&ctx, &policy_id, update).await
            }
            AgentPolicyCommand::Delete { policy_id, force } => {
                commands::agent_policy::run_delete(&ctx, &policy_id, force).await
            }
        },
        Commands::Agents { action } => match action {
            AgentsCommand::List {
                kuery,
                page,
                per_page,
                show_inactive,
            } => {
                let query = AgentQuery {
                    kuery,
                    page,
                    per_page,
                    show_inactive,
                };
                commands::agents::run_list(&ctx, query).await
            }
            AgentsCommand::Get { agent_id } => commands::agents::run_get(&ctx, &agent_id).await,
            AgentsCommand::Update {
                agent_id,
                tags,
                metadata_file,
            } => {
                commands::agents::run_update(&ctx, &agent_id, tags, metadata_file.as_deref())
                    .await
            }
            AgentsCommand::Delete { agent_id, force } => {
                commands::agents::run_delete(&ctx, &agent_id, force).await
            }
            AgentsCommand::Reassign {
                agent_id,
                policy_id,
            } => commands::agents::run_reassign(&ctx, &agent_id, &policy_id).await,
        },
        Commands::PackagePolicy { action } => match action {
            PackagePolicyCommand::List => commands::package_policy::run_list(&ctx).await,
            PackagePolicyCommand::Create {
                package_policy_id,
                name,
                description,
                namespace,
                policy_id,
                package,
                package_version,
                config_json,
            } => {
                let policy = NewPackagePolicy {
                    id: package_policy_id.filter(|id| !id.is_empty()),
                    name,
                    description,
                    namespace,
                    policy_id,
                    package: PackageRef {
                        name: package,
                        version: package_version,
                        title: None,
                    },
                    inputs: serde_json::json!({}),
                };
                commands::package_policy::run_create(&ctx, policy, config_json.as_deref()).await
            }
            PackagePolicyCommand::Update {
                package_policy_id,
                name,
                description,
                namespace,
                config_json,
            } => {
                let update = PackagePolicyUpdate {
                    name,
                    description,
                    namespace,
                    inputs: None,
                };
                commands::package_policy::run_update(
                    &ctx,
                    &package_policy_id,
                    update,
                    config_json.as_deref(),
                )
                .await
            }
            PackagePolicyCommand::Delete {
                package_policy_id,
                force,
            } => commands::package_policy::run_delete(&ctx, &package_policy_id, force).await,
        },
        Commands::Repository { action } => match action {
            RepositoryCommand::List => commands::repository::run_list(&ctx).await,
            RepositoryCommand::Register {
                repository,
                repo_type,
                settings,
                no_verify,
            } => {
                commands::repository::run_register(
                    &ctx,
                    &repository,
                    &repo_type,
                    &settings,
                    !no_verify,
                )
                .await
            }
            RepositoryCommand::Verify { repository } => {
                commands::repository::run_verify(&ctx, &repository).await
            }
            RepositoryCommand::Remove { repository } => {
                commands::repository::run_remove(&ctx, &repository).await
            }
        },
        Commands::Snapshot { action } => match action {
            SnapshotCommand::List { repository } => {
                commands::snapshot::run_list(&ctx, &repository).await
            }
            SnapshotCommand::Create {
                repository,
                name,
                indices,
                no_global_state,
                wait,
            } => {
                let snapshot = NewSnapshot {
                    repository,
                    name,
                    indices,
                    include_global_state: !no_global_state,
                    wait_for_completion: wait,
                };
                commands::snapshot::run_create(&ctx, snapshot).await
            }
            SnapshotCommand::Delete { repository, name } => {
                commands::snapshot::run_delete(&ctx, &repository, &name).await
            }
            SnapshotCommand::Restore {
                repository,
                name,
                indices,
                rename_pattern,
                rename_replacement,
                wait,
            } => {
                let restore = RestoreRequest {
                    repository,
                    name,
                    indices,
                    rename_pattern,
                    rename_replacement,
                    wait_for_completion: wait,
                };
                commands::snapshot::run_restore(&ctx, restore).await
            }
        },
        Commands::Allocation { action } => match action {
            AllocationCommand::Status => commands::allocation::run_status(&ctx).await,
            AllocationCommand::Set { status } => {
                commands::allocation::run_set(&ctx, &status).await
            }
            AllocationCommand::Explain {
                index,
                shard,
                primary,
            } => {
                let request = ExplainRequest {
                    index,
                    shard,
                    primary,
                };
                commands::allocation::run_explain(&ctx, request).await
            }
        },
        Commands::Settings { action } => match action {
            SettingsCommand::List { defaults } => {
                commands::settings::run_list(&ctx, defaults).await
            }
            SettingsCommand::Get { name, defaults } => {
                commands::settings::run_get(&ctx, &name, defaults).await
            }
            SettingsCommand::Set { name, value, scope } => {
                commands::settings::run_set(&ctx, &name, &value, &scope).await
            }
            SettingsCommand::Reset { name, scope } => {
                commands::settings::run_reset(&ctx, &name, &scope).await
            }
        },
        Commands::Ping { target } => match target {
            PingTarget::Es => commands::ping::run_ping_es(&ctx).await,
            PingTarget::Kibana => commands::ping::run_ping_kibana(&ctx).await,
        },
        Commands::Config { action } => match action {
            ConfigCommand::Show => commands::config::run_show(&ctx),
            ConfigCommand::Init { path, force } => {
                commands::config::run_init(path.as_deref(), force)
            }
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_path) =
        Config::load(cli.config.as_deref()).context("failed to load config")?;
    apply_overrides(&mut config, &cli);
    init_logging(&config)?;

    if let Some(ref path) = config_path {
        tracing::debug!(path = %path.display(), "Using config file");
    }

    let ctx = Context {
        formatter: Formatter::new(config.output.format),
        config,
        config_path,
    };
    run(cli, ctx).await
}
