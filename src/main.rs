//! VSM Provisioner
//!
//! Command line entry point: loads a claim file and adds, reads or deletes
//! the Jiva VSM it describes through the provisioner registries.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vsm_provisioner::profile::labels;
use vsm_provisioner::{
    Claim, KubeClientConfig, KubeConnector, Registries, VolumeProvisioner, VolumeState,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// VSM Provisioner - Jiva block volumes on Kubernetes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Kubeconfig used when not running in-cluster; without it the standard
    /// KUBECONFIG lookup applies
    #[arg(long, global = true, env = "VSM_PROVISIONER_KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context
    #[arg(long, global = true, env = "KUBE_CONTEXT")]
    context: Option<String>,

    /// Timeout for each Kubernetes API call, in seconds
    #[arg(long, global = true, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,

    /// Format of the printed volume state
    #[arg(long, global = true, env = "OUTPUT", value_enum, default_value_t = Output::Json)]
    output: Output,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision the VSM described by a claim
    Add {
        /// Claim file (YAML or JSON)
        #[arg(long)]
        claim: PathBuf,
    },
    /// Read the state of the VSM described by a claim
    Read {
        #[arg(long)]
        claim: PathBuf,
    },
    /// Delete the VSM described by a claim
    Delete {
        #[arg(long)]
        claim: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Output {
    Json,
    Yaml,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("Starting VSM provisioner {}", vsm_provisioner::VERSION);

    let connector = KubeConnector::new(KubeClientConfig {
        kubeconfig: args.kubeconfig.clone(),
        context: args.context.clone(),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
    });
    let registries = Registries::with_defaults(Arc::new(connector));

    let claim_path = match &args.command {
        Command::Add { claim } | Command::Read { claim } | Command::Delete { claim } => claim,
    };
    let claim = Claim::from_file(claim_path)
        .with_context(|| format!("Failed to load claim {}", claim_path.display()))?;

    let provisioner_name = claim
        .label(labels::VOLUME_PROVISIONER_NAME)
        .unwrap_or(labels::DEFAULT_VOLUME_PROVISIONER)
        .to_string();
    let provisioner = registries.provisioners.get(&provisioner_name)?;

    let state = match &args.command {
        Command::Add { .. } => provisioner.add(&claim).await,
        Command::Read { .. } => provisioner.read(&claim).await,
        Command::Delete { .. } => provisioner.delete(&claim).await,
    }
    .with_context(|| format!("Claim '{}' failed via '{}'", claim.name, provisioner_name))?;

    print_state(&state, args.output)?;
    Ok(())
}

fn print_state(state: &VolumeState, output: Output) -> anyhow::Result<()> {
    let rendered = match output {
        Output::Json => serde_json::to_string_pretty(state)?,
        Output::Yaml => serde_yaml::to_string(state)?,
    };
    println!("{}", rendered);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("kube=info".parse()?);

    // Logs go to stderr so stdout carries only the volume state
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
