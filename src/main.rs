//! Infragraph CLI entry point

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "infragraph")]
#[command(about = "Infrastructure graphs from Terraform state and configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph of a state file or configuration directory and print it as JSON
    Generate(GenerateArgs),
    /// List the provider namespaces that are understood
    Providers,
    /// Show version
    Version,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// State file, `.tf` file or configuration directory
    pub path: PathBuf,

    /// Treat the input as HCL configuration
    #[arg(long, conflicts_with = "tfstate")]
    pub hcl: bool,

    /// Treat the input as a Terraform state file
    #[arg(long)]
    pub tfstate: bool,

    /// Keep mediating resources as nodes instead of contracting them
    #[arg(long)]
    pub raw: bool,

    /// Ignore mediating resources entirely
    #[arg(long)]
    pub no_connections: bool,

    /// Do not add `im_out.*` nodes for open ingress
    #[arg(long)]
    pub no_external_nodes: bool,

    /// TOML file with generation options
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("infragraph={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate(args) => commands::generate(args),
        Commands::Providers => commands::providers(),
        Commands::Version => {
            println!("infragraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
