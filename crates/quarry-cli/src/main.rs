//! Quarry - repository chain inspector
//!
//! Usage:
//!   quarry check            # Validate quarry.toml and list repositories
//!   quarry plan             # Show the decorator stack of every repository
//!   quarry plan -f json     # Same, machine-readable

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarry_core::config::{ConfigStore, QuarryConfig, RepositoryConfig, RepositoryKind};
use quarry_core::factory::{RepositoryLayer, layer_plan};
use quarry_core::repository::ResolutionOverride;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Dependency repository chain inspector", long_about = None)]
struct Cli {
    /// Path to quarry.toml (defaults to ./quarry.toml, then the global config)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration, then list repositories
    Check,

    /// Print the decorator layers wrapped around each repository
    Plan {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Serialize)]
struct PlannedRepository<'a> {
    id: &'a str,
    kind: RepositoryKind,
    location: String,
    layers: Vec<RepositoryLayer>,
}

#[derive(Serialize)]
struct Plan<'a> {
    resolution: ResolutionOverride,
    repositories: Vec<PlannedRepository<'a>>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarry=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let store = match cli.config {
        Some(path) => ConfigStore::at(path),
        None => ConfigStore::discover()?,
    };
    tracing::debug!(path = %store.config_path().display(), "loading configuration");
    let config = store.load()?;

    match cli.command {
        Commands::Check => run_check(&store, &config),
        Commands::Plan { format } => run_plan(&config, format),
    }
}

fn run_check(store: &ConfigStore, config: &QuarryConfig) -> Result<()> {
    println!("Configuration OK: {}", store.config_path().display());
    if config.resolution.offline {
        println!("Offline mode: remote repositories answer from cache only");
    }
    if config.resolution.refresh_dependencies {
        println!("Refreshing dependencies: cached entries are treated as expired");
    }
    println!();

    if config.repositories.is_empty() {
        println!("No repositories configured.");
        println!("Declare one with a [[repository]] table in quarry.toml");
        return Ok(());
    }

    println!("{:<20} {:<8} {:<8} Location", "Id", "Kind", "Legacy");
    println!("{}", "-".repeat(70));
    for repository in &config.repositories {
        println!(
            "{:<20} {:<8} {:<8} {}",
            repository.id.as_str(),
            kind_str(repository.kind),
            if repository.legacy { "yes" } else { "no" },
            repository.location()
        );
    }
    Ok(())
}

fn run_plan(config: &QuarryConfig, format: OutputFormat) -> Result<()> {
    let plan = Plan {
        resolution: config.resolution,
        repositories: config.repositories.iter().map(plan_repository).collect(),
    };

    match format {
        OutputFormat::Table => print_plan_table(&plan),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

fn plan_repository(repository: &RepositoryConfig) -> PlannedRepository<'_> {
    PlannedRepository {
        id: repository.id.as_str(),
        kind: repository.kind,
        location: repository.location(),
        layers: layer_plan(
            repository.is_local(),
            repository.legacy,
            repository.dynamic_resolve,
        ),
    }
}

fn print_plan_table(plan: &Plan<'_>) {
    if plan.repositories.is_empty() {
        println!("No repositories configured.");
        return;
    }

    println!("{:<20} {:<8} Layers (innermost first)", "Id", "Kind");
    println!("{}", "-".repeat(90));
    for repository in &plan.repositories {
        let layers = repository
            .layers
            .iter()
            .map(|layer| match layer {
                RepositoryLayer::ResolutionOverride if plan.resolution.offline => {
                    format!("{layer}(offline)")
                }
                _ => layer.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" -> ");
        println!(
            "{:<20} {:<8} {}",
            repository.id,
            kind_str(repository.kind),
            layers
        );
    }
}

fn kind_str(kind: RepositoryKind) -> &'static str {
    match kind {
        RepositoryKind::Local => "local",
        RepositoryKind::Remote => "remote",
    }
}
