//! modelsync CLI
//!
//! Command-line interface for fetching, editing and saving synced models.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modelsync_core::Config;

mod commands;
mod output;

use commands::model::KindArg;
use output::{Output, OutputFormat};

/// Log filter used when nothing else is configured
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "modelsync")]
#[command(about = "modelsync - keep client-side models in sync with JSON endpoints")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a model and print its attributes
    Fetch {
        /// Model kind
        #[arg(value_enum)]
        kind: KindArg,
        /// Read from this location instead of the kind's own
        #[arg(short, long)]
        location: Option<String>,
        /// Validate the fetched attributes before applying them
        #[arg(long)]
        validate: bool,
    },
    /// Fetch a model, set attributes, and save it back
    Set {
        /// Model kind
        #[arg(value_enum)]
        kind: KindArg,
        /// Attributes as key=value (values are parsed as JSON when possible)
        #[arg(required = true)]
        pairs: Vec<String>,
        /// Use this location for both fetch and save
        #[arg(short, long)]
        location: Option<String>,
        /// Validate the change before applying it
        #[arg(long)]
        validate: bool,
        /// Apply the change locally without saving
        #[arg(long)]
        no_save: bool,
    },
    /// Save a new model built from attributes
    Save {
        /// Model kind
        #[arg(value_enum)]
        kind: KindArg,
        /// Attributes as key=value (values are parsed as JSON when possible)
        pairs: Vec<String>,
        /// Write to this location instead of the kind's own
        #[arg(short, long)]
        location: Option<String>,
        /// Skip validation before writing
        #[arg(long)]
        no_validate: bool,
    },
    /// Dispatch a route fragment
    Route {
        /// Fragment such as "users" or "#/cars"
        fragment: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (base_url, data_dir, timeout_secs, log_level)
        key: String,
        /// Configuration value ("none" clears optional keys)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands must work even when the file cannot be loaded
    if let Commands::Config { command } = &cli.command {
        init_logging(cli.verbose, None);
        return match command.clone().unwrap_or(ConfigCommands::Show) {
            ConfigCommands::Show => commands::config::show(config_path, &output),
            ConfigCommands::Set { key, value } => {
                commands::config::set(&key, &value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(cli.verbose, config.log_level.as_deref());

    match cli.command {
        Commands::Fetch {
            kind,
            location,
            validate,
        } => commands::model::fetch(&config, kind, location, validate, &output).await,
        Commands::Set {
            kind,
            pairs,
            location,
            validate,
            no_save,
        } => {
            commands::model::set(&config, kind, &pairs, location, validate, !no_save, &output)
                .await
        }
        Commands::Save {
            kind,
            pairs,
            location,
            no_validate,
        } => commands::model::save(&config, kind, &pairs, location, !no_validate, &output).await,
        Commands::Route { fragment } => commands::route::dispatch(&fragment, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Install the stderr log subscriber
///
/// `-v` wins over the configured level, which wins over the default.
fn init_logging(verbose: u8, configured: Option<&str>) {
    let directive = match verbose {
        0 => configured.unwrap_or(DEFAULT_LOG_LEVEL).to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    // A bare level applies to our crates only, so dependencies stay quiet
    let directive = if directive.contains('=') {
        directive
    } else {
        format!("modelsync_core={0},modelsync={0}", directive)
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
