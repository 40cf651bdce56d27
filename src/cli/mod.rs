//! # Command Line Interface
//!
//! Manual front end of the compiler: compile a route or consumer bundle,
//! delete what a previous compile created, and decode a sidecar handoff
//! header for inspection.

pub mod compile;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{self, AppConfig};
use crate::handoff::{self, Handoff, JumperConfig, RoutingConfig};
use crate::observability::{init_observability, log_config_info};

use compile::{admin_client, handle_compile_command, CompileCommands};
use output::{print_output, OutputFormat};

#[derive(Parser)]
#[command(name = "routeplane")]
#[command(about = "Gateway configuration compiler")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Admin API URL override
    #[arg(long, global = true)]
    pub admin_url: Option<String>,

    /// Environment override
    #[arg(long, global = true)]
    pub environment: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a route or consumer into admin API calls
    Compile {
        #[command(subcommand)]
        command: CompileCommands,
    },

    /// Delete a compiled route or consumer from the gateway
    Delete {
        #[command(subcommand)]
        command: DeleteCommands,
    },

    /// Decode a jumper_config or routing_config header value
    Decode {
        /// `name:value` header entry or a bare base64 value
        value: String,
    },
}

#[derive(Subcommand)]
pub enum DeleteCommands {
    /// Delete a route, its service and its plugins
    Route {
        /// Route name
        name: String,
    },

    /// Delete a consumer and its plugins
    Consumer {
        /// Consumer name
        name: String,
    },
}

/// Run CLI commands
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.admin_url {
        config.admin.url = url;
    }
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    config.validate().context("Invalid configuration")?;

    let metrics = init_observability(&config.observability)?;
    log_config_info(&config);

    match cli.command {
        Commands::Compile { command } => {
            handle_compile_command(command, &config, metrics, cli.output).await
        }
        Commands::Delete { command } => handle_delete_command(command, &config).await,
        Commands::Decode { value } => print_output(&decode_handoff(&value)?, cli.output),
    }
}

async fn handle_delete_command(command: DeleteCommands, config: &AppConfig) -> Result<()> {
    let admin = admin_client(config, false)?;
    match command {
        DeleteCommands::Route { name } => {
            admin
                .delete_route(&name)
                .await
                .with_context(|| format!("Failed to delete route '{}'", name))?;
            info!(route = %name, "Route deleted");
        }
        DeleteCommands::Consumer { name } => {
            admin
                .delete_consumer(&name)
                .await
                .with_context(|| format!("Failed to delete consumer '{}'", name))?;
            info!(consumer = %name, "Consumer deleted");
        }
    }
    Ok(())
}

/// JSON view of a handoff header. A bare value is tried as a routing list first.
pub fn decode_handoff(value: &str) -> Result<serde_json::Value> {
    let value = value.trim();
    let handoff = if value.contains(':') {
        Handoff::from_header(value)?
    } else if let Ok(routing) = handoff::decode::<Vec<RoutingConfig>>(value) {
        Handoff::Routing(routing)
    } else {
        Handoff::Jumper(
            handoff::decode::<JumperConfig>(value).context("Value is not a handoff header")?,
        )
    };

    let json = match &handoff {
        Handoff::Jumper(config) => serde_json::to_value(config)?,
        Handoff::Routing(configs) => serde_json::to_value(configs)?,
    };
    Ok(serde_json::json!({ "header": handoff.header_name(), "config": json }))
}
