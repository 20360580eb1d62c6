mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "leadflow",
    about = "CRM lead pipeline backend: API server, message generation and offline checks",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest leadflow.yaml upward from cwd)
    #[arg(long, global = true, env = "LEADFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on (overrides server.port; 0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Keep everything in memory instead of Postgres
        #[arg(long)]
        memory: bool,

        /// Seed a demo workspace (requires --memory)
        #[arg(long, requires = "memory")]
        seed: bool,
    },

    /// Apply database migrations
    Migrate,

    /// Generate message variants for a lead under a campaign
    Generate {
        #[arg(long)]
        lead: Uuid,
        #[arg(long)]
        campaign: Uuid,
    },

    /// Run the stage auto-trigger for a lead and wait for the result
    Trigger {
        #[arg(long)]
        lead: Uuid,
        #[arg(long)]
        stage: Uuid,
    },

    /// Check offline whether a lead may enter a stage
    CheckMove {
        /// Lead JSON file
        #[arg(long)]
        lead: PathBuf,
        /// Stage JSON file: {"name": ..., "required_fields": [...]}
        #[arg(long)]
        stage: PathBuf,
    },

    /// Print the prompt that would be sent for a lead and campaign
    Prompt {
        /// Lead JSON file
        #[arg(long)]
        lead: PathBuf,
        /// Campaign JSON file
        #[arg(long)]
        campaign: PathBuf,
        /// Stage name shown to the model
        #[arg(long)]
        stage_name: Option<String>,
    },

    /// Inspect, validate or create the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Migrate => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config_path = root::resolve_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Serve {
            port,
            host,
            memory,
            seed,
        } => cmd::serve::run(&config_path, host, port, memory, seed),
        Commands::Migrate => cmd::migrate::run(&config_path),
        Commands::Generate { lead, campaign } => {
            cmd::generate::run(&config_path, lead, campaign, cli.json)
        }
        Commands::Trigger { lead, stage } => {
            cmd::generate::run_trigger(&config_path, lead, stage, cli.json)
        }
        Commands::CheckMove { lead, stage } => cmd::check::run(&lead, &stage, cli.json),
        Commands::Prompt {
            lead,
            campaign,
            stage_name,
        } => cmd::prompt::run(&lead, &campaign, stage_name.as_deref(), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
