mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "raos",
    about = "Turn app descriptions into RAOS behaviours and HTML mockups",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .raos/)
    #[arg(long, global = true, env = "RAOS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create a requirement from a description and extract its behaviours
    Extract {
        description: String,
        /// Owner id recorded on the requirement
        #[arg(long, default_value = "cli")]
        owner: String,
    },

    /// Generate (or print the stored) HTML mockup for a requirement
    Mockup {
        id: Uuid,
        /// Write the markup to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List requirements, newest first
    List {
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Case-insensitive search over app name and description
        #[arg(long, short = 'q')]
        query: Option<String>,
        /// Only show requirements created by this owner
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show one requirement
    Show { id: Uuid },

    /// Delete a requirement (owner only)
    Delete {
        id: Uuid,
        #[arg(long)]
        owner: String,
    },

    /// Inspect and initialise .raos/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Extract { description, owner } => {
            cmd::extract::run(&root, &description, &owner, cli.json)
        }
        Commands::Mockup { id, out } => cmd::mockup::run(&root, id, out.as_deref(), cli.json),
        Commands::List {
            page,
            limit,
            query,
            owner,
        } => cmd::list::run(&root, page, limit, query, owner, cli.json),
        Commands::Show { id } => cmd::show::run(&root, id, cli.json),
        Commands::Delete { id, owner } => cmd::delete::run(&root, id, &owner, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
