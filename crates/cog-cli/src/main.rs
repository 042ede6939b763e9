mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cog", about = "Generate Docker images for machine learning models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a cog.toml in the current directory
    Init,
    /// Inspect what cog would build
    Debug {
        #[command(subcommand)]
        action: DebugAction,
    },
}

#[derive(Subcommand)]
enum DebugAction {
    /// Print the generated Dockerfile
    Dockerfile {
        /// Prebuilt cog wheel to stage into .cog/tmp/ before generating
        #[arg(long)]
        wheel: Option<PathBuf>,
        /// Write the Dockerfile to this path instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Print the Dockerfile and generated paths as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init_project()?,
        Commands::Debug { action } => match action {
            DebugAction::Dockerfile {
                wheel,
                output,
                json,
            } => commands::dockerfile(wheel.as_deref(), output.as_deref(), json)?,
        },
    }

    Ok(())
}
