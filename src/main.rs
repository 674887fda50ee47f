use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build;
mod commands;
mod config;

#[derive(Parser)]
#[command(version, about = "Render a folder of org documents into a static site")]
struct Args {
    /// Log debug output (overrides RUST_LOG)
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: OrgsiteCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the site in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The input directory holding the org, templates and media folders
    #[arg(short, long)]
    input: PathBuf,

    /// The directory to write the site to
    #[arg(short, long)]
    output: PathBuf,

    /// The path to the configuration file (defaults to site.yaml in the input directory)
    #[arg(short, long = "config")]
    config_file: Option<PathBuf>,

    /// Skip documents that fail to build instead of aborting
    #[arg(short, long, default_value = "false")]
    keep_going: bool,
}

#[derive(Subcommand)]
enum OrgsiteCommand {
    /// Initialize a new site
    Init(InitArgs),

    /// Build the site
    Build(BuildArgs),
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // --verbose forces debug, otherwise RUST_LOG or info
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        OrgsiteCommand::Init(args) => {
            commands::init::run(&args)?;
        }
        OrgsiteCommand::Build(args) => {
            commands::build::run(&args)?;
        }
    }

    Ok(())
}
