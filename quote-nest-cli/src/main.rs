use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod session_file;

use commands::{AuthCommand, ConfigCommand, Context, RandomCommand, SavedCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "qn")]
#[command(version)]
#[command(about = "Random quotes and your saved quote library", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, sign in and out
    Auth(AuthCommand),

    /// Fetch a random quote
    Random(RandomCommand),

    /// Manage saved quotes
    Saved(SavedCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("qn=warn,quote_nest_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let ctx = Context::load(config)?;
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create runtime: {}", e))?;

    rt.block_on(async {
        match &command {
            Commands::Auth(cmd) => cmd.run(&ctx).await,
            Commands::Random(cmd) => cmd.run(&ctx).await,
            Commands::Saved(cmd) => cmd.run(&ctx).await,
            Commands::Config(cmd) => cmd.run(&ctx.config),
        }
    })
}
