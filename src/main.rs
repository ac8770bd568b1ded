//! Databend CLI
//!
//! Command-line interface for rendering glitched frames and animations.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use databend::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Databend v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Databend v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Render {
            input,
            output,
            settings,
            codec,
            config,
        } => commands::render(&input, &output, &settings, codec, config.as_deref())
            .with_context(|| format!("rendering {}", input.display())),
        Commands::Animate(args) => commands::animate(&args)
            .with_context(|| format!("animating {}", args.input.display())),
        Commands::Envelope {
            audio,
            fps,
            window,
            config,
        } => commands::envelope(&audio, fps, window, config.as_deref())
            .with_context(|| format!("reading envelope of {}", audio.display())),
    }
}
