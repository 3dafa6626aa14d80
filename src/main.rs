use anyhow::Result;
use clap::{ColorChoice, Parser};
use glimpse::cli::{self, Cli, Commands};
use glimpse::config::{GlimpseConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    glimpse::logger::set_verbose(cli.verbose);

    init_config(GlimpseConfig::load(&cli)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Preview { args } => cli::preview::run_preview(args).await,
            Commands::Export { args } => cli::export::run_export(args).await,
        }
    });

    // A pending stdin read would otherwise hold the runtime open
    runtime.shutdown_background();
    result
}
