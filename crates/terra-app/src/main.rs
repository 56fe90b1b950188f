//! The binary entry point for Terra.

use clap::Parser;
use terra_config::{CliArgs, Config, default_config_dir};

fn main() {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone().map(Ok).unwrap_or_else(default_config_dir) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to resolve config directory: {e}");
            std::process::exit(1);
        }
    };

    let (mut config, load_error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    terra_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "using default config");
    }
    tracing::info!(config_dir = %config_dir.display(), "starting terra");

    if let Err(e) = terra_app::run(config) {
        tracing::error!(error = %e, "terra exited with an error");
        std::process::exit(1);
    }
}
