//! Command-line argument parsing for Terra.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terra command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Scroll-driven shaded globe")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Scrub catch-up time in seconds (0 = immediate).
    #[arg(long)]
    pub scrub_lag: Option<f32>,

    /// Directory containing day.jpg, night.jpg and specularClouds.jpg.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(lag) = args.scrub_lag {
            self.scroll.scrub_lag_seconds = lag.max(0.0);
        }
        if let Some(ref root) = args.assets {
            self.assets.rebase_textures(root);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            scrub_lag: Some(2.0),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.scroll.scrub_lag_seconds, 2.0);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_negative_scrub_lag_clamped() {
        let mut config = Config::default();
        let args = CliArgs {
            scrub_lag: Some(-1.0),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.scroll.scrub_lag_seconds, 0.0);
    }

    #[test]
    fn test_parse_from_args() {
        let args = CliArgs::parse_from(["terra", "--width", "800", "--assets", "/tmp/earth"]);
        assert_eq!(args.width, Some(800));
        assert_eq!(args.assets, Some(PathBuf::from("/tmp/earth")));
        assert!(args.height.is_none());
    }
}
