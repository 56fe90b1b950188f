//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "terra";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Texture and shader asset locations.
    pub assets: AssetConfig,
    /// Scroll and scrub settings.
    pub scroll: ScrollConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// MSAA sample count (1 disables antialiasing, 4 is the usual setting).
    pub msaa_samples: u32,
    /// Clear color as linear RGBA.
    pub clear_color: [f64; 4],
    /// Forces a device pixel ratio instead of the window's scale factor.
    pub pixel_ratio_override: Option<f64>,
}

/// Asset locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Day albedo texture.
    pub day_texture: PathBuf,
    /// Night emissive texture.
    pub night_texture: PathBuf,
    /// Specular (red) and cloud (green) mask texture.
    pub specular_clouds_texture: PathBuf,
    /// Directory holding WGSL overrides. Embedded programs are used when unset.
    pub shader_dir: Option<PathBuf>,
}

/// Scroll-driven timeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrollConfig {
    /// Seconds the displayed progress takes to catch up with the scroll position.
    /// Zero applies scroll progress immediately.
    pub scrub_lag_seconds: f32,
    /// Logical pixels scrolled per mouse-wheel line.
    pub line_height_px: f64,
    /// Scrollable page length below the hero section, in logical pixels.
    pub tail_px: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Terra".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            pixel_ratio_override: None,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            day_texture: PathBuf::from("assets/earth/day.jpg"),
            night_texture: PathBuf::from("assets/earth/night.jpg"),
            specular_clouds_texture: PathBuf::from("assets/earth/specularClouds.jpg"),
            shader_dir: None,
        }
    }
}

impl AssetConfig {
    /// Rebase the three texture paths under `root`, keeping their file names.
    pub fn rebase_textures(&mut self, root: &Path) {
        for path in [
            &mut self.day_texture,
            &mut self.night_texture,
            &mut self.specular_clouds_texture,
        ] {
            if let Some(name) = path.file_name() {
                *path = root.join(name);
            }
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            scrub_lag_seconds: 0.0,
            line_height_px: 40.0,
            tail_px: 1080.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform configuration directory for Terra (`<os config dir>/terra`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save / Reload ---

/// File name of the persisted config inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ConfigError::Write { path, source }
        };
        std::fs::create_dir_all(config_dir).map_err(write_error(config_dir))?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(write_error(&config_path))?;
        Ok(())
    }

    /// Re-read the file. Returns `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("msaa_samples: 4"));
        assert!(ron_str.contains("day.jpg"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.render.pixel_ratio_override = Some(2.0);
        config.assets.shader_dir = Some(PathBuf::from("shaders"));
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), render: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.scroll, ScrollConfig::default());
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_clear_color_is_opaque_white() {
        assert_eq!(RenderConfig::default().clear_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_default_scrub_is_immediate() {
        assert_eq!(ScrollConfig::default().scrub_lag_seconds, 0.0);
    }

    #[test]
    fn test_rebase_textures_keeps_file_names() {
        let mut assets = AssetConfig::default();
        assets.rebase_textures(Path::new("/srv/globe"));
        assert_eq!(assets.day_texture, PathBuf::from("/srv/globe/day.jpg"));
        assert_eq!(assets.night_texture, PathBuf::from("/srv/globe/night.jpg"));
        assert_eq!(
            assets.specular_clouds_texture,
            PathBuf::from("/srv/globe/specularClouds.jpg")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.window.height = 1080;
        config.scroll.scrub_lag_seconds = 2.0;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.scroll.line_height_px = 100.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().scroll.line_height_px, 100.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "(window: (width: \"wide\"))").unwrap();
        match Config::load_or_create(dir.path()) {
            Err(ConfigError::Parse { path, .. }) => {
                assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
