use crate::error::ConfigError;
use crate::render::ColorMode;
use crate::ripple::RippleSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// User configuration loaded from config file.
/// All fields are optional. CLI flags override config, config overrides defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ripple look and timing
    pub ripple: RippleSettings,
    /// Default color mode
    pub color_mode: Option<ColorMode>,
    /// Show one tile per ripple variant instead of a single tile
    pub gallery: Option<bool>,
    /// Seconds between random taps (0 = disabled)
    pub auto: Option<f64>,
    /// Hide status bar
    pub clean: Option<bool>,
    /// Color quantization step (0 = off, 4/8/16 = coarser colors for less output)
    pub color_quant: Option<u8>,
}

/// Get the config file path: ~/.config/termripple/config.toml
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("termripple").join("config.toml"))
}

/// Load config from the default location. A missing file yields defaults;
/// a malformed one is an error.
pub fn load_config() -> Result<Config, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config = parse_config(&contents)?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(contents)?)
}

/// Generate a default config file with all options commented out
pub fn default_config_string() -> String {
    r##"# termripple configuration
# Use --show-config to see the active config file path.
# CLI flags override these settings.

# Color mode: mono, ansi16, ansi256, true-color
# color_mode = "true-color"

# One tile per ripple variant
# gallery = true

# Seconds between random taps (0 = disabled)
# auto = 0.0

# Hide status bar
# clean = false

# Color quantization step (0 = off, 4/8/16 = coarser colors, less output)
# color_quant = 0

[ripple]
# Ripple color, #RRGGBB or #AARRGGBB
# color = "#FFFFFF"

# Variant: simple, double, rectangle
# variant = "simple"

# Run length and frame interval in milliseconds (both > 0)
# duration_ms = 400
# frame_interval_ms = 10

# Starting opacity of the ripple (0-255)
# alpha = 90

# Pixels taken off the maximum radius
# padding = 0.0

# Always start from the tile center
# centered = false

# Zoom pulse alongside the ripple
# zoom = false
# zoom_scale = 1.03
# zoom_duration_ms = 200
"##
    .to_string()
}
