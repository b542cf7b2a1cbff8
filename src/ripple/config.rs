use crate::error::ConfigError;
use image::Rgba;
use serde::Deserialize;

/// Shape and behavior of a ripple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RippleVariant {
    /// Single circle fading over the whole run
    #[default]
    Simple,
    /// Circle that is erased back toward the original content in a second stage
    Double,
    /// Circle sized to the full extent of the surface instead of half of it
    Rectangle,
}

impl RippleVariant {
    pub const ALL: [RippleVariant; 3] = [Self::Simple, Self::Double, Self::Rectangle];

    pub fn name(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Double => "double",
            Self::Rectangle => "rectangle",
        }
    }
}

/// Validated ripple parameters, fixed for the duration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RippleConfig {
    pub color: Rgba<u8>,
    pub variant: RippleVariant,
    pub duration_ms: u32,
    pub frame_interval_ms: u32,
    pub alpha: u8,
    pub padding: f32,
    pub centered: bool,
    pub zoom: bool,
    pub zoom_scale: f32,
    pub zoom_duration_ms: u32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        RippleConfig {
            color: Rgba([255, 255, 255, 255]),
            variant: RippleVariant::Simple,
            duration_ms: 400,
            frame_interval_ms: 10,
            alpha: 90,
            padding: 0.0,
            centered: false,
            zoom: false,
            zoom_scale: 1.03,
            zoom_duration_ms: 200,
        }
    }
}

impl RippleConfig {
    /// Number of frames drawn before the completion step.
    pub fn frames_per_run(&self) -> u32 {
        self.duration_ms.div_ceil(self.frame_interval_ms)
    }
}

/// Raw, unvalidated ripple settings as they appear in the config file,
/// on the command line, or in an external command.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RippleSettings {
    pub color: Option<String>,
    pub variant: Option<RippleVariant>,
    pub duration_ms: Option<i64>,
    pub frame_interval_ms: Option<i64>,
    pub alpha: Option<i64>,
    pub padding: Option<f32>,
    pub centered: Option<bool>,
    pub zoom: Option<bool>,
    pub zoom_scale: Option<f32>,
    pub zoom_duration_ms: Option<i64>,
}

impl RippleSettings {
    /// Layer `over` on top of `self`; fields set in `over` win.
    pub fn merged(self, over: RippleSettings) -> RippleSettings {
        RippleSettings {
            color: over.color.or(self.color),
            variant: over.variant.or(self.variant),
            duration_ms: over.duration_ms.or(self.duration_ms),
            frame_interval_ms: over.frame_interval_ms.or(self.frame_interval_ms),
            alpha: over.alpha.or(self.alpha),
            padding: over.padding.or(self.padding),
            centered: over.centered.or(self.centered),
            zoom: over.zoom.or(self.zoom),
            zoom_scale: over.zoom_scale.or(self.zoom_scale),
            zoom_duration_ms: over.zoom_duration_ms.or(self.zoom_duration_ms),
        }
    }

    /// Apply these settings on top of `base`, rejecting anything invalid.
    pub fn resolve(&self, base: &RippleConfig) -> Result<RippleConfig, ConfigError> {
        let mut config = base.clone();

        if let Some(ref s) = self.color {
            config.color = parse_color(s)?;
        }
        if let Some(v) = self.variant {
            config.variant = v;
        }
        if let Some(ms) = self.duration_ms {
            config.duration_ms = positive_ms(ms).ok_or(ConfigError::InvalidDuration(ms))?;
        }
        if let Some(ms) = self.frame_interval_ms {
            config.frame_interval_ms =
                positive_ms(ms).ok_or(ConfigError::InvalidFrameInterval(ms))?;
        }
        if let Some(a) = self.alpha {
            config.alpha = u8::try_from(a).map_err(|_| ConfigError::InvalidAlpha(a))?;
        }
        if let Some(p) = self.padding {
            if !(p >= 0.0 && p.is_finite()) {
                return Err(ConfigError::InvalidPadding(p));
            }
            config.padding = p;
        }
        if let Some(c) = self.centered {
            config.centered = c;
        }
        if let Some(z) = self.zoom {
            config.zoom = z;
        }
        if let Some(s) = self.zoom_scale {
            if !(s > 0.0 && s.is_finite()) {
                return Err(ConfigError::InvalidZoomScale(s));
            }
            config.zoom_scale = s;
        }
        if let Some(ms) = self.zoom_duration_ms {
            config.zoom_duration_ms =
                u32::try_from(ms).map_err(|_| ConfigError::InvalidZoomDuration(ms))?;
        }
        Ok(config)
    }
}

fn positive_ms(ms: i64) -> Option<u32> {
    u32::try_from(ms).ok().filter(|&v| v > 0)
}

/// Parse `#RRGGBB` or `#AARRGGBB` into an RGBA color.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ConfigError> {
    let bad = || ConfigError::InvalidColor(s.to_string());
    let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let value = u32::from_str_radix(hex, 16).map_err(|_| bad())?;
    let argb = match hex.len() {
        6 => 0xff00_0000 | value,
        8 => value,
        _ => return Err(bad()),
    };
    let [a, r, g, b] = argb.to_be_bytes();
    Ok(Rgba([r, g, b, a]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_legacy_widget() {
        let c = RippleConfig::default();
        assert_eq!(c.duration_ms, 400);
        assert_eq!(c.frame_interval_ms, 10);
        assert_eq!(c.alpha, 90);
        assert_eq!(c.zoom_duration_ms, 200);
        assert_eq!(c.frames_per_run(), 40);
    }

    #[test]
    fn test_parse_color_rgb_and_argb() {
        assert_eq!(parse_color("#ff4444").unwrap(), Rgba([0xff, 0x44, 0x44, 0xff]));
        assert_eq!(parse_color("#80102030").unwrap(), Rgba([0x10, 0x20, 0x30, 0x80]));
        assert!(parse_color("ff4444").is_err());
        assert!(parse_color("#fff").is_err());
        assert!(parse_color("#+1234567").is_err());
    }

    #[test]
    fn test_resolve_rejects_non_positive_timing() {
        let base = RippleConfig::default();
        let s = RippleSettings { duration_ms: Some(-5), ..Default::default() };
        assert!(matches!(s.resolve(&base), Err(ConfigError::InvalidDuration(-5))));
        let s = RippleSettings { frame_interval_ms: Some(0), ..Default::default() };
        assert!(matches!(s.resolve(&base), Err(ConfigError::InvalidFrameInterval(0))));
    }

    #[test]
    fn test_resolve_rejects_out_of_range_alpha_and_padding() {
        let base = RippleConfig::default();
        let s = RippleSettings { alpha: Some(256), ..Default::default() };
        assert!(matches!(s.resolve(&base), Err(ConfigError::InvalidAlpha(256))));
        let s = RippleSettings { padding: Some(-1.0), ..Default::default() };
        assert!(matches!(s.resolve(&base), Err(ConfigError::InvalidPadding(_))));
        let s = RippleSettings { zoom_scale: Some(0.0), ..Default::default() };
        assert!(matches!(s.resolve(&base), Err(ConfigError::InvalidZoomScale(_))));
    }

    #[test]
    fn test_merged_prefers_overlay() {
        let file = RippleSettings {
            alpha: Some(10),
            variant: Some(RippleVariant::Double),
            ..Default::default()
        };
        let cli = RippleSettings { alpha: Some(200), ..Default::default() };
        let c = file.merged(cli).resolve(&RippleConfig::default()).unwrap();
        assert_eq!(c.alpha, 200);
        assert_eq!(c.variant, RippleVariant::Double);
    }

    #[test]
    fn test_variant_from_toml() {
        let s: RippleSettings = toml::from_str("variant = \"rectangle\"\nalpha = 12").unwrap();
        assert_eq!(s.variant, Some(RippleVariant::Rectangle));
        assert_eq!(s.alpha, Some(12));
    }
}
