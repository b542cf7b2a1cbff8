use thiserror::Error;

/// Rejected configuration. Raised while resolving settings, before any
/// value reaches the ripple engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ripple duration must be positive, got {0} ms")]
    InvalidDuration(i64),
    #[error("frame interval must be positive, got {0} ms")]
    InvalidFrameInterval(i64),
    #[error("ripple alpha must be within 0..=255, got {0}")]
    InvalidAlpha(i64),
    #[error("ripple padding must not be negative, got {0}")]
    InvalidPadding(f32),
    #[error("zoom scale must be positive, got {0}")]
    InvalidZoomScale(f32),
    #[error("zoom duration must not be negative, got {0} ms")]
    InvalidZoomDuration(i64),
    #[error("invalid color {0:?} (expected #RRGGBB or #AARRGGBB)")]
    InvalidColor(String),
    #[error("invalid size {0:?} (expected WIDTHxHEIGHT)")]
    InvalidSize(String),
    #[error("invalid point {0:?} (expected X,Y)")]
    InvalidPoint(String),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for std::io::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Io(inner) => inner,
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other),
        }
    }
}
