pub mod canvas;
pub mod composite;
pub mod config;
pub mod engine;
pub mod scheduler;
pub mod zoom;

pub use canvas::RippleCanvas;
pub use composite::composite;
pub use config::{RippleConfig, RippleSettings, RippleVariant, parse_color};
pub use engine::{
    DrawCommand, RippleEngine, RippleState, Step, StepOutcome, SurfaceGeometry, SurfaceId,
    SurfaceSnapshot,
};
pub use scheduler::{FrameScheduler, TickScheduler};
pub use zoom::ZoomPulse;
