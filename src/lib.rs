//! Touch-feedback ripples for terminal tiles.
//!
//! [`ripple`] holds the animation engine: a frame-stepped state machine that
//! expands and fades a circle over a surface, optionally erasing it back
//! toward a snapshot of the surface's content. [`surface`] hosts engines on
//! clickable tiles, and [`render`] turns tiles into half-block terminal output.

pub mod config;
pub mod error;
pub mod external;
pub mod frames;
pub mod render;
pub mod ripple;
pub mod surface;
