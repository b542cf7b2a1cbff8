use super::canvas::RippleCanvas;
use super::composite::composite;
use super::config::{RippleConfig, RippleVariant};
use super::scheduler::FrameScheduler;
use image::{Rgba, RgbaImage};
use std::time::Duration;

/// Progress past which the DOUBLE variant starts erasing toward the snapshot.
const OVERLAY_START: f32 = 0.4;
/// Progress past which the DOUBLE variant starts fading its circle.
const FADE_START: f32 = 0.6;

/// Identifies the surface an engine belongs to in completion callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub usize);

/// Size and enabled state of the host surface, queried when a run starts.
pub trait SurfaceGeometry {
    fn size(&self) -> (u32, u32);

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Captures the host's current rendered pixels.
pub trait SurfaceSnapshot {
    /// `None` when the content cannot be captured.
    fn capture(&self) -> Option<RgbaImage>;
}

/// Everything one surface's ripple needs to remember between frames.
#[derive(Debug, Default)]
pub struct RippleState {
    active: bool,
    frame_count: u32,
    origin: (f32, f32),
    max_radius: f32,
    base_snapshot: Option<RgbaImage>,
    secondary_elapsed_frames: u32,
    secondary_budget_ms: Option<u32>,
}

impl RippleState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn origin(&self) -> (f32, f32) {
        self.origin
    }

    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    pub fn has_snapshot(&self) -> bool {
        self.base_snapshot.is_some()
    }

    pub fn secondary_elapsed_frames(&self) -> u32 {
        self.secondary_elapsed_frames
    }

    pub fn secondary_budget_ms(&self) -> Option<u32> {
        self.secondary_budget_ms
    }

    fn reset_run(&mut self) {
        self.frame_count = 0;
        self.secondary_elapsed_frames = 0;
        self.secondary_budget_ms = None;
    }
}

/// One drawing operation produced by a step, replayed onto a [`RippleCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: (f32, f32),
        radius: f32,
        color: Rgba<u8>,
    },
    /// Masked snapshot, drawn at (0, 0) over the ripple fill.
    Overlay { image: RgbaImage },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing running; nothing drawn.
    Idle,
    /// A frame was drawn and another one is wanted.
    Running,
    /// The run just ended. Nothing drawn this step.
    Completed,
}

#[derive(Debug)]
pub struct Step {
    pub commands: Vec<DrawCommand>,
    pub outcome: StepOutcome,
}

impl Step {
    fn empty(outcome: StepOutcome) -> Self {
        Step {
            commands: Vec::new(),
            outcome,
        }
    }
}

/// Largest radius for a surface of `width` x `height`. Never negative.
pub fn max_radius(config: &RippleConfig, width: u32, height: u32) -> f32 {
    let extent = width.max(height) as f32;
    let radius = match config.variant {
        RippleVariant::Rectangle => extent,
        RippleVariant::Simple | RippleVariant::Double => extent / 2.0,
    };
    (radius - config.padding).max(0.0)
}

/// Begin a run at `(x, y)`. Returns false (and changes nothing) if a run is
/// already active or the host is disabled.
pub fn begin<H>(state: &mut RippleState, config: &RippleConfig, x: f32, y: f32, host: &H) -> bool
where
    H: SurfaceGeometry + SurfaceSnapshot + ?Sized,
{
    if state.active || !host.is_enabled() {
        return false;
    }

    let (w, h) = host.size();
    state.max_radius = max_radius(config, w, h);
    state.origin = match config.variant {
        RippleVariant::Double => ((w / 2) as f32, (h / 2) as f32),
        _ if config.centered => ((w / 2) as f32, (h / 2) as f32),
        _ => (x, y),
    };

    if config.variant == RippleVariant::Double && state.base_snapshot.is_none() {
        state.base_snapshot = host.capture().filter(|img| img.width() > 0 && img.height() > 0);
        if state.base_snapshot.is_none() {
            // No snapshot to erase back to: draw nothing visible.
            log::warn!("surface snapshot unavailable; double ripple degrades to zero radius");
            state.max_radius = 0.0;
        }
    }

    state.reset_run();
    state.active = true;
    true
}

/// Advance one frame. Pure apart from `state`: the drawing is returned as
/// commands rather than performed.
pub fn step(state: &mut RippleState, config: &RippleConfig) -> Step {
    if !state.active {
        return Step::empty(StepOutcome::Idle);
    }

    let interval = config.frame_interval_ms;
    let elapsed_ms = state.frame_count.saturating_mul(interval);
    if elapsed_ms >= config.duration_ms {
        state.active = false;
        state.reset_run();
        return Step::empty(StepOutcome::Completed);
    }

    let progress = elapsed_ms as f32 / config.duration_ms as f32;
    let radius = state.max_radius * progress;

    let mut secondary = 0.0;
    let mut overlay = None;
    if config.variant == RippleVariant::Double && progress > OVERLAY_START {
        // elapsed < duration here, so the budget is never zero.
        let budget = *state
            .secondary_budget_ms
            .get_or_insert(config.duration_ms - elapsed_ms);
        state.secondary_elapsed_frames += 1;
        secondary = (state.secondary_elapsed_frames.saturating_mul(interval) as f32
            / budget as f32)
            .clamp(0.0, 1.0);
        if let Some(ref snapshot) = state.base_snapshot {
            let (cx, cy) = state.origin;
            let r = (state.max_radius * secondary).trunc();
            overlay = Some(composite(snapshot, cx, cy, r));
        }
    }

    let [r, g, b, _] = config.color.0;
    let mut commands = Vec::with_capacity(2);
    commands.push(DrawCommand::Circle {
        center: state.origin,
        radius,
        color: Rgba([r, g, b, fade_alpha(config, progress, secondary)]),
    });
    if let Some(image) = overlay {
        commands.push(DrawCommand::Overlay { image });
    }

    state.frame_count += 1;
    Step {
        commands,
        outcome: StepOutcome::Running,
    }
}

fn fade_alpha(config: &RippleConfig, progress: f32, secondary: f32) -> u8 {
    let base = config.alpha as f32;
    let alpha = match config.variant {
        RippleVariant::Double if progress > FADE_START => base * (1.0 - secondary),
        RippleVariant::Double => base,
        RippleVariant::Simple | RippleVariant::Rectangle => base * (1.0 - progress),
    };
    alpha.clamp(0.0, 255.0) as u8
}

/// Ripple driver for one surface: owns the state, schedules its own frames,
/// and reports completion.
pub struct RippleEngine<S> {
    id: SurfaceId,
    config: RippleConfig,
    deferred: Option<RippleConfig>,
    state: RippleState,
    scheduler: S,
    on_complete: Option<Box<dyn FnMut(SurfaceId)>>,
}

impl<S: FrameScheduler> RippleEngine<S> {
    pub fn new(id: SurfaceId, config: RippleConfig, scheduler: S) -> Self {
        RippleEngine {
            id,
            config,
            deferred: None,
            state: RippleState::default(),
            scheduler,
            on_complete: None,
        }
    }

    /// Called once per finished run, from inside the final `step_and_render`.
    pub fn set_on_complete(&mut self, listener: impl FnMut(SurfaceId) + 'static) {
        self.on_complete = Some(Box::new(listener));
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn config(&self) -> &RippleConfig {
        &self.config
    }

    /// The configuration the next run will use: a change queued while a
    /// ripple is running, else the current one. Build further changes on this.
    pub fn pending_config(&self) -> &RippleConfig {
        self.deferred.as_ref().unwrap_or(&self.config)
    }

    /// Replace the configuration. A running ripple keeps its current
    /// configuration; the new one takes effect once it completes.
    pub fn set_config(&mut self, config: RippleConfig) {
        if self.state.active {
            self.deferred = Some(config);
        } else {
            self.config = config;
        }
    }

    pub fn state(&self) -> &RippleState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.active
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Forget the captured snapshot so the next DOUBLE run captures afresh.
    pub fn discard_snapshot(&mut self) {
        self.state.base_snapshot = None;
    }

    /// Start a ripple at `(x, y)` in surface coordinates. A no-op while a
    /// ripple is running or the host is disabled.
    pub fn start<H>(&mut self, x: f32, y: f32, host: &H) -> bool
    where
        H: SurfaceGeometry + SurfaceSnapshot + ?Sized,
    {
        if !begin(&mut self.state, &self.config, x, y, host) {
            return false;
        }
        log::debug!(
            "surface {} ripple start at ({:.1}, {:.1}) radius {:.1}",
            self.id.0,
            self.state.origin.0,
            self.state.origin.1,
            self.state.max_radius,
        );
        self.scheduler.post_delayed(Duration::ZERO);
        true
    }

    /// Advance one frame and draw it onto `canvas`. Call once per redraw.
    pub fn step_and_render<C: RippleCanvas + ?Sized>(&mut self, canvas: &mut C) -> StepOutcome {
        let Step { commands, outcome } = step(&mut self.state, &self.config);

        match outcome {
            StepOutcome::Idle => {}
            StepOutcome::Running => {
                self.scheduler
                    .post_delayed(Duration::from_millis(self.config.frame_interval_ms as u64));
            }
            StepOutcome::Completed => {
                if let Some(config) = self.deferred.take() {
                    self.config = config;
                }
                // Repaint once more so the last ripple frame is cleared.
                self.scheduler.post_delayed(Duration::ZERO);
                log::debug!("surface {} ripple complete", self.id.0);
                if let Some(listener) = self.on_complete.as_mut() {
                    listener(self.id);
                }
            }
        }

        for command in &commands {
            match command {
                DrawCommand::Circle {
                    center,
                    radius,
                    color,
                } => canvas.fill_circle(*center, *radius, *color),
                DrawCommand::Overlay { image } => canvas.draw_image(image, 0, 0),
            }
        }
        outcome
    }
}
