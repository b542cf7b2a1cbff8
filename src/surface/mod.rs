pub mod content;

use crate::ripple::{
    RippleConfig, RippleEngine, StepOutcome, SurfaceGeometry, SurfaceId, SurfaceSnapshot,
    TickScheduler, ZoomPulse,
};
use content::ColorGradient;
use image::{Rgba, RgbaImage};
use std::time::{Duration, Instant};

/// Redraw cadence while a zoom pulse runs without a ripple driving frames.
const ZOOM_FRAME: Duration = Duration::from_millis(16);

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px - self.x < self.width && py - self.y < self.height
    }
}

/// Split a canvas into `count` equal columns separated (and framed) by `gap`.
pub fn layout(width: u32, height: u32, count: usize, gap: u32) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let n = count as u32;
    let tile_w = width.saturating_sub(gap * (n + 1)) / n;
    let tile_h = height.saturating_sub(gap * 2);
    (0..n)
        .map(|i| Rect {
            x: gap + i * (tile_w + gap),
            y: gap,
            width: tile_w,
            height: tile_h,
        })
        .collect()
}

/// Borrowed view of a tile's content handed to the engine at start.
struct CardView<'a> {
    content: &'a RgbaImage,
    enabled: bool,
}

impl SurfaceGeometry for CardView<'_> {
    fn size(&self) -> (u32, u32) {
        self.content.dimensions()
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl SurfaceSnapshot for CardView<'_> {
    fn capture(&self) -> Option<RgbaImage> {
        Some(self.content.clone())
    }
}

/// A clickable tile: static card artwork with a ripple engine on top.
pub struct RippleSurface {
    rect: Rect,
    seed: u32,
    gradient: ColorGradient,
    content: RgbaImage,
    frame: RgbaImage,
    enabled: bool,
    engine: RippleEngine<TickScheduler>,
    zoom: Option<(ZoomPulse, Instant)>,
}

impl RippleSurface {
    pub fn new(id: SurfaceId, rect: Rect, config: RippleConfig) -> Self {
        let seed = 17 + id.0 as u32 * 31;
        let gradient = content::palette(id.0);
        let card = content::render_card(rect.width, rect.height, seed, &gradient);
        let mut engine = RippleEngine::new(id, config, TickScheduler::new());
        engine.scheduler_mut().post_at(Instant::now());
        RippleSurface {
            rect,
            seed,
            gradient,
            frame: card.clone(),
            content: card,
            enabled: true,
            engine,
            zoom: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.engine.id()
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn config(&self) -> &RippleConfig {
        self.engine.config()
    }

    /// Config the next ripple will run with, including changes queued mid-run.
    pub fn pending_config(&self) -> &RippleConfig {
        self.engine.pending_config()
    }

    /// Takes effect immediately when idle, otherwise after the current ripple.
    pub fn set_config(&mut self, config: RippleConfig) {
        self.engine.set_config(config);
    }

    pub fn set_on_complete(&mut self, listener: impl FnMut(SurfaceId) + 'static) {
        self.engine.set_on_complete(listener);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.engine.scheduler_mut().post_at(Instant::now());
        }
    }

    pub fn is_animating(&self) -> bool {
        self.engine.is_running() || self.zoom.is_some()
    }

    pub fn engine(&self) -> &RippleEngine<TickScheduler> {
        &self.engine
    }

    /// Last rendered frame, ready to be blitted at `rect()`.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Move/resize the tile. Content is regenerated, so the captured
    /// snapshot no longer matches and is dropped.
    pub fn resize(&mut self, rect: Rect) {
        if rect == self.rect {
            return;
        }
        self.rect = rect;
        self.content = content::render_card(rect.width, rect.height, self.seed, &self.gradient);
        self.frame = self.content.clone();
        self.engine.discard_snapshot();
        self.engine.scheduler_mut().post_at(Instant::now());
    }

    /// Tap at canvas coordinates. Returns true if a ripple started.
    pub fn tap(&mut self, x: u32, y: u32, now: Instant) -> bool {
        if !self.rect.contains(x, y) {
            return false;
        }
        self.tap_local((x - self.rect.x) as f32, (y - self.rect.y) as f32, now)
    }

    /// Tap at tile-local coordinates.
    pub fn tap_local(&mut self, x: f32, y: f32, now: Instant) -> bool {
        let view = CardView {
            content: &self.content,
            enabled: self.enabled,
        };
        if !self.engine.start(x, y, &view) {
            return false;
        }
        let config = self.engine.config();
        if config.zoom {
            self.zoom = Some((ZoomPulse::new(config.zoom_scale, config.zoom_duration_ms), now));
        }
        true
    }

    /// Whether this tile should be redrawn at `now`. Consumes a due frame
    /// request, so call it once per loop iteration.
    pub fn needs_redraw(&mut self, now: Instant) -> bool {
        let due = self.engine.scheduler_mut().take_due(now);
        let zoom_frame = match self.zoom {
            Some((pulse, started)) => {
                if pulse.scale_at(now.saturating_duration_since(started)).is_none() {
                    self.zoom = None;
                }
                // While a ripple runs its own frames carry the zoom along.
                !self.engine.is_running()
            }
            None => false,
        };
        due || zoom_frame
    }

    /// Earliest time this tile wants to be looked at again.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let zoom = self.zoom.map(|_| now + ZOOM_FRAME);
        match (self.engine.scheduler().next_deadline(), zoom) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Render content (zoomed if a pulse is running) and advance the ripple.
    pub fn redraw(&mut self, now: Instant) -> StepOutcome {
        let scale = self
            .zoom
            .and_then(|(pulse, started)| pulse.scale_at(now.saturating_duration_since(started)));
        match scale {
            Some(s) if (s - 1.0).abs() > f32::EPSILON => self.frame = zoomed(&self.content, s),
            _ => self.frame.clone_from(&self.content),
        }
        if !self.enabled {
            dim(&mut self.frame);
        }
        self.engine.step_and_render(&mut self.frame)
    }
}

/// Scale `src` about its center with nearest-neighbour sampling. Pixels that
/// map outside the source take the nearest edge pixel.
fn zoomed(src: &RgbaImage, scale: f32) -> RgbaImage {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 || scale <= 0.0 {
        return src.clone();
    }
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    RgbaImage::from_fn(w, h, |x, y| {
        let sx = ((x as f32 + 0.5 - cx) / scale + cx).floor().clamp(0.0, (w - 1) as f32);
        let sy = ((y as f32 + 0.5 - cy) / scale + cy).floor().clamp(0.0, (h - 1) as f32);
        *src.get_pixel(sx as u32, sy as u32)
    })
}

fn dim(img: &mut RgbaImage) {
    for p in img.pixels_mut() {
        let [r, g, b, a] = p.0;
        let grey = ((r as u16 + g as u16 + b as u16) / 3 / 2) as u8;
        *p = Rgba([grey, grey, grey, a]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ripple::RippleVariant;
    use std::cell::Cell;
    use std::rc::Rc;

    fn far(now: Instant) -> Instant {
        now + Duration::from_secs(60)
    }

    #[test]
    fn test_layout_three_columns() {
        let rects = layout(100, 40, 3, 2);
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0], Rect { x: 2, y: 2, width: 30, height: 36 });
        assert_eq!(rects[1].x, 34);
        assert_eq!(rects[2].x, 66);
        assert!(layout(10, 10, 0, 1).is_empty());
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect { x: 2, y: 3, width: 4, height: 5 };
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 7));
        assert!(!r.contains(6, 7));
        assert!(!r.contains(1, 3));
    }

    #[test]
    fn test_tap_outside_rect_is_ignored() {
        let rect = Rect { x: 10, y: 10, width: 20, height: 20 };
        let mut s = RippleSurface::new(SurfaceId(0), rect, RippleConfig::default());
        assert!(!s.tap(5, 5, Instant::now()));
        assert!(s.tap(15, 15, Instant::now()));
        assert_eq!(s.engine().state().origin(), (5.0, 5.0));
    }

    #[test]
    fn test_disabled_surface_ignores_taps() {
        let rect = Rect { x: 0, y: 0, width: 8, height: 8 };
        let mut s = RippleSurface::new(SurfaceId(0), rect, RippleConfig::default());
        s.set_enabled(false);
        assert!(!s.tap(1, 1, Instant::now()));
        assert!(!s.is_animating());
    }

    #[test]
    fn test_full_run_fires_completion() {
        let rect = Rect { x: 0, y: 0, width: 24, height: 16 };
        let mut s = RippleSurface::new(SurfaceId(3), rect, RippleConfig::default());
        let done = Rc::new(Cell::new(0));
        let counter = Rc::clone(&done);
        s.set_on_complete(move |id| {
            assert_eq!(id, SurfaceId(3));
            counter.set(counter.get() + 1);
        });

        let now = Instant::now();
        assert!(s.needs_redraw(far(now)));
        assert_eq!(s.redraw(now), StepOutcome::Idle);

        assert!(s.tap(12, 8, now));
        let mut frames = 0;
        while s.needs_redraw(far(now)) {
            if s.redraw(now) == StepOutcome::Running {
                frames += 1;
            }
        }
        assert_eq!(frames, 40);
        assert_eq!(done.get(), 1);
        assert!(!s.is_animating());
        // Final repaint leaves the untouched card.
        assert_eq!(s.frame(), &s.content);
    }

    #[test]
    fn test_double_overlay_uses_card_snapshot() {
        let rect = Rect { x: 0, y: 0, width: 20, height: 20 };
        let config = RippleConfig {
            variant: RippleVariant::Double,
            alpha: 255,
            color: Rgba([255, 0, 255, 255]),
            ..RippleConfig::default()
        };
        let mut s = RippleSurface::new(SurfaceId(0), rect, config);
        let now = Instant::now();
        assert!(s.tap(0, 0, now));
        assert!(s.engine().state().has_snapshot());
        // Run to the last drawn frame: the overlay covers the whole circle,
        // so the center shows the card again rather than the ripple color.
        for _ in 0..40 {
            s.redraw(now);
        }
        assert_eq!(s.frame().get_pixel(10, 10), s.content.get_pixel(10, 10));
    }

    #[test]
    fn test_zoom_pulse_keeps_redrawing_then_stops() {
        let rect = Rect { x: 0, y: 0, width: 10, height: 10 };
        let config = RippleConfig {
            zoom: true,
            zoom_scale: 1.5,
            zoom_duration_ms: 200,
            duration_ms: 20,
            ..RippleConfig::default()
        };
        let mut s = RippleSurface::new(SurfaceId(0), rect, config);
        let now = Instant::now();
        assert!(s.tap(5, 5, now));
        while s.engine().is_running() {
            s.redraw(now);
        }
        // Ripple done, zoom still mid-pulse.
        let mid = now + Duration::from_millis(100);
        assert!(s.needs_redraw(mid));
        assert!(s.next_deadline(mid).is_some());
        // Past the pulse: one last redraw, then quiet.
        let end = now + Duration::from_millis(500);
        assert!(s.needs_redraw(end));
        s.redraw(end);
        assert!(!s.is_animating());
        assert!(!s.needs_redraw(end));
    }

    #[test]
    fn test_resize_regenerates_content() {
        let mut s = RippleSurface::new(
            SurfaceId(1),
            Rect { x: 0, y: 0, width: 10, height: 10 },
            RippleConfig::default(),
        );
        s.resize(Rect { x: 4, y: 4, width: 16, height: 12 });
        assert_eq!(s.frame().dimensions(), (16, 12));
        assert!(s.tap(5, 5, Instant::now()));
    }

    #[test]
    fn test_zoomed_identity_and_magnify() {
        let src = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 60, y as u8 * 60, 0, 255]));
        assert_eq!(zoomed(&src, 1.0), src);
        let big = zoomed(&src, 2.0);
        // Magnified about the center: corners pull in toward the middle.
        assert_eq!(big.get_pixel(0, 0), src.get_pixel(1, 1));
        assert_eq!(big.get_pixel(3, 3), src.get_pixel(2, 2));
    }
}
