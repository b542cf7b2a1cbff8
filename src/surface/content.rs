use image::{Rgba, RgbaImage};
use noise::{NoiseFn, Perlin};

/// A color stop in a gradient.
#[derive(Clone, Copy, Debug)]
pub struct ColorStop {
    pub t: f64,
    pub rgb: (u8, u8, u8),
}

/// Linear gradient between color stops, sampled by `t` in 0.0..=1.0.
#[derive(Clone, Debug)]
pub struct ColorGradient {
    stops: Vec<ColorStop>,
}

impl ColorGradient {
    /// Stops must be sorted by `t`; at least one is required.
    pub fn new(stops: Vec<ColorStop>) -> Self {
        assert!(!stops.is_empty(), "ColorGradient requires at least one stop");
        ColorGradient { stops }
    }

    pub fn sample(&self, t: f64) -> (u8, u8, u8) {
        let t = t.clamp(0.0, 1.0);
        let first = self.stops[0];
        if t <= first.t {
            return first.rgb;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.t {
                let span = (b.t - a.t).max(f64::EPSILON);
                let frac = (t - a.t) / span;
                let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac) as u8;
                return (
                    lerp(a.rgb.0, b.rgb.0),
                    lerp(a.rgb.1, b.rgb.1),
                    lerp(a.rgb.2, b.rgb.2),
                );
            }
        }
        self.stops[self.stops.len() - 1].rgb
    }
}

/// Palette for tile `index`; cycles through a few card themes.
pub fn palette(index: usize) -> ColorGradient {
    let stops = match index % 3 {
        0 => [(0.0, (18, 40, 78)), (0.5, (40, 96, 160)), (1.0, (120, 190, 230))],
        1 => [(0.0, (60, 16, 52)), (0.5, (150, 50, 90)), (1.0, (240, 150, 120))],
        _ => [(0.0, (14, 54, 40)), (0.5, (36, 120, 84)), (1.0, (170, 220, 140))],
    };
    ColorGradient::new(
        stops
            .into_iter()
            .map(|(t, rgb)| ColorStop { t, rgb })
            .collect(),
    )
}

/// Static card artwork for a tile: a Perlin-noise wash through `gradient`,
/// a one-pixel border, and a bright stripe across the middle.
pub fn render_card(width: u32, height: u32, seed: u32, gradient: &ColorGradient) -> RgbaImage {
    let noise = Perlin::new(seed);
    let stripe_top = height * 2 / 5;
    let stripe_bottom = height * 3 / 5;

    RgbaImage::from_fn(width, height, |x, y| {
        let border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
        if border {
            return Rgba([8, 8, 12, 255]);
        }
        let fx = x as f64 / width.max(1) as f64;
        let fy = y as f64 / height.max(1) as f64;
        let n = noise.get([fx * 3.0, fy * 3.0]) * 0.5 + 0.5;
        let mut t = (fy * 0.6 + n * 0.4).clamp(0.0, 1.0);
        if (stripe_top..stripe_bottom).contains(&y) {
            t = (t + 0.35).min(1.0);
        }
        let (r, g, b) = gradient.sample(t);
        Rgba([r, g, b, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints_and_midpoint() {
        let g = ColorGradient::new(vec![
            ColorStop { t: 0.0, rgb: (0, 0, 0) },
            ColorStop { t: 1.0, rgb: (200, 100, 50) },
        ]);
        assert_eq!(g.sample(-1.0), (0, 0, 0));
        assert_eq!(g.sample(2.0), (200, 100, 50));
        assert_eq!(g.sample(0.5), (100, 50, 25));
    }

    #[test]
    fn test_card_is_opaque_with_border() {
        let img = render_card(12, 8, 1, &palette(0));
        assert_eq!(img.dimensions(), (12, 8));
        assert!(img.pixels().all(|p| p.0[3] == 255));
        assert_eq!(img.get_pixel(0, 0), &Rgba([8, 8, 12, 255]));
        assert_eq!(img.get_pixel(11, 7), &Rgba([8, 8, 12, 255]));
    }

    #[test]
    fn test_card_is_deterministic() {
        let a = render_card(16, 16, 7, &palette(1));
        let b = render_card(16, 16, 7, &palette(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_card() {
        let img = render_card(0, 0, 1, &palette(2));
        assert_eq!(img.dimensions(), (0, 0));
    }
}
