use crossterm::style::Color;
use image::RgbaImage;
use serde::Deserialize;

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Monochrome
    Mono,
    /// ANSI 16 colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit true color (RGB)
    #[default]
    TrueColor,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [
        ColorMode::TrueColor,
        ColorMode::Ansi256,
        ColorMode::Ansi16,
        ColorMode::Mono,
    ];

    pub fn next(self) -> ColorMode {
        let idx = Self::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Terminal-sized RGB pixel grid, rendered with half-block cells
/// (one column by two pixel rows per character).
pub struct Canvas {
    /// Width in pixels (= terminal columns)
    pub width: usize,
    /// Height in pixels (= terminal rows * 2)
    pub height: usize,
    pub colors: Vec<(u8, u8, u8)>,
    pub color_mode: ColorMode,
    /// Color quantization step (0 = off, 4/8/16 = round RGB to nearest N).
    pub color_quant: u8,
}

impl Canvas {
    pub fn new(term_cols: usize, term_rows: usize, color_mode: ColorMode) -> Self {
        let (w, h) = (term_cols, term_rows * 2);
        Canvas {
            width: w,
            height: h,
            colors: vec![(0, 0, 0); w * h],
            color_mode,
            color_quant: 0,
        }
    }

    pub fn clear(&mut self, rgb: (u8, u8, u8)) {
        self.colors.fill(rgb);
    }

    /// Terminal dimensions needed for this canvas
    pub fn term_size(&self) -> (usize, usize) {
        (self.width, self.height / 2)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        (x < self.width && y < self.height).then(|| self.colors[y * self.width + x])
    }

    /// Composite `img` with its top-left corner at `(x0, y0)`. Alpha blends
    /// over whatever the canvas already holds; off-canvas pixels are dropped.
    pub fn blit(&mut self, img: &RgbaImage, x0: usize, y0: usize) {
        for (ix, iy, px) in img.enumerate_pixels() {
            let x = x0 + ix as usize;
            let y = y0 + iy as usize;
            if x >= self.width || y >= self.height {
                continue;
            }
            let [r, g, b, a] = px.0;
            let dst = &mut self.colors[y * self.width + x];
            *dst = match a {
                255 => (r, g, b),
                0 => *dst,
                a => {
                    let mix = |s: u8, d: u8| ((s as u16 * a as u16 + d as u16 * (255 - a as u16)) / 255) as u8;
                    (mix(r, dst.0), mix(g, dst.1), mix(b, dst.2))
                }
            };
        }
    }

    pub fn render(&self) -> String {
        super::halfblock::render(self)
    }

    pub fn map_color(&self, r: u8, g: u8, b: u8) -> Color {
        // Coarser colors mean more repeated SGR codes the renderer can skip.
        let (r, g, b) = if self.color_quant > 1 {
            let q = self.color_quant as u16;
            let quant = |c: u8| ((c as u16 + q / 2) / q * q).min(255) as u8;
            (quant(r), quant(g), quant(b))
        } else {
            (r, g, b)
        };
        match self.color_mode {
            ColorMode::Mono => Color::White,
            ColorMode::TrueColor => Color::Rgb { r, g, b },
            ColorMode::Ansi256 => {
                let idx = 16 + 36 * (r as u16 / 51) + 6 * (g as u16 / 51) + b as u16 / 51;
                Color::AnsiValue(idx as u8)
            }
            ColorMode::Ansi16 => {
                let brightness = (r as u16 + g as u16 + b as u16) / 3;
                let pick = |bright: Color, dark: Color| if brightness > 180 { bright } else { dark };
                if brightness < 64 {
                    Color::Black
                } else if r > g && r > b {
                    pick(Color::Red, Color::DarkRed)
                } else if g > r && g > b {
                    pick(Color::Green, Color::DarkGreen)
                } else if b > r && b > g {
                    pick(Color::Blue, Color::DarkBlue)
                } else {
                    pick(Color::White, Color::Grey)
                }
            }
        }
    }
}

/// Perceived brightness in 0.0..=1.0.
pub fn luma((r, g, b): (u8, u8, u8)) -> f64 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}

pub fn color_to_fg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("38;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("38;5;{}", v),
        other => ansi16_code(other, 30, 90).to_string(),
    }
}

pub fn color_to_bg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("48;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("48;5;{}", v),
        other => ansi16_code(other, 40, 100).to_string(),
    }
}

/// SGR code for a basic color given the dark and bright bases (30/90 or 40/100).
fn ansi16_code(color: Color, dark: u8, bright: u8) -> u8 {
    match color {
        Color::Black => dark,
        Color::DarkRed => dark + 1,
        Color::DarkGreen => dark + 2,
        Color::DarkYellow => dark + 3,
        Color::DarkBlue => dark + 4,
        Color::DarkMagenta => dark + 5,
        Color::DarkCyan => dark + 6,
        Color::Grey => dark + 7,
        Color::DarkGrey => bright,
        Color::Red => bright + 1,
        Color::Green => bright + 2,
        Color::Yellow => bright + 3,
        Color::Blue => bright + 4,
        Color::Magenta => bright + 5,
        Color::Cyan => bright + 6,
        Color::White => bright + 7,
        _ => dark + 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_canvas_dimensions_are_half_block() {
        let c = Canvas::new(10, 4, ColorMode::TrueColor);
        assert_eq!((c.width, c.height), (10, 8));
        assert_eq!(c.term_size(), (10, 4));
    }

    #[test]
    fn test_blit_clips_and_blends() {
        let mut c = Canvas::new(4, 2, ColorMode::TrueColor);
        c.clear((0, 0, 0));
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([200, 100, 50, 255]));
        img.put_pixel(0, 0, Rgba([255, 255, 255, 0]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 51]));
        c.blit(&img, 2, 2);
        assert_eq!(c.get(2, 2), Some((0, 0, 0)));
        assert_eq!(c.get(3, 2), Some((51, 51, 51)));
        assert_eq!(c.get(3, 3), Some((200, 100, 50)));
        assert_eq!(c.get(4, 4), None);
    }

    #[test]
    fn test_color_codes() {
        assert_eq!(color_to_fg(Color::Rgb { r: 1, g: 2, b: 3 }), "38;2;1;2;3");
        assert_eq!(color_to_bg(Color::AnsiValue(42)), "48;5;42");
        assert_eq!(color_to_fg(Color::DarkRed), "31");
        assert_eq!(color_to_bg(Color::White), "107");
    }

    #[test]
    fn test_map_color_modes() {
        let mut c = Canvas::new(1, 1, ColorMode::Ansi256);
        assert_eq!(c.map_color(255, 0, 0), Color::AnsiValue(196));
        c.color_mode = ColorMode::Ansi16;
        assert_eq!(c.map_color(10, 10, 10), Color::Black);
        assert_eq!(c.map_color(250, 200, 190), Color::Red);
        c.color_mode = ColorMode::Mono;
        assert_eq!(c.map_color(1, 2, 3), Color::White);
    }

    #[test]
    fn test_color_mode_cycles() {
        let mut m = ColorMode::TrueColor;
        for _ in 0..4 {
            m = m.next();
        }
        assert_eq!(m, ColorMode::TrueColor);
    }
}
