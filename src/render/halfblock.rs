use super::canvas::{Canvas, ColorMode, color_to_bg, color_to_fg, luma};

/// Luma above which a pixel counts as "lit" in monochrome output.
const MONO_THRESHOLD: f64 = 0.35;

/// Render the canvas as rows of `▀` cells: foreground paints the top pixel,
/// background the bottom one. SGR codes are only emitted when they change.
pub fn render(canvas: &Canvas) -> String {
    let (term_cols, term_rows) = canvas.term_size();
    let mut out = String::with_capacity(term_cols * term_rows * 12);

    for row in 0..term_rows {
        let top = &canvas.colors[row * 2 * canvas.width..][..term_cols];
        let bottom = &canvas.colors[(row * 2 + 1) * canvas.width..][..term_cols];

        if canvas.color_mode == ColorMode::Mono {
            for (&t, &b) in top.iter().zip(bottom) {
                out.push(match (luma(t) > MONO_THRESHOLD, luma(b) > MONO_THRESHOLD) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
        } else {
            let mut last_fg = String::new();
            let mut last_bg = String::new();
            for (&(tr, tg, tb), &(br, bg, bb)) in top.iter().zip(bottom) {
                let fg = color_to_fg(canvas.map_color(tr, tg, tb));
                let bg_s = color_to_bg(canvas.map_color(br, bg, bb));

                let mut params = Vec::with_capacity(2);
                if fg != last_fg {
                    params.push(fg.as_str());
                }
                if bg_s != last_bg {
                    params.push(bg_s.as_str());
                }
                if !params.is_empty() {
                    out.push_str("\x1b[");
                    out.push_str(&params.join(";"));
                    out.push('m');
                }
                out.push('▀');
                last_fg = fg;
                last_bg = bg_s;
            }
            out.push_str("\x1b[0m");
        }

        // Cursor movement instead of \n keeps the last column from wrapping.
        out.push_str(&format!("\x1b[{};1H", row + 2));
    }
    out
}
