use image::{Rgba, RgbaImage};

/// Anything the engine can replay its draw commands onto.
pub trait RippleCanvas {
    /// Fill a circle, blending `color` (including its alpha) over what is there.
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba<u8>);

    /// Draw `image` with its top-left corner at `(x, y)`, source-over.
    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32);
}

impl RippleCanvas for RgbaImage {
    fn fill_circle(&mut self, (cx, cy): (f32, f32), radius: f32, color: Rgba<u8>) {
        if radius <= 0.0 || color.0[3] == 0 {
            return;
        }
        let (w, h) = self.dimensions();
        let x0 = ((cx - radius).floor().max(0.0) as u32).min(w);
        let y0 = ((cy - radius).floor().max(0.0) as u32).min(h);
        let x1 = ((cx + radius).ceil().max(0.0) as u32).min(w);
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(h);
        let r2 = radius * radius;

        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    let dst = self.get_pixel_mut(x, y);
                    *dst = blend(*dst, color);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
        let (w, h) = self.dimensions();
        for (sx, sy, src) in image.enumerate_pixels() {
            if src.0[3] == 0 {
                continue;
            }
            let dx = x + sx as i32;
            let dy = y + sy as i32;
            if dx < 0 || dy < 0 || dx as u32 >= w || dy as u32 >= h {
                continue;
            }
            let dst = self.get_pixel_mut(dx as u32, dy as u32);
            *dst = blend(*dst, *src);
        }
    }
}

/// Porter-Duff source-over on straight (non-premultiplied) RGBA.
pub fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst.0[3] as u32;
    // Alpha scaled by 255*255 to stay in integers.
    let out_a = sa * 255 + da * (255 - sa);
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |s: u8, d: u8| -> u8 {
        let v = (s as u32 * sa * 255 + d as u32 * da * (255 - sa)) / out_a;
        v.min(255) as u8
    };
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        (out_a / 255).min(255) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_opaque_source_replaces() {
        let out = blend(Rgba([1, 2, 3, 255]), Rgba([9, 8, 7, 255]));
        assert_eq!(out, Rgba([9, 8, 7, 255]));
    }

    #[test]
    fn test_blend_half_alpha_over_opaque() {
        let out = blend(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out.0[3], 255);
        assert!((127..=129).contains(&out.0[0]));
    }

    #[test]
    fn test_blend_transparent_source_keeps_dst() {
        let dst = Rgba([5, 6, 7, 200]);
        assert_eq!(blend(dst, Rgba([255, 0, 0, 0])), dst);
    }

    #[test]
    fn test_fill_circle_stays_inside_radius() {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        img.fill_circle((10.0, 10.0), 3.0, Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(10, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(10, 15), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_fill_circle_zero_radius_draws_nothing() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let before = img.clone();
        img.fill_circle((2.0, 2.0), 0.0, Rgba([255, 255, 255, 255]));
        assert_eq!(img, before);
    }

    #[test]
    fn test_draw_image_clips_and_skips_transparent() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let mut stamp = RgbaImage::new(3, 3);
        stamp.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        stamp.put_pixel(2, 2, Rgba([0, 255, 0, 255]));
        img.draw_image(&stamp, 2, 2);
        assert_eq!(img.get_pixel(2, 2), &Rgba([255, 255, 255, 255]));
        // (4,4) is off-canvas; nothing else changed.
        assert_eq!(img.get_pixel(3, 3), &Rgba([0, 0, 0, 255]));
    }
}
