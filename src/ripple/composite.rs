use image::RgbaImage;
#[cfg(test)]
use image::Rgba;

/// Mask `snapshot` to a circle: pixels whose centers fall within `radius` of
/// `(cx, cy)` keep their snapshot value, everything else is transparent.
///
/// The result always has the snapshot's dimensions and is meant to be drawn
/// at (0, 0) over the surface it was captured from.
pub fn composite(snapshot: &RgbaImage, cx: f32, cy: f32, radius: f32) -> RgbaImage {
    let (w, h) = snapshot.dimensions();
    let mut out = RgbaImage::new(w, h);
    if radius <= 0.0 || w == 0 || h == 0 {
        return out;
    }

    // Only walk the circle's bounding box, clipped to the image.
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
                out.put_pixel(x, y, *snapshot.get_pixel(x, y));
            }
        }
    }
    out
}

#[cfg(test)]
/// True if every pixel of `img` is fully transparent.
pub fn is_transparent(img: &RgbaImage) -> bool {
    img.pixels().all(|p| p.0[3] == 0)
}

#[cfg(test)]
/// Opaque single-color image.
pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}
