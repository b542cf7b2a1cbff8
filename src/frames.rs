use crate::ripple::StepOutcome;
use crate::surface::RippleSurface;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// File name of frame `index` inside `dir`.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:04}.png"))
}

/// Run one ripple on `surface` off-screen, starting at tile-local `(x, y)`,
/// and write every drawn frame to `dir` as PNG. Frames are stepped back to
/// back on a synthetic clock advancing one frame interval per frame.
///
/// Returns the number of frames written.
pub fn dump_run(surface: &mut RippleSurface, x: f32, y: f32, dir: &Path) -> io::Result<usize> {
    std::fs::create_dir_all(dir)?;

    let start = Instant::now();
    if !surface.tap_local(x, y, start) {
        return Err(io::Error::other("ripple did not start (surface disabled?)"));
    }
    let interval = Duration::from_millis(surface.config().frame_interval_ms as u64);

    let mut written = 0;
    loop {
        let now = start + interval * written as u32;
        match surface.redraw(now) {
            StepOutcome::Running => {
                let path = frame_path(dir, written);
                surface
                    .frame()
                    .save(&path)
                    .map_err(|e| io::Error::other(format!("{}: {e}", path.display())))?;
                log::debug!("wrote {}", path.display());
                written += 1;
            }
            StepOutcome::Completed | StepOutcome::Idle => break,
        }
    }
    log::info!("wrote {written} frames to {}", dir.display());
    Ok(written)
}
