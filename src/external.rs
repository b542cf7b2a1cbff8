use crate::error::ConfigError;
use crate::ripple::RippleSettings;
use crate::surface::RippleSurface;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

/// One JSON line of scripted input, e.g.
/// `{"surface": 1, "tap": [12, 4]}` or `{"variant": "double", "alpha": 160}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExternalCommand {
    /// Target tile; `None` means every tile (taps go to tile 0).
    pub surface: Option<usize>,
    /// Tap position in tile-local pixels.
    pub tap: Option<[f32; 2]>,
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub ripple: RippleSettings,
}

impl ExternalCommand {
    fn has_ripple_settings(&self) -> bool {
        let r = &self.ripple;
        r.color.is_some()
            || r.variant.is_some()
            || r.duration_ms.is_some()
            || r.frame_interval_ms.is_some()
            || r.alpha.is_some()
            || r.padding.is_some()
            || r.centered.is_some()
            || r.zoom.is_some()
            || r.zoom_scale.is_some()
            || r.zoom_duration_ms.is_some()
    }
}

/// Parse one input line; blank or malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<ExternalCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(cmd) => Some(cmd),
        Err(e) => {
            log::warn!("ignoring external command {line:?}: {e}");
            None
        }
    }
}

/// Apply `cmd` to the addressed tiles. Settings are layered on each tile's
/// pending config and validated for every target before anything changes.
pub fn apply(
    cmd: &ExternalCommand,
    surfaces: &mut [RippleSurface],
    now: Instant,
) -> Result<(), ConfigError> {
    let targets: Vec<usize> = match cmd.surface {
        Some(i) if i < surfaces.len() => vec![i],
        Some(i) => {
            log::warn!("external command for unknown surface {i}");
            return Ok(());
        }
        None => (0..surfaces.len()).collect(),
    };

    if cmd.has_ripple_settings() {
        let resolved = targets
            .iter()
            .map(|&i| cmd.ripple.resolve(surfaces[i].pending_config()))
            .collect::<Result<Vec<_>, _>>()?;
        for (&i, config) in targets.iter().zip(resolved) {
            surfaces[i].set_config(config);
        }
    }
    if let Some(enabled) = cmd.enabled {
        for &i in &targets {
            surfaces[i].set_enabled(enabled);
        }
    }
    if let Some([x, y]) = cmd.tap {
        let i = cmd.surface.unwrap_or(0);
        if let Some(surface) = surfaces.get_mut(i)
            && !surface.tap_local(x, y, now)
        {
            log::debug!("tap on surface {i} ignored (busy or disabled)");
        }
    }
    Ok(())
}

pub enum CommandSource {
    Stdin,
    File(PathBuf),
}

/// Read commands on a background thread and forward them over a channel.
pub fn spawn_reader(source: CommandSource) -> Receiver<ExternalCommand> {
    let (tx, rx) = mpsc::channel::<ExternalCommand>();

    match source {
        CommandSource::Stdin => {
            std::thread::spawn(move || {
                use std::io::BufRead;
                let stdin = std::io::BufReader::new(std::io::stdin());
                for line in stdin.lines() {
                    let Ok(line) = line else { break };
                    if let Some(cmd) = parse_line(&line)
                        && tx.send(cmd).is_err()
                    {
                        break;
                    }
                }
            });
        }
        CommandSource::File(path) => {
            std::thread::spawn(move || watch_file(path, tx));
        }
    }

    rx
}

/// Send the newest non-blank line of `path` now and after every change.
fn watch_file(path: PathBuf, tx: Sender<ExternalCommand>) {
    let send_latest = |tx: &Sender<ExternalCommand>| -> bool {
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return true;
        };
        match contents.lines().rfind(|l| !l.trim().is_empty()).and_then(parse_line) {
            Some(cmd) => tx.send(cmd).is_ok(),
            None => true,
        }
    };

    if !send_latest(&tx) {
        return;
    }

    let (file_tx, file_rx) = mpsc::channel();
    let mut watcher = match notify::recommended_watcher(move |res| {
        let _ = file_tx.send(res);
    }) {
        Ok(w) => w,
        Err(e) => {
            log::error!("cannot watch {}: {e}", path.display());
            return;
        }
    };
    if let Err(e) = notify::Watcher::watch(&mut watcher, &path, notify::RecursiveMode::NonRecursive)
    {
        log::error!("cannot watch {}: {e}", path.display());
        return;
    }
    while let Ok(Ok(_event)) = file_rx.recv() {
        if !send_latest(&tx) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ripple::{RippleConfig, RippleVariant, SurfaceId};
    use crate::surface::Rect;

    fn tiles(n: usize) -> Vec<RippleSurface> {
        (0..n)
            .map(|i| {
                RippleSurface::new(
                    SurfaceId(i),
                    Rect { x: i as u32 * 20, y: 0, width: 16, height: 16 },
                    RippleConfig::default(),
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_tap_and_settings() {
        let cmd = parse_line(r#"{"surface": 1, "tap": [3, 4], "variant": "double"}"#).unwrap();
        assert_eq!(cmd.surface, Some(1));
        assert_eq!(cmd.tap, Some([3.0, 4.0]));
        assert_eq!(cmd.ripple.variant, Some(RippleVariant::Double));
        assert!(cmd.has_ripple_settings());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_line("").is_none());
        assert!(parse_line("not json").is_none());
        assert!(parse_line(r#"{"tap": "left"}"#).is_none());
    }

    #[test]
    fn test_apply_settings_to_all_tiles() {
        let mut surfaces = tiles(3);
        let cmd = parse_line(r#"{"alpha": 200}"#).unwrap();
        apply(&cmd, &mut surfaces, Instant::now()).unwrap();
        assert!(surfaces.iter().all(|s| s.config().alpha == 200));
    }

    #[test]
    fn test_apply_invalid_settings_changes_nothing() {
        let mut surfaces = tiles(2);
        let cmd = parse_line(r#"{"duration_ms": 0}"#).unwrap();
        assert!(apply(&cmd, &mut surfaces, Instant::now()).is_err());
        assert!(surfaces.iter().all(|s| s.config().duration_ms == 400));
    }

    #[test]
    fn test_changes_queued_during_a_run_accumulate() {
        let mut surfaces = tiles(1);
        let now = Instant::now();
        assert!(surfaces[0].tap_local(8.0, 8.0, now));

        for line in [r#"{"alpha": 200}"#, r#"{"variant": "double"}"#] {
            apply(&parse_line(line).unwrap(), &mut surfaces, now).unwrap();
        }
        assert_eq!(surfaces[0].config().alpha, 90);
        assert_eq!(surfaces[0].pending_config().alpha, 200);

        while surfaces[0].engine().is_running() {
            surfaces[0].redraw(now);
        }
        let config = surfaces[0].config();
        assert_eq!(config.alpha, 200);
        assert_eq!(config.variant, RippleVariant::Double);
    }

    #[test]
    fn test_apply_tap_targets_one_tile() {
        let mut surfaces = tiles(2);
        let cmd = parse_line(r#"{"surface": 1, "tap": [8, 8]}"#).unwrap();
        apply(&cmd, &mut surfaces, Instant::now()).unwrap();
        assert!(!surfaces[0].is_animating());
        assert!(surfaces[1].is_animating());
    }

    #[test]
    fn test_apply_disable_blocks_tap() {
        let mut surfaces = tiles(1);
        let cmd = parse_line(r#"{"enabled": false, "tap": [1, 1]}"#).unwrap();
        apply(&cmd, &mut surfaces, Instant::now()).unwrap();
        assert!(!surfaces[0].is_enabled());
        assert!(!surfaces[0].is_animating());
    }
}
