use std::cell::Cell;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind},
    execute, terminal,
};
use rand::RngExt;

use termripple::config::{self, Config};
use termripple::error::ConfigError;
use termripple::external::{self, CommandSource, ExternalCommand};
use termripple::frames;
use termripple::render::{Canvas, ColorMode};
use termripple::ripple::{RippleConfig, RippleSettings, RippleVariant, SurfaceId};
use termripple::surface::{self, Rect, RippleSurface};

#[derive(Parser)]
#[command(name = "termripple", about = "Touch-feedback ripples in the terminal")]
struct Cli {
    /// Ripple variant for a single tile (omit to use the config file or show all variants)
    #[arg(short, long, value_enum)]
    variant: Option<RippleVariant>,

    /// Ripple color (#RRGGBB or #AARRGGBB)
    #[arg(long)]
    ripple_color: Option<String>,

    /// Ripple duration in milliseconds
    #[arg(short, long, allow_negative_numbers = true)]
    duration: Option<i64>,

    /// Milliseconds between ripple frames
    #[arg(long, allow_negative_numbers = true)]
    frame_interval: Option<i64>,

    /// Starting ripple opacity (0-255)
    #[arg(short, long, allow_negative_numbers = true)]
    alpha: Option<i64>,

    /// Pixels taken off the maximum radius
    #[arg(long, allow_negative_numbers = true)]
    padding: Option<f32>,

    /// Always start ripples from the tile center
    #[arg(long)]
    centered: bool,

    /// Pulse-zoom the tile alongside the ripple
    #[arg(long)]
    zoom: bool,

    /// Peak zoom factor
    #[arg(long)]
    zoom_scale: Option<f32>,

    /// Zoom duration in milliseconds (each way)
    #[arg(long, allow_negative_numbers = true)]
    zoom_duration: Option<i64>,

    /// Color mode
    #[arg(short, long, value_enum)]
    color: Option<ColorMode>,

    /// Tap a random tile every N seconds (0 = disabled)
    #[arg(long)]
    auto: Option<f64>,

    /// Hide the status bar
    #[arg(long)]
    clean: bool,

    /// Read JSON-lines commands from stdin
    #[arg(long)]
    stdin: bool,

    /// Watch a file for JSON-lines commands
    #[arg(long, value_name = "FILE")]
    commands: Option<PathBuf>,

    /// Render one ripple to PNG frames in DIR and exit
    #[arg(long, value_name = "DIR")]
    frames_out: Option<PathBuf>,

    /// Surface size for --frames-out
    #[arg(long, default_value = "64x32")]
    size: String,

    /// Tap point for --frames-out (defaults to the center)
    #[arg(long, value_name = "X,Y")]
    tap: Option<String>,

    /// Print the config file path and exit
    #[arg(long)]
    show_config: bool,

    /// Print a commented default config file and exit
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn ripple_settings(&self) -> RippleSettings {
        RippleSettings {
            color: self.ripple_color.clone(),
            variant: self.variant,
            duration_ms: self.duration,
            frame_interval_ms: self.frame_interval,
            alpha: self.alpha,
            padding: self.padding,
            centered: self.centered.then_some(true),
            zoom: self.zoom.then_some(true),
            zoom_scale: self.zoom_scale,
            zoom_duration_ms: self.zoom_duration,
        }
    }
}

/// Background behind and between tiles.
const BACKGROUND: (u8, u8, u8) = (14, 14, 20);
/// Gap between tiles, in pixels.
const TILE_GAP: u32 = 2;
/// Longest the loop sleeps waiting for input.
const MAX_IDLE: Duration = Duration::from_millis(100);

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if cli.init_config {
        print!("{}", config::default_config_string());
        return Ok(());
    }
    if cli.show_config {
        match config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("No config directory on this platform"),
        }
        return Ok(());
    }

    let Config {
        ripple: file_ripple,
        color_mode,
        gallery,
        auto,
        clean,
        color_quant,
    } = config::load_config()?;
    let ripple = file_ripple
        .merged(cli.ripple_settings())
        .resolve(&RippleConfig::default())?;

    if let Some(ref dir) = cli.frames_out {
        let (w, h) = parse_size(&cli.size)?;
        let (x, y) = match cli.tap {
            Some(ref s) => parse_point(s)?,
            None => ((w / 2) as f32, (h / 2) as f32),
        };
        let rect = Rect { x: 0, y: 0, width: w, height: h };
        let mut tile = RippleSurface::new(SurfaceId(0), rect, ripple);
        let n = frames::dump_run(&mut tile, x, y, dir)?;
        println!("Wrote {} frames to {}", n, dir.display());
        return Ok(());
    }

    // A variant on the command line means a single tile; otherwise the
    // config decides, defaulting to the gallery.
    let variants: Vec<RippleVariant> = if cli.variant.is_none() && gallery.unwrap_or(true) {
        RippleVariant::ALL.to_vec()
    } else {
        vec![ripple.variant]
    };
    let settings = Settings {
        color_mode: cli.color.or(color_mode).unwrap_or_default(),
        color_quant: color_quant.unwrap_or(0),
        hide_status: cli.clean || clean.unwrap_or(false),
        auto: cli
            .auto
            .or(auto)
            .filter(|s| *s > 0.0)
            .map(Duration::from_secs_f64),
    };
    let commands = if cli.stdin {
        Some(external::spawn_reader(CommandSource::Stdin))
    } else {
        cli.commands
            .clone()
            .map(|p| external::spawn_reader(CommandSource::File(p)))
    };

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        event::EnableMouseCapture
    )?;

    let mut writer = BufWriter::with_capacity(256 * 1024, stdout);
    let result = App::new(&variants, &ripple, settings)
        .and_then(|mut app| app.run(&mut writer, commands.as_ref()));

    // Cleanup
    execute!(
        writer,
        event::DisableMouseCapture,
        cursor::Show,
        terminal::LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;

    result
}

fn parse_size(s: &str) -> Result<(u32, u32), ConfigError> {
    let bad = || ConfigError::InvalidSize(s.to_string());
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(bad)?;
    let w: u32 = w.trim().parse().map_err(|_| bad())?;
    let h: u32 = h.trim().parse().map_err(|_| bad())?;
    if w == 0 || h == 0 {
        return Err(bad());
    }
    Ok((w, h))
}

fn parse_point(s: &str) -> Result<(f32, f32), ConfigError> {
    let bad = || ConfigError::InvalidPoint(s.to_string());
    let (x, y) = s.split_once(',').ok_or_else(bad)?;
    let x: f32 = x.trim().parse().map_err(|_| bad())?;
    let y: f32 = y.trim().parse().map_err(|_| bad())?;
    Ok((x, y))
}

struct Settings {
    color_mode: ColorMode,
    color_quant: u8,
    hide_status: bool,
    auto: Option<Duration>,
}

struct App {
    canvas: Canvas,
    surfaces: Vec<RippleSurface>,
    completed: Rc<Cell<u64>>,
    settings: Settings,
    cols: u16,
    rows: u16,
    next_auto: Option<Instant>,
    rng: rand::rngs::ThreadRng,
}

impl App {
    fn new(variants: &[RippleVariant], base: &RippleConfig, settings: Settings) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let canvas = Self::make_canvas(cols, rows, &settings);
        let rects = surface::layout(canvas.width as u32, canvas.height as u32, variants.len(), TILE_GAP);
        let completed = Rc::new(Cell::new(0));

        let surfaces = variants
            .iter()
            .zip(rects)
            .enumerate()
            .map(|(i, (&variant, rect))| {
                let config = RippleConfig { variant, ..base.clone() };
                let mut tile = RippleSurface::new(SurfaceId(i), rect, config);
                let counter = Rc::clone(&completed);
                tile.set_on_complete(move |id| {
                    counter.set(counter.get() + 1);
                    log::info!("ripple on surface {} complete", id.0);
                });
                tile
            })
            .collect();

        let next_auto = settings.auto.map(|d| Instant::now() + d);
        let mut app = App {
            canvas,
            surfaces,
            completed,
            settings,
            cols,
            rows,
            next_auto,
            rng: rand::rng(),
        };
        app.repaint_all();
        Ok(app)
    }

    fn make_canvas(cols: u16, rows: u16, settings: &Settings) -> Canvas {
        let display_rows = if settings.hide_status {
            rows as usize
        } else {
            (rows as usize).saturating_sub(1)
        };
        let mut canvas = Canvas::new(cols as usize, display_rows, settings.color_mode);
        canvas.color_quant = settings.color_quant;
        canvas
    }

    /// Recreate the canvas for the current terminal size and lay tiles out again.
    fn rebuild(&mut self) {
        self.canvas = Self::make_canvas(self.cols, self.rows, &self.settings);
        let rects = surface::layout(
            self.canvas.width as u32,
            self.canvas.height as u32,
            self.surfaces.len(),
            TILE_GAP,
        );
        for (tile, rect) in self.surfaces.iter_mut().zip(rects) {
            tile.resize(rect);
        }
        self.repaint_all();
    }

    fn repaint_all(&mut self) {
        self.canvas.clear(BACKGROUND);
        for tile in &self.surfaces {
            let r = tile.rect();
            self.canvas.blit(tile.frame(), r.x as usize, r.y as usize);
        }
    }

    fn run(&mut self, stdout: &mut BufWriter<io::Stdout>, commands: Option<&Receiver<ExternalCommand>>) -> io::Result<()> {
        let mut full_frame = true;
        loop {
            let now = Instant::now();
            let timeout = self
                .next_wakeup(now)
                .map_or(MAX_IDLE, |at| at.saturating_duration_since(now).min(MAX_IDLE));

            if event::poll(timeout)? {
                loop {
                    match event::read()? {
                        Event::Key(KeyEvent { code, .. }) => {
                            if !self.handle_key(code, &mut full_frame) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(MouseEvent {
                            kind: MouseEventKind::Down(MouseButton::Left),
                            column,
                            row,
                            ..
                        }) => self.tap_cell(column, row, Instant::now()),
                        Event::Resize(w, h) => {
                            self.cols = w;
                            self.rows = h;
                            self.rebuild();
                            write!(stdout, "\x1b[2J")?;
                            full_frame = true;
                        }
                        _ => {}
                    }
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }

            if let Some(rx) = commands {
                while let Ok(cmd) = rx.try_recv() {
                    if let Err(e) = external::apply(&cmd, &mut self.surfaces, Instant::now()) {
                        log::warn!("rejected external command: {e}");
                    }
                }
            }

            self.auto_tap(Instant::now());

            let now = Instant::now();
            let mut dirty = full_frame;
            for tile in &mut self.surfaces {
                if tile.needs_redraw(now) {
                    tile.redraw(now);
                    let r = tile.rect();
                    self.canvas.blit(tile.frame(), r.x as usize, r.y as usize);
                    dirty = true;
                }
            }
            if dirty {
                self.present(stdout)?;
                full_frame = false;
            }
        }
    }

    /// Returns false when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode, full_frame: &mut bool) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            // Cycle ripple variant on every tile
            KeyCode::Char('v') => {
                for tile in &mut self.surfaces {
                    let mut config = tile.pending_config().clone();
                    let idx = RippleVariant::ALL
                        .iter()
                        .position(|&v| v == config.variant)
                        .unwrap_or(0);
                    config.variant = RippleVariant::ALL[(idx + 1) % RippleVariant::ALL.len()];
                    tile.set_config(config);
                }
            }
            // Toggle zoom pulse
            KeyCode::Char('z') => {
                for tile in &mut self.surfaces {
                    let mut config = tile.pending_config().clone();
                    config.zoom = !config.zoom;
                    tile.set_config(config);
                }
            }
            // Toggle enabled
            KeyCode::Char('e') => {
                for tile in &mut self.surfaces {
                    let enabled = tile.is_enabled();
                    tile.set_enabled(!enabled);
                }
            }
            // Cycle color mode
            KeyCode::Char('c') => {
                self.settings.color_mode = self.settings.color_mode.next();
                self.canvas.color_mode = self.settings.color_mode;
                *full_frame = true;
            }
            // Toggle status bar
            KeyCode::Char('h') => {
                self.settings.hide_status = !self.settings.hide_status;
                self.rebuild();
                *full_frame = true;
            }
            // Tap the center of every tile
            KeyCode::Char(' ') => {
                let now = Instant::now();
                for tile in &mut self.surfaces {
                    let r = tile.rect();
                    tile.tap_local(r.width as f32 / 2.0, r.height as f32 / 2.0, now);
                }
            }
            _ => {}
        }
        true
    }

    /// Mouse click at a terminal cell; half-block cells are two pixels tall.
    fn tap_cell(&mut self, column: u16, row: u16, now: Instant) {
        let (px, py) = (column as u32, row as u32 * 2);
        for tile in &mut self.surfaces {
            if tile.tap(px, py, now) {
                log::debug!("tap at ({px}, {py}) started surface {}", tile.id().0);
                break;
            }
        }
    }

    fn auto_tap(&mut self, now: Instant) {
        let (Some(every), Some(at)) = (self.settings.auto, self.next_auto) else {
            return;
        };
        if now < at || self.surfaces.is_empty() {
            return;
        }
        let i = self.rng.random_range(0..self.surfaces.len());
        let r = self.surfaces[i].rect();
        if r.width > 0 && r.height > 0 {
            let x = self.rng.random_range(0.0..r.width as f32);
            let y = self.rng.random_range(0.0..r.height as f32);
            self.surfaces[i].tap_local(x, y, now);
        }
        self.next_auto = Some(now + every);
    }

    fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        self.surfaces
            .iter()
            .filter_map(|t| t.next_deadline(now))
            .chain(self.next_auto)
            .min()
    }

    fn present(&mut self, stdout: &mut BufWriter<io::Stdout>) -> io::Result<()> {
        let frame = self.canvas.render();
        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame.as_bytes())?;

        if !self.settings.hide_status {
            let names: Vec<&str> = self
                .surfaces
                .iter()
                .map(|t| t.pending_config().variant.name())
                .collect();
            let status = format!(
                " termripple | {} | {:?} | {} ripples | [click] ripple  [space] all  [v] variant  [z] zoom  [e] enable  [c] color  [h] hide  [q] quit ",
                names.join(" / "),
                self.settings.color_mode,
                self.completed.get(),
            );
            let w = self.cols as usize;
            let truncated: String = status.chars().take(w).collect();
            let padded = format!("{:<width$}", truncated, width = w);
            write!(stdout, "\x1b[{};1H\x1b[7m{}\x1b[0m", self.rows, padded)?;
        }
        stdout.flush()
    }
}
