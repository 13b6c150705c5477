use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::config::{PetConfig, WINDOW_TITLE};
use crate::controller::PetController;
use crate::error::{PetError, Result};
use crate::platform::{self, DesktopEnvironment};
use crate::render::GpuState;
use crate::sensor::Environment;
use crate::sprite::{self, AssetMode, SpriteSheet};
use crate::tray::{TrayCommand, TrayIcon};

/// Most update ticks run in one wake before the backlog is dropped.
const MAX_CATCH_UP_TICKS: u32 = 5;
/// How often to log tick timing (seconds).
const STATS_LOG_INTERVAL: f64 = 5.0;

// ---------------------------------------------------------------------------
// Tick timing
// ---------------------------------------------------------------------------

struct TickStats {
    tick_count: u64,
    last_log_time: Instant,
    time_sum: f64,
    time_max: f64,
    ticks_since_log: u32,
    overruns: u32,
}

impl TickStats {
    fn new() -> Self {
        Self {
            tick_count: 0,
            last_log_time: Instant::now(),
            time_sum: 0.0,
            time_max: 0.0,
            ticks_since_log: 0,
            overruns: 0,
        }
    }

    /// Record how long one update took. Returns true if it overran `budget`.
    fn record_tick(&mut self, took: Duration, budget: Duration) -> bool {
        let secs = took.as_secs_f64();
        self.tick_count += 1;
        self.ticks_since_log += 1;
        self.time_sum += secs;
        self.time_max = self.time_max.max(secs);

        let overran = took > budget;
        if overran {
            self.overruns += 1;
            log::warn!(
                "Update tick took {:.1}ms, over the {}ms period",
                secs * 1000.0,
                budget.as_millis()
            );
        }

        if self.last_log_time.elapsed().as_secs_f64() >= STATS_LOG_INTERVAL {
            log::debug!(
                "Ticks: {} | avg: {:.2}ms | max: {:.2}ms | overruns: {} | total: {}",
                self.ticks_since_log,
                self.time_sum / self.ticks_since_log as f64 * 1000.0,
                self.time_max * 1000.0,
                self.overruns,
                self.tick_count,
            );
            self.last_log_time = Instant::now();
            self.time_sum = 0.0;
            self.time_max = 0.0;
            self.ticks_since_log = 0;
            self.overruns = 0;
        }
        overran
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state. Everything below `config` and `sprites` is
/// created in `resumed`.
struct App {
    config: PetConfig,
    sprites: SpriteSheet,

    controller: Option<PetController>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    env: Option<DesktopEnvironment>,
    tray: Option<TrayIcon>,

    visible: bool,
    /// Last pointer position inside the pet window.
    cursor_local: Vec2,
    /// Last position pushed to the window.
    last_pos: Option<PhysicalPosition<i32>>,

    next_update: Instant,
    next_draw: Instant,
    tick_stats: TickStats,

    /// First fatal error; `run` returns it once the loop exits.
    fatal: Option<PetError>,
}

impl App {
    fn new(config: PetConfig, sprites: SpriteSheet) -> Self {
        let now = Instant::now();
        Self {
            config,
            sprites,
            controller: None,
            window: None,
            gpu: None,
            env: None,
            tray: None,
            visible: true,
            cursor_local: Vec2::ZERO,
            last_pos: None,
            next_update: now,
            next_draw: now,
            tick_stats: TickStats::new(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: PetError) {
        log::error!("{err}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        event_loop.exit();
    }

    fn create_pet(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or(PetError::NoDisplay)?;
        let screen = platform::screen_geometry(&monitor);
        log::info!("Monitor {:?}, work area {:?}", screen.full, screen.available);

        let mut controller = PetController::new(self.config.clone(), screen);
        let frame = controller.draw();
        let side = self.config.size.round() as u32;

        // On Windows transparency comes from DirectComposition; with_transparent
        // would add WS_EX_LAYERED, which conflicts with it. Start hidden so
        // DWM never caches a frame without the overlay styles.
        let attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_decorations(false)
            .with_resizable(false)
            .with_visible(false)
            .with_transparent(cfg!(not(windows)))
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(PhysicalSize::new(side, side))
            .with_position(PhysicalPosition::new(frame.position.x, frame.position.y));

        let window = Arc::new(event_loop.create_window(attrs)?);

        #[cfg(windows)]
        platform::win32::setup_overlay(&window);

        let env = DesktopEnvironment::new(&window);
        if let Some(id) = env.own_window_id() {
            controller.set_own_window(id);
        }

        log::info!(
            "Pet window created: {}x{} on {:?}",
            side,
            side,
            monitor.name().unwrap_or_default()
        );

        let gpu = GpuState::new(window.clone(), &self.sprites)?;
        log::info!("wgpu + sprite pipeline initialized");

        self.tray = match TrayIcon::new(WINDOW_TITLE) {
            Ok(tray) => Some(tray),
            Err(e) => {
                log::warn!("{e}; running without a tray icon");
                None
            }
        };

        window.set_visible(true);

        let now = Instant::now();
        self.next_update = now + self.config.tick;
        self.next_draw = now;
        self.last_pos = Some(PhysicalPosition::new(frame.position.x, frame.position.y));
        self.controller = Some(controller);
        self.env = Some(env);
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    /// Run every update tick that is due, at most `MAX_CATCH_UP_TICKS`.
    fn run_updates(&mut self, now: Instant) {
        let (Some(controller), Some(env)) = (&mut self.controller, &self.env) else {
            return;
        };
        let tick = self.config.tick;

        let mut ran = 0;
        while now >= self.next_update {
            if ran == MAX_CATCH_UP_TICKS {
                let behind = now.duration_since(self.next_update);
                log::info!(
                    "Fell {}ms behind; dropping pending update ticks",
                    behind.as_millis()
                );
                self.next_update = now + tick;
                break;
            }
            let start = Instant::now();
            controller.update(env);
            self.tick_stats.record_tick(start.elapsed(), tick);
            self.next_update += tick;
            ran += 1;
        }
    }

    /// Move the window if the pet moved since the last sync.
    fn sync_position(&mut self) {
        let (Some(controller), Some(window)) = (&self.controller, &self.window) else {
            return;
        };
        let p = controller.draw().position;
        let pos = PhysicalPosition::new(p.x, p.y);
        if self.last_pos != Some(pos) {
            window.set_outer_position(pos);
            self.last_pos = Some(pos);
        }
    }

    fn handle_tray(&mut self, event_loop: &ActiveEventLoop) {
        let Some(tray) = &mut self.tray else {
            return;
        };
        match tray.poll() {
            TrayCommand::ToggleVisibility => {
                self.visible = !self.visible;
                if let Some(window) = &self.window {
                    window.set_visible(self.visible);
                }
                log::info!("Pet {}", if self.visible { "shown" } else { "hidden" });
            }
            TrayCommand::Quit => {
                log::info!("Quit from tray");
                event_loop.exit();
            }
            TrayCommand::None => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_pet(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.fatal.is_some() || self.window.is_none() {
            return;
        }

        self.handle_tray(event_loop);

        let now = Instant::now();
        self.run_updates(now);
        self.sync_position();

        if now >= self.next_draw {
            if self.visible {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            self.next_draw += self.config.tick;
            if self.next_draw < now {
                self.next_draw = now + self.config.tick;
            }
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(
            self.next_update.min(self.next_draw),
        ));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_local = Vec2::new(position.x as f32, position.y as f32);
                let (Some(controller), Some(env)) = (&mut self.controller, &mut self.env) else {
                    return;
                };
                env.observe_cursor(controller.pet().pos + self.cursor_local);
                if controller.is_grabbed() {
                    controller.drag(env.cursor_position());
                    self.sync_position();
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(env) = &mut self.env {
                    env.observe_cursor(Vec2::splat(f32::NEG_INFINITY));
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let Some(controller) = &mut self.controller else {
                    return;
                };
                match state {
                    ElementState::Pressed => controller.press(self.cursor_local),
                    ElementState::Released => controller.release(),
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let (Some(gpu), Some(controller)) = (&self.gpu, &self.controller) {
                    gpu.render(&controller.draw().sprite);
                }
            }
            _ => {}
        }
    }
}

/// Load sprites, open the pet window and run until quit.
pub fn run(config: PetConfig) -> Result<()> {
    let (assets_dir, mode) = sprite::resolve_assets_dir(config.assets_dir.as_deref());
    match mode {
        AssetMode::Explicit => log::info!("Assets from command line: {}", assets_dir.display()),
        AssetMode::Packaged => log::info!("Assets next to executable: {}", assets_dir.display()),
        AssetMode::Source => log::info!("Assets from working directory: {}", assets_dir.display()),
    }
    let sprites = SpriteSheet::load(&assets_dir)?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, sprites);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
