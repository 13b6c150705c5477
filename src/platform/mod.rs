#[cfg(windows)]
pub mod win32;

use winit::monitor::MonitorHandle;

use crate::geometry::{Rect, ScreenGeometry};

#[cfg(windows)]
pub use win32::DesktopEnvironment;

/// Full monitor rect from winit; the work area comes from the OS where it
/// can be queried.
pub fn screen_geometry(monitor: &MonitorHandle) -> ScreenGeometry {
    let pos = monitor.position();
    let size = monitor.size();
    let full = Rect::new(
        pos.x as f32,
        pos.y as f32,
        pos.x as f32 + size.width as f32,
        pos.y as f32 + size.height as f32,
    );

    #[cfg(windows)]
    let available = win32::work_area(pos.x, pos.y).unwrap_or(full);
    #[cfg(not(windows))]
    let available = full;

    ScreenGeometry::new(full, available)
}

/// Environment for platforms without global cursor or window queries: the
/// cursor is whatever the pet window last saw, and no windows exist.
#[cfg(not(windows))]
pub struct DesktopEnvironment {
    cursor: glam::Vec2,
}

#[cfg(not(windows))]
impl DesktopEnvironment {
    pub fn new(_window: &winit::window::Window) -> Self {
        log::info!("No desktop window enumeration on this platform; pet only sees the cursor over itself");
        Self {
            cursor: glam::Vec2::splat(f32::NEG_INFINITY),
        }
    }

    pub fn observe_cursor(&mut self, global: glam::Vec2) {
        self.cursor = global;
    }

    pub fn own_window_id(&self) -> Option<crate::sensor::WindowId> {
        None
    }
}

#[cfg(not(windows))]
impl crate::sensor::Environment for DesktopEnvironment {
    fn cursor_position(&self) -> glam::Vec2 {
        self.cursor
    }

    fn windows(&self) -> crate::error::Result<Vec<crate::sensor::DesktopWindow>> {
        Ok(Vec::new())
    }
}
