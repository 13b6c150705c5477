use glam::Vec2;

use crate::error::Result;
use crate::geometry::Rect;

/// Opaque OS handle of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// A top-level desktop window as reported by the OS.
#[derive(Debug, Clone)]
pub struct DesktopWindow {
    pub id: WindowId,
    pub title: String,
    pub rect: Rect,
    pub visible: bool,
}

/// Live OS queries the pet needs. Injected so the state machine never
/// reaches for ambient globals.
pub trait Environment {
    /// Global cursor position in screen pixels.
    fn cursor_position(&self) -> Vec2;

    /// Visible top-level windows in OS enumeration order.
    fn windows(&self) -> Result<Vec<DesktopWindow>>;
}

/// What the pet noticed this tick. Never stored across ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perception {
    None,
    SeesCursor(Vec2),
    SeesWindow { id: WindowId, rect: Rect },
}

/// Answers "what is nearby" for a pet rectangle.
#[derive(Debug, Clone)]
pub struct Sensor {
    pub sight_distance: f32,
    /// Windows whose top lies below this line sit in the taskbar area.
    pub available_bottom: f32,
    pub own_window: Option<WindowId>,
    pub ignored_titles: Vec<String>,
}

impl Sensor {
    pub fn new(sight_distance: f32, available_bottom: f32, ignored_titles: Vec<String>) -> Self {
        Self {
            sight_distance,
            available_bottom,
            own_window: None,
            ignored_titles,
        }
    }

    /// Cursor first, then the first nearby window in enumeration order.
    ///
    /// When several windows qualify the winner depends on the OS z-order,
    /// so callers must not rely on which one is reported.
    pub fn scan(&self, env: &dyn Environment, pet: &Rect) -> Perception {
        let cursor = env.cursor_position();
        if self.sees_cursor(pet, cursor) {
            log::debug!("Cursor in sight at ({:.0}, {:.0})", cursor.x, cursor.y);
            return Perception::SeesCursor(cursor);
        }

        let windows = match env.windows() {
            Ok(windows) => windows,
            Err(e) => {
                log::warn!("{e}; treating as no windows this tick");
                return Perception::None;
            }
        };

        for w in &windows {
            if self.is_candidate(w) && self.is_near(pet, &w.rect) {
                log::debug!("Window in sight: {:?} {:?}", w.title, w.rect);
                return Perception::SeesWindow {
                    id: w.id,
                    rect: w.rect,
                };
            }
        }
        Perception::None
    }

    pub fn sees_cursor(&self, pet: &Rect, cursor: Vec2) -> bool {
        pet.inflate(self.sight_distance).contains_point(cursor)
    }

    fn is_candidate(&self, w: &DesktopWindow) -> bool {
        w.visible
            && Some(w.id) != self.own_window
            && !self.ignored_titles.iter().any(|t| *t == w.title)
            && w.rect.top <= self.available_bottom
    }

    /// Near but not inside. Tests the pet's right and bottom edges against
    /// the window rect grown by the sight distance, edges inclusive.
    pub fn is_near(&self, pet: &Rect, window: &Rect) -> bool {
        if window.contains_rect(pet) {
            return false;
        }
        let sd = self.sight_distance;
        let near_x = pet.right >= window.left - sd && pet.right <= window.right + sd;
        let near_y = pet.bottom >= window.top - sd && pet.bottom <= window.bottom + sd;
        near_x && near_y
    }
}
