//! Scripted environment for deterministic tests.

use glam::Vec2;

use crate::error::{PetError, Result};
use crate::sensor::{DesktopWindow, Environment};

pub struct FakeEnvironment {
    pub cursor: Vec2,
    pub windows: Vec<DesktopWindow>,
    pub fail: bool,
}

impl FakeEnvironment {
    pub fn with_cursor(cursor: Vec2) -> Self {
        Self {
            cursor,
            windows: Vec::new(),
            fail: false,
        }
    }

    /// Cursor parked far outside any sight range.
    pub fn far_cursor() -> Self {
        Self::with_cursor(Vec2::splat(-100_000.0))
    }

    pub fn window(mut self, w: DesktopWindow) -> Self {
        self.windows.push(w);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Environment for FakeEnvironment {
    fn cursor_position(&self) -> Vec2 {
        self.cursor
    }

    fn windows(&self) -> Result<Vec<DesktopWindow>> {
        if self.fail {
            return Err(PetError::WindowQuery("access denied".into()));
        }
        Ok(self.windows.clone())
    }
}
