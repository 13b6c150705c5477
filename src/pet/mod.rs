pub mod history;

use glam::Vec2;

use crate::geometry::{Rect, ScreenGeometry};
use history::PositionHistory;

/// Which way the pet is looking. Doubles as the walking gait sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum Facing {
    Left = -1,
    #[default]
    Neutral = 0,
    Right = 1,
}

impl Facing {
    pub fn sign(self) -> f32 {
        self as i8 as f32
    }

    /// Facing toward `to` when looking from `from` along X.
    pub fn toward(from: f32, to: f32) -> Self {
        if to < from {
            Facing::Left
        } else if to > from {
            Facing::Right
        } else {
            Facing::Neutral
        }
    }

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        if rng.bool() {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

/// The creature's physical state. Owned by the controller.
#[derive(Debug, Clone)]
pub struct Pet {
    /// Top-left corner in screen pixels.
    pub pos: Vec2,
    /// Pixels per tick.
    pub vel: Vec2,
    pub facing: Facing,
    pub on_ground: bool,
    pub size: Vec2,
    /// Recent positions, sampled while grabbed.
    pub history: PositionHistory,
    /// Horizontal velocity before the current jump, restored on landing.
    pub launch_vx: f32,
}

impl Pet {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            facing: Facing::Neutral,
            on_ground: true,
            size,
            history: PositionHistory::new(),
            launch_vx: 0.0,
        }
    }

    /// Spawn standing on the floor at a random X, at least one body width
    /// away from either edge when the screen allows it.
    pub fn spawn(screen: &ScreenGeometry, size: Vec2, rng: &mut fastrand::Rng) -> Self {
        let avail = screen.available;
        let lo = avail.left + size.x;
        let hi = avail.right - 2.0 * size.x;
        let x = if hi > lo {
            lo + rng.f32() * (hi - lo)
        } else {
            avail.left
        };
        Self::new(Vec2::new(x, screen.ground_y(size.y)), size)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Stop all motion.
    pub fn halt(&mut self) {
        self.vel = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_signs() {
        assert_eq!(Facing::Left.sign(), -1.0);
        assert_eq!(Facing::Neutral.sign(), 0.0);
        assert_eq!(Facing::Right.sign(), 1.0);
        assert_eq!(Facing::toward(10.0, 3.0), Facing::Left);
        assert_eq!(Facing::toward(10.0, 10.0), Facing::Neutral);
    }

    #[test]
    fn spawn_on_ground_within_margins() {
        let screen = ScreenGeometry::new(
            Rect::new(0.0, 0.0, 1920.0, 1080.0),
            Rect::new(0.0, 0.0, 1920.0, 1040.0),
        );
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            let pet = Pet::spawn(&screen, Vec2::splat(100.0), &mut rng);
            assert_eq!(pet.pos.y, 940.0);
            assert!(pet.pos.x >= 100.0 && pet.pos.x <= 1720.0);
            assert!(pet.on_ground);
        }
    }
}
