use glam::Vec2;

use crate::behavior::BehaviorState;
use crate::config::PetConfig;
use crate::geometry::{Rect, ScreenGeometry};
use crate::pet::history::PositionHistory;
use crate::pet::{Facing, Pet};

/// Where the pet may stand, derived once from the screen and pet size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    /// Valid range for the pet's top-left corner.
    pub walkable: Rect,
    /// Floor line for the pet's top-left corner.
    pub ground_y: f32,
}

impl Arena {
    pub fn new(screen: &ScreenGeometry, size: Vec2) -> Self {
        Self {
            walkable: screen.walkable(size),
            ground_y: screen.ground_y(size.y),
        }
    }

    /// Pull a position back inside the walkable range.
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.min(self.walkable.right).max(self.walkable.left),
            pos.y.min(self.walkable.bottom).max(self.walkable.top),
        )
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.walkable.left && x <= self.walkable.right
    }
}

/// Advance the pet by one tick using the physical rule of `state`.
pub fn advance(pet: &mut Pet, state: &BehaviorState, arena: &Arena, config: &PetConfig) {
    match state {
        BehaviorState::Idle { .. } => bounce(pet, arena),
        BehaviorState::Roam { .. } => {
            walk(pet, config.walk_speed);
            bounce(pet, arena);
        }
        BehaviorState::FollowCursor { target } => {
            walk_towards(pet, *target, config.takeoff_distance, config.walk_speed);
            bounce(pet, arena);
        }
        BehaviorState::WindowRoam { rect, .. } => {
            let target = flush_x(pet, rect);
            let dx = target - pet.pos.x;
            pet.facing = Facing::toward(pet.pos.x, target);
            pet.vel.x = dx.clamp(-config.walk_speed, config.walk_speed);
            bounce(pet, arena);
        }
        BehaviorState::Climb { .. } => climb(pet, config.climb_speed, arena),
        BehaviorState::Jump { .. } | BehaviorState::Falling => {
            airborne_step(pet, config.gravity, arena);
        }
        // Grabbed follows the pointer; Landed stands still.
        BehaviorState::Grabbed { .. } | BehaviorState::Landed { .. } => {}
    }
}

/// Integrate velocity, reflecting off the walkable bounds.
///
/// A component whose tentative coordinate would leave the range is inverted
/// before the move. The result is clamped so the rect never leaves the range.
pub fn bounce(pet: &mut Pet, arena: &Arena) {
    let b = arena.walkable;
    let next = pet.pos + pet.vel;
    if next.x < b.left || next.x > b.right {
        pet.vel.x = -pet.vel.x;
    }
    if next.y < b.top || next.y > b.bottom {
        pet.vel.y = -pet.vel.y;
    }
    pet.pos = arena.clamp(pet.pos + pet.vel);
}

/// Horizontal gait: speed times facing. Facing itself is not integrated.
pub fn walk(pet: &mut Pet, walk_speed: f32) {
    pet.vel.x = walk_speed * pet.facing.sign();
}

/// How far a target is from the pet's center, and whether it is close
/// enough that walking should stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reach {
    pub distance: f32,
    pub close: bool,
}

pub fn reach(pet: &Pet, target: Vec2, takeoff_distance: f32) -> Reach {
    let delta = target - pet.center();
    let distance = delta.length();
    Reach {
        distance,
        close: distance <= takeoff_distance || delta.x.abs() < pet.size.x,
    }
}

/// Walk toward `target`, stopping once it is within reach. Returns the
/// Euclidean distance from the pet's center.
pub fn walk_towards(pet: &mut Pet, target: Vec2, takeoff_distance: f32, walk_speed: f32) -> f32 {
    let r = reach(pet, target, takeoff_distance);
    if r.close {
        pet.facing = Facing::Neutral;
        pet.vel.x = 0.0;
        return r.distance;
    }
    pet.facing = Facing::toward(pet.center().x, target.x);
    walk(pet, walk_speed);
    r.distance
}

/// Start a jump toward `target`. Horizontal reach is capped at
/// `takeoff_distance` and spread over `jump_divisor` ticks.
pub fn launch(pet: &mut Pet, target: Vec2, config: &PetConfig) {
    pet.launch_vx = pet.vel.x;
    let dx = (target.x - pet.pos.x).clamp(-config.takeoff_distance, config.takeoff_distance);
    pet.vel.x = dx / config.jump_divisor;
    pet.vel.y = config.launch_impulse;
    pet.facing = Facing::toward(pet.pos.x, target.x);
    pet.on_ground = false;
}

/// One tick of ballistic flight. Returns whether the pet is still airborne.
///
/// On touching the ground line the pet snaps to it, vertical velocity is
/// zeroed and the pre-launch horizontal velocity is restored.
pub fn airborne_step(pet: &mut Pet, gravity: f32, arena: &Arena) -> bool {
    if pet.on_ground {
        return false;
    }
    pet.vel.y += gravity;
    pet.pos += pet.vel;

    let b = arena.walkable;
    if pet.pos.x < b.left || pet.pos.x > b.right {
        pet.pos.x = pet.pos.x.min(b.right).max(b.left);
        pet.vel.x = 0.0;
    }

    if pet.pos.y >= arena.ground_y {
        pet.pos.y = arena.ground_y;
        pet.vel.y = 0.0;
        pet.vel.x = pet.launch_vx;
        pet.on_ground = true;
        return false;
    }
    true
}

/// Move straight up a window side, never above the available area.
pub fn climb(pet: &mut Pet, climb_speed: f32, arena: &Arena) {
    pet.on_ground = false;
    pet.vel = Vec2::new(0.0, -climb_speed);
    pet.pos.y = (pet.pos.y + pet.vel.y).max(arena.walkable.top);
}

/// X the pet must reach to stand flush against the nearer side of `window`.
pub fn flush_x(pet: &Pet, window: &Rect) -> f32 {
    if pet.center().x < window.center().x {
        window.left - pet.size.x
    } else {
        window.right
    }
}

/// True once the buffer is full and every consecutive Manhattan gap
/// exceeds `threshold`.
pub fn is_shaken(history: &PositionHistory, threshold: f32) -> bool {
    if !history.is_full() {
        return false;
    }
    let samples: Vec<Vec2> = history.iter().collect();
    samples.windows(2).all(|pair| {
        let d = pair[1] - pair[0];
        d.x.abs() + d.y.abs() > threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        let screen = ScreenGeometry::new(
            Rect::new(0.0, 0.0, 1000.0, 800.0),
            Rect::new(0.0, 0.0, 1000.0, 760.0),
        );
        Arena::new(&screen, Vec2::splat(100.0))
    }

    fn pet_at(x: f32, y: f32) -> Pet {
        Pet::new(Vec2::new(x, y), Vec2::splat(100.0))
    }

    #[test]
    fn bounce_reflects_at_right_edge() {
        let a = arena();
        let mut pet = pet_at(895.0, 300.0);
        pet.vel = Vec2::new(10.0, 0.0);
        bounce(&mut pet, &a);
        assert_eq!(pet.vel.x, -10.0);
        assert_eq!(pet.pos.x, 885.0);
    }

    #[test]
    fn bounce_keeps_rect_inside_and_flips_once_per_crossing() {
        let a = arena();
        let mut pet = pet_at(450.0, 300.0);
        pet.vel = Vec2::new(37.0, -23.0);
        let mut flips_x = 0;
        let mut flips_y = 0;
        for _ in 0..500 {
            let before = pet.vel;
            let next = pet.pos + pet.vel;
            let crosses_x = next.x < 0.0 || next.x > 900.0;
            let crosses_y = next.y < 0.0 || next.y > 660.0;
            bounce(&mut pet, &a);
            assert!(pet.pos.x >= 0.0 && pet.pos.x <= 900.0);
            assert!(pet.pos.y >= 0.0 && pet.pos.y <= 660.0);
            let flipped_x = before.x.signum() != pet.vel.x.signum();
            let flipped_y = before.y.signum() != pet.vel.y.signum();
            assert_eq!(flipped_x, crosses_x);
            assert_eq!(flipped_y, crosses_y);
            flips_x += flipped_x as u32;
            flips_y += flipped_y as u32;
        }
        assert!(flips_x > 0 && flips_y > 0);
    }

    #[test]
    fn walk_uses_facing_as_gait() {
        let mut pet = pet_at(0.0, 0.0);
        pet.facing = Facing::Left;
        walk(&mut pet, 5.0);
        assert_eq!(pet.vel.x, -5.0);
        pet.facing = Facing::Neutral;
        walk(&mut pet, 5.0);
        assert_eq!(pet.vel.x, 0.0);
    }

    #[test]
    fn walk_towards_far_target() {
        let mut pet = pet_at(100.0, 660.0);
        let d = walk_towards(&mut pet, Vec2::new(800.0, 710.0), 300.0, 5.0);
        assert!((d - 650.0).abs() < 1e-3);
        assert_eq!(pet.facing, Facing::Right);
        assert_eq!(pet.vel.x, 5.0);
    }

    #[test]
    fn walk_towards_stops_within_takeoff_or_under_target() {
        let mut pet = pet_at(100.0, 660.0);
        pet.vel.x = 5.0;
        walk_towards(&mut pet, Vec2::new(350.0, 710.0), 300.0, 5.0);
        assert_eq!(pet.facing, Facing::Neutral);
        assert_eq!(pet.vel.x, 0.0);

        // Far away vertically but horizontally within one body width.
        let mut pet = pet_at(100.0, 660.0);
        walk_towards(&mut pet, Vec2::new(200.0, -400.0), 300.0, 5.0);
        assert_eq!(pet.facing, Facing::Neutral);

        // Target to the left is approached, not ignored.
        let mut pet = pet_at(800.0, 660.0);
        walk_towards(&mut pet, Vec2::new(50.0, 710.0), 300.0, 5.0);
        assert_eq!(pet.facing, Facing::Left);
    }

    #[test]
    fn jump_arc_lands_and_restores_velocity() {
        let a = arena();
        let config = PetConfig::default();
        let mut pet = pet_at(300.0, a.ground_y);
        pet.vel.x = 5.0;
        launch(&mut pet, Vec2::new(340.0, 0.0), &config);
        assert_eq!(pet.vel.x, 2.0);
        assert_eq!(pet.vel.y, -20.0);
        assert!(!pet.on_ground);

        let mut ticks = 0;
        while airborne_step(&mut pet, config.gravity, &a) {
            ticks += 1;
            assert!(pet.pos.y < a.ground_y);
            assert!(ticks < 1000);
        }
        ticks += 1;
        let closed_form = (2.0 * -config.launch_impulse / config.gravity).ceil() as i32;
        assert!((ticks - closed_form).abs() <= 1, "landed after {ticks} ticks");
        assert_eq!(pet.pos.y, a.ground_y);
        assert_eq!(pet.vel.y, 0.0);
        assert_eq!(pet.vel.x, 5.0);
        assert!(pet.on_ground);
    }

    #[test]
    fn launch_caps_horizontal_reach() {
        let config = PetConfig::default();
        let mut pet = pet_at(0.0, 660.0);
        launch(&mut pet, Vec2::new(5000.0, 0.0), &config);
        assert_eq!(pet.vel.x, 300.0 / 20.0);
        let mut pet = pet_at(900.0, 660.0);
        launch(&mut pet, Vec2::new(-5000.0, 0.0), &config);
        assert_eq!(pet.vel.x, -300.0 / 20.0);
        assert_eq!(pet.facing, Facing::Left);
    }

    #[test]
    fn grounded_pet_is_not_airborne() {
        let a = arena();
        let mut pet = pet_at(10.0, a.ground_y);
        assert!(!airborne_step(&mut pet, 0.5, &a));
        assert_eq!(pet.pos.y, a.ground_y);
    }

    fn history_of(points: &[(f32, f32)]) -> PositionHistory {
        let mut h = PositionHistory::new();
        for &(x, y) in points {
            h.push(Vec2::new(x, y));
        }
        h
    }

    #[test]
    fn violent_motion_is_shaken() {
        let h = history_of(&[(0.0, 0.0), (21.0, 0.0), (0.0, 0.0), (10.0, 11.0), (31.0, 11.0)]);
        assert!(is_shaken(&h, 20.0));
    }

    #[test]
    fn one_small_gap_is_not_shaken() {
        let h = history_of(&[(0.0, 0.0), (30.0, 0.0), (50.0, 0.0), (80.0, 0.0), (120.0, 0.0)]);
        assert!(!is_shaken(&h, 20.0));
    }

    #[test]
    fn too_few_samples_is_not_shaken() {
        let h = history_of(&[(0.0, 0.0), (100.0, 0.0), (0.0, 0.0), (100.0, 0.0)]);
        assert!(!is_shaken(&h, 20.0));
    }

    #[test]
    fn flush_picks_nearer_side() {
        let window = Rect::new(400.0, 200.0, 700.0, 500.0);
        assert_eq!(flush_x(&pet_at(100.0, 660.0), &window), 300.0);
        assert_eq!(flush_x(&pet_at(800.0, 660.0), &window), 700.0);
    }

    #[test]
    fn climb_stops_at_top() {
        let a = arena();
        let mut pet = pet_at(300.0, 2.0);
        climb(&mut pet, 3.0, &a);
        assert_eq!(pet.pos.y, 0.0);
        assert!(!pet.on_ground);
    }
}
