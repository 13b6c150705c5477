use glam::{IVec2, Vec2};

use crate::behavior::{BehaviorState, StepContext};
use crate::config::PetConfig;
use crate::geometry::ScreenGeometry;
use crate::pet::{Facing, Pet};
use crate::physics::{self, Arena};
use crate::sensor::{Environment, Perception, Sensor, WindowId};
use crate::sprite::{render_key, SpriteKey};

/// What the window shell should show after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Top-left of the pet window in screen pixels.
    pub position: IVec2,
    pub sprite: SpriteKey,
}

/// Owns the pet and its behavior. Driven by the update timer, the draw
/// timer and pointer events, all on the event-loop thread.
pub struct PetController {
    pet: Pet,
    state: BehaviorState,
    sensor: Sensor,
    arena: Arena,
    config: PetConfig,
    rng: fastrand::Rng,
    /// Pointer offset inside the pet window at press time.
    grab_offset: Option<Vec2>,
}

impl PetController {
    pub fn new(config: PetConfig, screen: ScreenGeometry) -> Self {
        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let size = Vec2::splat(config.size);
        let pet = Pet::spawn(&screen, size, &mut rng);
        let sensor = Sensor::new(
            config.sight_distance,
            screen.available.bottom,
            config.ignored_titles.clone(),
        );
        log::info!(
            "Pet spawned at ({:.0}, {:.0}), ground line {:.0}",
            pet.pos.x,
            pet.pos.y,
            screen.ground_y(size.y)
        );
        Self {
            pet,
            state: BehaviorState::initial(&config),
            sensor,
            arena: Arena::new(&screen, size),
            config,
            rng,
            grab_offset: None,
        }
    }

    /// Exclude the pet's own window from perception.
    pub fn set_own_window(&mut self, id: WindowId) {
        self.sensor.own_window = Some(id);
    }

    pub fn pet(&self) -> &Pet {
        &self.pet
    }

    /// One update tick: physics, perception, decision.
    pub fn update(&mut self, env: &dyn Environment) {
        physics::advance(&mut self.pet, &self.state, &self.arena, &self.config);

        if matches!(self.state, BehaviorState::Grabbed { .. }) {
            self.pet.history.push(self.pet.pos);
        }

        let perception = if self.state.needs_perception() {
            self.sensor.scan(env, &self.pet.rect())
        } else {
            Perception::None
        };

        let ctx = StepContext {
            pet: &self.pet,
            perception: &perception,
            arena: &self.arena,
            config: &self.config,
        };
        let next = self.state.step(&ctx, &mut self.rng);
        self.apply(next);
    }

    /// Projection for the draw timer. Safe to call any number of times
    /// between updates.
    pub fn draw(&self) -> Frame {
        Frame {
            position: self.pet.pos.round().as_ivec2(),
            sprite: render_key(&self.state, self.pet.facing, self.config.takeoff_frames),
        }
    }

    /// Left button pressed on the pet at `offset` inside its window.
    pub fn press(&mut self, offset: Vec2) {
        self.grab_offset = Some(offset);
        self.force(BehaviorState::Grabbed { shaken: false });
    }

    /// Pointer moved to `pointer` (screen coordinates).
    pub fn drag(&mut self, pointer: Vec2) {
        if let (BehaviorState::Grabbed { .. }, Some(offset)) = (self.state, self.grab_offset) {
            self.pet.pos = pointer - offset;
        }
    }

    pub fn release(&mut self) {
        self.grab_offset = None;
        if matches!(self.state, BehaviorState::Grabbed { .. }) {
            self.force(BehaviorState::Falling);
        }
    }

    pub fn is_grabbed(&self) -> bool {
        matches!(self.state, BehaviorState::Grabbed { .. })
    }

    /// Accept a state produced by `step`, provided the current state is
    /// allowed to hand over to it. A fresh state of the same kind is
    /// installed like any other so its entry effects run.
    fn apply(&mut self, next: BehaviorState) {
        let from = self.state.kind();
        let to = next.kind();
        if from == to && !next.restarts(&self.state) {
            self.state = next;
            return;
        }
        if !from.can_become(to) {
            log::warn!(
                "Rejected transition {} -> {}; keeping {}",
                from.label(),
                to.label(),
                from.label()
            );
            return;
        }
        self.install(next);
    }

    /// Pointer-driven transition; bypasses the transition table.
    fn force(&mut self, next: BehaviorState) {
        self.install(next);
    }

    fn install(&mut self, next: BehaviorState) {
        log::info!("{} -> {}", self.state.kind().label(), next.kind().label());
        self.enter(&next);
        self.state = next;
    }

    /// Entry effects on the pet's body.
    fn enter(&mut self, next: &BehaviorState) {
        let pet = &mut self.pet;
        match *next {
            BehaviorState::Idle { .. } => {
                pet.halt();
                pet.facing = Facing::Neutral;
            }
            BehaviorState::Roam { direction, .. } => pet.facing = direction,
            BehaviorState::Grabbed { .. } => {
                pet.halt();
                pet.on_ground = false;
                pet.history.clear();
            }
            BehaviorState::Falling => {
                pet.halt();
                pet.launch_vx = 0.0;
                pet.on_ground = false;
                pet.pos.x = pet.pos.x.min(self.arena.walkable.right).max(self.arena.walkable.left);
                pet.pos.y = pet.pos.y.max(self.arena.walkable.top);
            }
            BehaviorState::Landed { .. } => pet.vel.y = 0.0,
            BehaviorState::Climb { .. } => {
                pet.halt();
                pet.on_ground = false;
            }
            BehaviorState::Jump { target, .. } => physics::launch(pet, target, &self.config),
            BehaviorState::WindowRoam { .. } | BehaviorState::FollowCursor { .. } => {}
        }
    }

    #[cfg(test)]
    fn set_state_for_test(&mut self, state: BehaviorState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::StateKind;
    use crate::geometry::Rect;
    use crate::sensor::DesktopWindow;
    use crate::sprite::SpriteId;
    use crate::testing::FakeEnvironment;

    fn screen() -> ScreenGeometry {
        ScreenGeometry::new(
            Rect::new(0.0, 0.0, 1920.0, 1080.0),
            Rect::new(0.0, 0.0, 1920.0, 1040.0),
        )
    }

    fn controller() -> PetController {
        let config = PetConfig {
            seed: Some(99),
            ..PetConfig::default()
        };
        PetController::new(config, screen())
    }

    fn all_states() -> Vec<BehaviorState> {
        let rect = Rect::new(500.0, 500.0, 900.0, 900.0);
        vec![
            BehaviorState::Idle { remaining: 10 },
            BehaviorState::Roam {
                remaining: 10,
                direction: Facing::Left,
            },
            BehaviorState::Grabbed { shaken: false },
            BehaviorState::Falling,
            BehaviorState::Landed { remaining: 10 },
            BehaviorState::Climb {
                window: WindowId(1),
                rect,
            },
            BehaviorState::WindowRoam {
                window: WindowId(1),
                rect,
            },
            BehaviorState::FollowCursor { target: Vec2::ZERO },
            BehaviorState::Jump {
                target: Vec2::ZERO,
                elapsed: 0,
            },
        ]
    }

    #[test]
    fn starts_idle_on_the_ground() {
        let c = controller();
        assert_eq!(c.state, BehaviorState::Idle { remaining: 100 });
        assert_eq!(c.pet().pos.y, 940.0);
        assert_eq!(c.draw().sprite.sprite, SpriteId::Idle);
    }

    #[test]
    fn idle_roams_after_configured_ticks() {
        let mut c = controller();
        let env = FakeEnvironment::far_cursor();
        for _ in 0..99 {
            c.update(&env);
            assert_eq!(c.state.kind(), StateKind::Idle);
        }
        c.update(&env);
        assert_eq!(c.state.kind(), StateKind::Roam);
        assert_ne!(c.pet().facing, Facing::Neutral);
    }

    #[test]
    fn press_grabs_from_any_state() {
        for state in all_states() {
            let mut c = controller();
            c.set_state_for_test(state);
            c.press(Vec2::new(30.0, 40.0));
            assert_eq!(c.state.kind(), StateKind::Grabbed, "from {state:?}");
        }
    }

    #[test]
    fn release_drops_only_when_grabbed() {
        for state in all_states() {
            let mut c = controller();
            c.set_state_for_test(state);
            c.release();
            if state.kind() == StateKind::Grabbed {
                assert_eq!(c.state, BehaviorState::Falling);
            } else {
                assert_eq!(c.state, state);
            }
        }
    }

    #[test]
    fn grabbed_ignores_its_own_update() {
        let mut c = controller();
        let env = FakeEnvironment::with_cursor(Vec2::new(0.0, 0.0));
        c.press(Vec2::new(50.0, 50.0));
        for _ in 0..50 {
            c.update(&env);
            assert_eq!(c.state.kind(), StateKind::Grabbed);
        }
        c.release();
        assert_eq!(c.state, BehaviorState::Falling);
    }

    #[test]
    fn drag_moves_by_offset_and_drop_lands() {
        let mut c = controller();
        let env = FakeEnvironment::far_cursor();
        c.press(Vec2::new(20.0, 10.0));
        c.drag(Vec2::new(720.0, 310.0));
        assert_eq!(c.pet().pos, Vec2::new(700.0, 300.0));
        assert_eq!(c.draw().position, IVec2::new(700, 300));

        c.release();
        let mut ticks = 0;
        while c.state.kind() == StateKind::Falling {
            c.update(&env);
            ticks += 1;
            assert!(ticks < 500, "never landed");
        }
        assert_eq!(c.state.kind(), StateKind::Landed);
        assert_eq!(c.pet().pos, Vec2::new(700.0, 940.0));
        assert!(c.pet().on_ground);
        assert_eq!(c.draw().sprite.sprite, SpriteId::Landed);
    }

    #[test]
    fn drag_ignored_when_not_grabbed() {
        let mut c = controller();
        let before = c.pet().pos;
        c.drag(Vec2::new(5.0, 5.0));
        assert_eq!(c.pet().pos, before);
    }

    #[test]
    fn shaking_while_grabbed_is_detected() {
        let mut c = controller();
        let env = FakeEnvironment::far_cursor();
        c.press(Vec2::ZERO);
        for i in 0..6 {
            let x = if i % 2 == 0 { 300.0 } else { 400.0 };
            c.drag(Vec2::new(x, 300.0));
            c.update(&env);
        }
        assert_eq!(c.state, BehaviorState::Grabbed { shaken: true });
        assert_eq!(c.draw().sprite.sprite, SpriteId::Falling);

        // Holding still calms it down once the buffer refills.
        for _ in 0..5 {
            c.update(&env);
        }
        assert_eq!(c.state, BehaviorState::Grabbed { shaken: false });
    }

    #[test]
    fn dropped_off_screen_is_pulled_back() {
        let mut c = controller();
        c.press(Vec2::ZERO);
        c.drag(Vec2::new(5000.0, -300.0));
        c.release();
        assert_eq!(c.pet().pos, Vec2::new(1820.0, 0.0));
    }

    #[test]
    fn roaming_pet_notices_cursor_and_follows() {
        let mut c = controller();
        c.set_state_for_test(BehaviorState::Roam {
            remaining: 50,
            direction: Facing::Right,
        });
        c.pet.pos = Vec2::new(500.0, 940.0);
        let cursor = Vec2::new(900.0, 1000.0);
        let env = FakeEnvironment::with_cursor(cursor);
        c.update(&env);
        assert_eq!(c.state, BehaviorState::FollowCursor { target: cursor });

        c.update(&env);
        assert_eq!(c.pet().facing, Facing::Right);
        assert!(c.pet().pos.x > 505.0);
    }

    #[test]
    fn follow_jump_land_cycle() {
        let mut c = controller();
        c.set_state_for_test(BehaviorState::FollowCursor {
            target: Vec2::ZERO,
        });
        c.pet.pos = Vec2::new(800.0, 940.0);
        c.pet.vel.x = 0.0;
        let env = FakeEnvironment::with_cursor(Vec2::new(900.0, 800.0));
        c.update(&env);
        assert_eq!(c.state.kind(), StateKind::Jump);
        assert!(!c.pet().on_ground);
        assert_eq!(c.pet().vel.y, -20.0);
        assert_eq!(c.draw().sprite.sprite, SpriteId::Takeoff);

        let mut ticks = 0;
        while c.state.kind() == StateKind::Jump {
            c.update(&env);
            ticks += 1;
            assert!(ticks < 500, "never landed");
        }
        assert_eq!(c.state.kind(), StateKind::Landed);
        assert_eq!(c.pet().pos.y, 940.0);
        assert_eq!(c.pet().vel.x, 0.0);
    }

    #[test]
    fn window_roam_walks_to_side_and_climbs() {
        let mut c = controller();
        let rect = Rect::new(1000.0, 600.0, 1400.0, 1000.0);
        let env = FakeEnvironment::far_cursor().window(DesktopWindow {
            id: WindowId(5),
            title: "Editor".into(),
            rect,
            visible: true,
        });
        c.set_state_for_test(BehaviorState::Roam {
            remaining: 50,
            direction: Facing::Right,
        });
        c.pet.pos = Vec2::new(800.0, 940.0);
        c.update(&env);
        assert_eq!(c.state.kind(), StateKind::WindowRoam);

        let mut ticks = 0;
        while c.state.kind() == StateKind::WindowRoam {
            c.update(&env);
            ticks += 1;
            assert!(ticks < 200, "never reached the window");
        }
        assert_eq!(c.state.kind(), StateKind::Climb);
        assert_eq!(c.pet().pos.x, 900.0);

        while c.state.kind() == StateKind::Climb {
            c.update(&env);
            ticks += 1;
            assert!(ticks < 1000, "never finished climbing");
        }
        assert_eq!(c.state.kind(), StateKind::Falling);
        assert!(c.pet().rect().bottom <= rect.top + 3.0);
    }

    #[test]
    fn window_enumeration_failure_keeps_ticking() {
        let mut c = controller();
        c.set_state_for_test(BehaviorState::Roam {
            remaining: 50,
            direction: Facing::Right,
        });
        c.pet.pos = Vec2::new(500.0, 940.0);
        let env = FakeEnvironment::far_cursor().failing();
        for _ in 0..10 {
            c.update(&env);
        }
        assert_eq!(c.state.kind(), StateKind::Roam);
    }

    #[test]
    fn illegal_step_result_keeps_previous_state() {
        let mut c = controller();
        let idle = BehaviorState::Idle { remaining: 10 };
        c.set_state_for_test(idle);
        c.apply(BehaviorState::Grabbed { shaken: false });
        assert_eq!(c.state, idle);
        c.apply(BehaviorState::Falling);
        assert_eq!(c.state, idle);
    }

    fn seeded(seed: u64) -> PetController {
        let config = PetConfig {
            seed: Some(seed),
            ..PetConfig::default()
        };
        PetController::new(config, screen())
    }

    #[test]
    fn fresh_roam_leg_turns_the_pet() {
        let env = FakeEnvironment::far_cursor();
        let mut turned = 0;
        for seed in 0..40 {
            let mut c = seeded(seed);
            c.set_state_for_test(BehaviorState::Roam {
                remaining: 1,
                direction: Facing::Right,
            });
            c.pet.pos = Vec2::new(900.0, 940.0);
            c.pet.facing = Facing::Right;
            c.update(&env);

            let BehaviorState::Roam { direction, .. } = c.state else {
                continue;
            };
            assert_eq!(c.pet().facing, direction, "seed {seed}");
            assert_eq!(c.draw().sprite.flip_x, direction == Facing::Left);

            let x = c.pet().pos.x;
            c.update(&env);
            assert_eq!(c.pet().pos.x - x, 5.0 * direction.sign(), "seed {seed}");
            if direction == Facing::Left {
                turned += 1;
            }
        }
        assert!(turned > 0, "no seed picked a leftward leg");
    }

    #[test]
    fn entered_state_drives_body_every_tick() {
        let mut c = controller();
        let env = FakeEnvironment::far_cursor();
        let walk = c.config.walk_speed;
        let mut restarts = 0;
        for _ in 0..3000 {
            let prev = c.state;
            let x = c.pet().pos.x;
            c.update(&env);
            let dx = c.pet().pos.x - x;

            match prev {
                BehaviorState::Roam { direction, .. } => {
                    // A fresh leg may point into a wall it is already
                    // touching; then the bounce sends it back.
                    let ahead = x + walk * direction.sign();
                    if c.arena.contains_x(ahead) {
                        assert!((dx - walk * direction.sign()).abs() < 1e-3, "dx {dx}");
                    } else {
                        assert!((dx.abs() - walk).abs() < 1e-3, "dx {dx}");
                    }
                }
                BehaviorState::Idle { .. } => assert_eq!(dx, 0.0),
                _ => {}
            }

            match c.state {
                BehaviorState::Roam { direction, .. } => {
                    assert_eq!(c.pet().facing, direction);
                    if c.state.restarts(&prev) {
                        restarts += 1;
                    }
                }
                BehaviorState::Idle { .. } => {
                    assert_eq!(c.pet().facing, Facing::Neutral);
                    assert_eq!(c.pet().vel, Vec2::ZERO);
                }
                other => panic!("far cursor and no windows, got {other:?}"),
            }
            assert!(c.arena.walkable.contains_point(c.pet().pos));
        }
        assert!(restarts > 0, "no roam leg was reselected");
    }
}
