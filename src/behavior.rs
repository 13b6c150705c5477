use glam::Vec2;

use crate::config::PetConfig;
use crate::geometry::Rect;
use crate::pet::{Facing, Pet};
use crate::physics::{self, Arena};
use crate::sensor::{Perception, WindowId};

/// What the pet is doing. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorState {
    /// Standing still; counts down to a roam.
    Idle { remaining: u32 },
    /// Walking in one direction for a while.
    Roam { remaining: u32, direction: Facing },
    /// Held by the pointer. Only pointer input leaves this state.
    Grabbed { shaken: bool },
    Falling,
    /// Crouched after touching the ground.
    Landed { remaining: u32 },
    /// Going up the side of a window.
    Climb { window: WindowId, rect: Rect },
    /// Heading for the side of a window it noticed.
    WindowRoam { window: WindowId, rect: Rect },
    /// Walking after the cursor's last seen position.
    FollowCursor { target: Vec2 },
    /// Ballistic leap toward `target`; launched on entry.
    Jump { target: Vec2, elapsed: u32 },
}

/// Discriminant of [`BehaviorState`], used for logging and the transition
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Idle,
    Roam,
    Grabbed,
    Falling,
    Landed,
    Climb,
    WindowRoam,
    FollowCursor,
    Jump,
}

impl StateKind {
    pub fn label(self) -> &'static str {
        match self {
            StateKind::Idle => "Idle",
            StateKind::Roam => "Roam",
            StateKind::Grabbed => "Grabbed",
            StateKind::Falling => "Falling",
            StateKind::Landed => "Landed",
            StateKind::Climb => "Climb",
            StateKind::WindowRoam => "WindowRoam",
            StateKind::FollowCursor => "FollowCursor",
            StateKind::Jump => "Jump",
        }
    }

    /// Kinds a state of this kind may hand over to from its own `step`.
    /// Pointer input bypasses this table.
    pub fn successors(self) -> &'static [StateKind] {
        use StateKind::*;
        match self {
            Idle => &[Idle, Roam],
            Roam => &[Roam, Idle, FollowCursor, WindowRoam],
            Grabbed => &[Grabbed],
            Falling => &[Falling, Landed],
            Landed => &[Landed, Roam],
            Climb => &[Climb, Falling],
            WindowRoam => &[WindowRoam, Roam, Climb],
            FollowCursor => &[FollowCursor, Roam, Jump],
            Jump => &[Jump, Landed],
        }
    }

    pub fn can_become(self, next: StateKind) -> bool {
        self.successors().contains(&next)
    }
}

/// Read-only inputs to a decision step.
pub struct StepContext<'a> {
    pub pet: &'a Pet,
    pub perception: &'a Perception,
    pub arena: &'a Arena,
    pub config: &'a PetConfig,
}

impl BehaviorState {
    pub fn initial(config: &PetConfig) -> Self {
        Self::idle(config)
    }

    pub fn idle(config: &PetConfig) -> Self {
        BehaviorState::Idle {
            remaining: config.idle_ticks.max(1),
        }
    }

    /// Fresh roam leg with a random length and direction.
    pub fn roam(config: &PetConfig, rng: &mut fastrand::Rng) -> Self {
        BehaviorState::Roam {
            remaining: rng.u32(config.roam_ticks.clone()),
            direction: Facing::random(rng),
        }
    }

    pub fn landed(config: &PetConfig) -> Self {
        BehaviorState::Landed {
            remaining: config.landed_ticks(),
        }
    }

    pub fn kind(&self) -> StateKind {
        match self {
            BehaviorState::Idle { .. } => StateKind::Idle,
            BehaviorState::Roam { .. } => StateKind::Roam,
            BehaviorState::Grabbed { .. } => StateKind::Grabbed,
            BehaviorState::Falling => StateKind::Falling,
            BehaviorState::Landed { .. } => StateKind::Landed,
            BehaviorState::Climb { .. } => StateKind::Climb,
            BehaviorState::WindowRoam { .. } => StateKind::WindowRoam,
            BehaviorState::FollowCursor { .. } => StateKind::FollowCursor,
            BehaviorState::Jump { .. } => StateKind::Jump,
        }
    }

    /// True when `self`, a state of the same kind as `prev`, begins a new
    /// run rather than continuing `prev`. Only a roam leg can start over:
    /// a continuation always counts down, a fresh leg never does.
    pub fn restarts(&self, prev: &BehaviorState) -> bool {
        match (self, prev) {
            (
                BehaviorState::Roam { remaining, .. },
                BehaviorState::Roam {
                    remaining: before, ..
                },
            ) => remaining >= before,
            _ => false,
        }
    }

    /// Whether `step` reads the environment scan.
    pub fn needs_perception(&self) -> bool {
        matches!(
            self,
            BehaviorState::Roam { .. }
                | BehaviorState::FollowCursor { .. }
                | BehaviorState::WindowRoam { .. }
                | BehaviorState::Climb { .. }
        )
    }

    /// One decision. Returns the same state (possibly with updated
    /// counters) or the state to switch to. Never mutates the pet.
    pub fn step(&self, ctx: &StepContext, rng: &mut fastrand::Rng) -> BehaviorState {
        let StepContext {
            pet,
            perception,
            arena,
            config,
        } = *ctx;

        match *self {
            BehaviorState::Idle { remaining } => {
                if remaining <= 1 {
                    Self::roam(config, rng)
                } else {
                    BehaviorState::Idle {
                        remaining: remaining - 1,
                    }
                }
            }

            BehaviorState::Roam {
                remaining,
                direction,
            } => match *perception {
                Perception::SeesCursor(at) => BehaviorState::FollowCursor { target: at },
                Perception::SeesWindow { id, rect } => BehaviorState::WindowRoam { window: id, rect },
                Perception::None => {
                    let next_x = pet.pos.x + config.walk_speed * direction.sign();
                    if !arena.contains_x(next_x) {
                        return Self::idle(config);
                    }
                    let remaining = remaining.saturating_sub(1);
                    if remaining > 0 {
                        BehaviorState::Roam {
                            remaining,
                            direction,
                        }
                    } else if rng.f32() < config.idle_chance {
                        Self::idle(config)
                    } else {
                        Self::roam(config, rng)
                    }
                }
            },

            BehaviorState::Grabbed { .. } => BehaviorState::Grabbed {
                shaken: physics::is_shaken(&pet.history, config.shake_threshold),
            },

            BehaviorState::Falling => {
                if pet.on_ground {
                    Self::landed(config)
                } else {
                    BehaviorState::Falling
                }
            }

            BehaviorState::Landed { remaining } => {
                if remaining <= 1 {
                    Self::roam(config, rng)
                } else {
                    BehaviorState::Landed {
                        remaining: remaining - 1,
                    }
                }
            }

            BehaviorState::FollowCursor { .. } => match *perception {
                Perception::SeesCursor(at) => {
                    let reach = physics::reach(pet, at, config.takeoff_distance);
                    if reach.close && pet.on_ground && at.y < pet.pos.y {
                        BehaviorState::Jump {
                            target: at,
                            elapsed: 0,
                        }
                    } else {
                        BehaviorState::FollowCursor { target: at }
                    }
                }
                _ => Self::roam(config, rng),
            },

            BehaviorState::Jump { target, elapsed } => {
                if pet.on_ground {
                    Self::landed(config)
                } else {
                    BehaviorState::Jump {
                        target,
                        elapsed: elapsed.saturating_add(1),
                    }
                }
            }

            BehaviorState::WindowRoam { window, .. } => match *perception {
                Perception::SeesWindow { id, rect } if id == window => {
                    let flush = physics::flush_x(pet, &rect);
                    if !arena.contains_x(flush) {
                        Self::roam(config, rng)
                    } else if (pet.pos.x - flush).abs() <= 0.5 {
                        BehaviorState::Climb { window, rect }
                    } else {
                        BehaviorState::WindowRoam { window, rect }
                    }
                }
                _ => Self::roam(config, rng),
            },

            BehaviorState::Climb { window, .. } => match *perception {
                Perception::SeesWindow { id, rect } if id == window => {
                    let cleared = pet.rect().bottom <= rect.top;
                    let at_top = pet.pos.y <= arena.walkable.top;
                    if cleared || at_top {
                        BehaviorState::Falling
                    } else {
                        BehaviorState::Climb { window, rect }
                    }
                }
                _ => BehaviorState::Falling,
            },
        }
    }
}
