use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::{PetError, Result};

/// Default update/draw period in milliseconds (20 Hz).
const DEFAULT_TICK_MS: u64 = 50;
/// Pet window is square, this many pixels per side.
const DEFAULT_SIZE: f32 = 100.0;
/// Horizontal pixels per tick while walking.
const DEFAULT_WALK_SPEED: f32 = 5.0;
/// Added to vertical velocity every airborne tick.
const DEFAULT_GRAVITY: f32 = 0.5;
/// Vertical velocity at jump launch (negative = up).
const DEFAULT_LAUNCH_IMPULSE: f32 = -20.0;
/// Horizontal jump distance is spread over this many ticks.
const DEFAULT_JUMP_DIVISOR: f32 = 20.0;
/// How far the pet can perceive the cursor or a window.
const DEFAULT_SIGHT_DISTANCE: f32 = 500.0;
/// Max horizontal reach of a single jump.
const DEFAULT_TAKEOFF_DISTANCE: f32 = 300.0;
/// Per-sample movement (Manhattan) above which a drag counts as shaking.
const DEFAULT_SHAKE_THRESHOLD: f32 = 20.0;
/// Ticks spent idling before roaming.
const DEFAULT_IDLE_TICKS: u32 = 100;
/// Ticks a roam leg lasts, picked uniformly.
const DEFAULT_ROAM_TICKS: RangeInclusive<u32> = 50..=100;
/// Chance a finished roam leg settles into Idle instead of a new leg.
const DEFAULT_IDLE_CHANCE: f32 = 0.3;
/// How long the pet stays crouched after landing.
const DEFAULT_LANDED_DWELL: Duration = Duration::from_secs(1);
/// Vertical pixels per tick while climbing a window side.
const DEFAULT_CLIMB_SPEED: f32 = 3.0;
/// Ticks the takeoff sprite is shown at the start of a jump.
const DEFAULT_TAKEOFF_FRAMES: u32 = 3;
/// Title given to the pet's own window.
pub const WINDOW_TITLE: &str = "DeskPet";

/// Command line interface.
#[derive(Debug, Parser)]
#[command(name = "deskpet", about = "A small animated pet that roams your desktop")]
pub struct Args {
    /// Update/draw period in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,

    /// Pet window size in pixels
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    pub size: f32,

    /// Radius in pixels within which the pet notices the cursor or windows
    #[arg(long, default_value_t = DEFAULT_SIGHT_DISTANCE)]
    pub sight_distance: f32,

    /// Seed for the behavior RNG (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory holding the sprite PNGs
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Window titles the pet never reacts to (repeatable)
    #[arg(long = "ignore-window")]
    pub ignored_titles: Vec<String>,
}

/// Tunables for the simulation and the shell around it.
#[derive(Debug, Clone)]
pub struct PetConfig {
    pub tick: Duration,
    pub size: f32,
    pub walk_speed: f32,
    pub gravity: f32,
    pub launch_impulse: f32,
    pub jump_divisor: f32,
    pub sight_distance: f32,
    pub takeoff_distance: f32,
    pub shake_threshold: f32,
    pub idle_ticks: u32,
    pub roam_ticks: RangeInclusive<u32>,
    pub idle_chance: f32,
    pub landed_dwell: Duration,
    pub climb_speed: f32,
    pub takeoff_frames: u32,
    pub ignored_titles: Vec<String>,
    pub seed: Option<u64>,
    pub assets_dir: Option<PathBuf>,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            size: DEFAULT_SIZE,
            walk_speed: DEFAULT_WALK_SPEED,
            gravity: DEFAULT_GRAVITY,
            launch_impulse: DEFAULT_LAUNCH_IMPULSE,
            jump_divisor: DEFAULT_JUMP_DIVISOR,
            sight_distance: DEFAULT_SIGHT_DISTANCE,
            takeoff_distance: DEFAULT_TAKEOFF_DISTANCE,
            shake_threshold: DEFAULT_SHAKE_THRESHOLD,
            idle_ticks: DEFAULT_IDLE_TICKS,
            roam_ticks: DEFAULT_ROAM_TICKS,
            idle_chance: DEFAULT_IDLE_CHANCE,
            landed_dwell: DEFAULT_LANDED_DWELL,
            climb_speed: DEFAULT_CLIMB_SPEED,
            takeoff_frames: DEFAULT_TAKEOFF_FRAMES,
            ignored_titles: vec!["Settings".to_string()],
            seed: None,
            assets_dir: None,
        }
    }
}

impl PetConfig {
    /// Build a validated config from parsed CLI arguments.
    pub fn from_args(args: Args) -> Result<Self> {
        let mut config = Self {
            tick: Duration::from_millis(args.tick_ms),
            size: args.size,
            sight_distance: args.sight_distance,
            seed: args.seed,
            assets_dir: args.assets,
            ..Self::default()
        };
        config.ignored_titles.extend(args.ignored_titles);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(PetError::InvalidConfig("tick period must be non-zero".into()));
        }
        let positive = [
            ("size", self.size),
            ("walk speed", self.walk_speed),
            ("gravity", self.gravity),
            ("jump divisor", self.jump_divisor),
            ("climb speed", self.climb_speed),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(PetError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.launch_impulse < 0.0) {
            return Err(PetError::InvalidConfig(format!(
                "launch impulse must point upward (negative), got {}",
                self.launch_impulse
            )));
        }
        if self.sight_distance < 0.0 || self.takeoff_distance < 0.0 {
            return Err(PetError::InvalidConfig(
                "sight and takeoff distances must not be negative".into(),
            ));
        }
        if self.roam_ticks.is_empty() || *self.roam_ticks.start() == 0 {
            return Err(PetError::InvalidConfig(format!(
                "roam tick range {:?} must be non-empty and start above zero",
                self.roam_ticks
            )));
        }
        if !(0.0..=1.0).contains(&self.idle_chance) {
            return Err(PetError::InvalidConfig(format!(
                "idle chance {} must be within 0..=1",
                self.idle_chance
            )));
        }
        Ok(())
    }

    /// Landed dwell expressed in whole update ticks (at least one).
    pub fn landed_ticks(&self) -> u32 {
        let tick = self.tick.as_secs_f64();
        ((self.landed_dwell.as_secs_f64() / tick).ceil() as u32).max(1)
    }
}
