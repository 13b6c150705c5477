use std::path::{Path, PathBuf};

use crate::behavior::BehaviorState;
use crate::error::{PetError, Result};
use crate::pet::Facing;

/// Named sprite images. Every sprite is drawn facing right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SpriteId {
    Idle,
    Walk,
    Grabbed,
    Falling,
    Landed,
    Takeoff,
    Jump,
}

impl SpriteId {
    pub const ALL: [SpriteId; 7] = [
        SpriteId::Idle,
        SpriteId::Walk,
        SpriteId::Grabbed,
        SpriteId::Falling,
        SpriteId::Landed,
        SpriteId::Takeoff,
        SpriteId::Jump,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SpriteId::Idle => "idle.png",
            SpriteId::Walk => "walk.png",
            SpriteId::Grabbed => "grabbed.png",
            SpriteId::Falling => "falling.png",
            SpriteId::Landed => "landed.png",
            SpriteId::Takeoff => "takeoff.png",
            SpriteId::Jump => "jump.png",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// What to draw: which image, and whether to mirror it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteKey {
    pub sprite: SpriteId,
    pub flip_x: bool,
}

/// Map a state and facing to a sprite. Pure projection.
pub fn render_key(state: &BehaviorState, facing: Facing, takeoff_frames: u32) -> SpriteKey {
    let sprite = match *state {
        BehaviorState::Idle { .. } => SpriteId::Idle,
        BehaviorState::Roam { .. } | BehaviorState::WindowRoam { .. } => SpriteId::Walk,
        BehaviorState::FollowCursor { .. } => {
            if facing == Facing::Neutral {
                SpriteId::Idle
            } else {
                SpriteId::Walk
            }
        }
        BehaviorState::Grabbed { shaken: true } => SpriteId::Falling,
        BehaviorState::Grabbed { shaken: false } | BehaviorState::Climb { .. } => {
            SpriteId::Grabbed
        }
        BehaviorState::Falling => SpriteId::Falling,
        BehaviorState::Landed { .. } => SpriteId::Landed,
        BehaviorState::Jump { elapsed, .. } => {
            if elapsed < takeoff_frames {
                SpriteId::Takeoff
            } else {
                SpriteId::Jump
            }
        }
    };
    SpriteKey {
        sprite,
        flip_x: facing == Facing::Left,
    }
}

/// How the assets directory was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetMode {
    /// Given on the command line.
    Explicit,
    /// `assets/` next to the installed executable.
    Packaged,
    /// `assets/` under the working directory, when run from a checkout.
    Source,
}

/// Locate the sprite directory.
pub fn resolve_assets_dir(explicit: Option<&Path>) -> (PathBuf, AssetMode) {
    if let Some(dir) = explicit {
        return (dir.to_path_buf(), AssetMode::Explicit);
    }
    let packaged = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("assets")));
    match packaged {
        Some(dir) if dir.is_dir() => (dir, AssetMode::Packaged),
        _ => (PathBuf::from("assets"), AssetMode::Source),
    }
}

/// A decoded sprite, RGBA8 with straight alpha.
#[derive(Debug, Clone)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// All sprites, indexed by [`SpriteId::index`].
#[derive(Debug)]
pub struct SpriteSheet {
    pub images: Vec<SpriteImage>,
}

impl SpriteSheet {
    /// Decode every sprite. A missing or broken file is fatal: there would
    /// be nothing to draw for that state.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut images = Vec::with_capacity(SpriteId::ALL.len());
        for id in SpriteId::ALL {
            let path = dir.join(id.file_name());
            if !path.is_file() {
                return Err(PetError::MissingAsset { path });
            }
            let decoded = image::open(&path)
                .map_err(|source| PetError::AssetDecode {
                    path: path.clone(),
                    source,
                })?
                .to_rgba8();
            images.push(SpriteImage {
                width: decoded.width(),
                height: decoded.height(),
                rgba: decoded.into_raw(),
            });
        }
        log::info!("Loaded {} sprites from {}", images.len(), dir.display());
        Ok(Self { images })
    }

    pub fn get(&self, id: SpriteId) -> &SpriteImage {
        &self.images[id.index()]
    }
}
