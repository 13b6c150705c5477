use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while starting or running the pet.
#[derive(Debug, Error)]
pub enum PetError {
    #[error("sprite asset not found: {}", path.display())]
    MissingAsset { path: PathBuf },

    #[error("failed to decode sprite {}: {source}", path.display())]
    AssetDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no display available to place the pet on")]
    NoDisplay,

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("GPU setup failed: {0}")]
    Gpu(String),

    #[error("system tray unavailable: {0}")]
    Tray(String),

    #[error("window enumeration failed: {0}")]
    WindowQuery(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PetError>;
