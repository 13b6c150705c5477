mod app;
mod behavior;
mod config;
mod controller;
mod error;
mod geometry;
mod pet;
mod physics;
mod platform;
mod render;
mod sensor;
mod sprite;
mod tray;

#[cfg(test)]
mod testing;

use clap::Parser;

use crate::config::{Args, PetConfig};

fn main() {
    env_logger::init();
    log::info!("DeskPet starting up");

    let args = Args::parse();
    if let Err(e) = PetConfig::from_args(args).and_then(app::run) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
