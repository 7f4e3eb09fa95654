//! Headless tank arena
//!
//! Runs a seeded match through the collision pipeline and logs what
//! happened. Pass a `.toml` or `.ron` file to override the defaults:
//!
//! ```text
//! RUST_LOG=debug arena arena.toml
//! ```

mod config;
mod world;

use config::ArenaConfig;
use plane_collision::config::Config;
use plane_collision::foundation::logging;
use plane_collision::physics::ServiceKind;
use world::Match;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading arena config from {path}");
            ArenaConfig::load_from_file(&path)?
        }
        None => ArenaConfig::default(),
    };
    config.validate()?;

    let mut arena = Match::new(config);
    let summary = arena.run();
    let tally = arena.tally();

    log::info!(
        "Match over after {} frames: {} shots, {} tank hits, {} splash hits, {} pickups, {} pairs resolved",
        summary.frames,
        summary.shots,
        summary.tank_hits,
        summary.splash_hits,
        summary.pickups,
        summary.resolved_pairs
    );
    for service in [
        ServiceKind::MoverStatic,
        ServiceKind::MoverMover,
        ServiceKind::MoverPickup,
        ServiceKind::ProjectileStatic,
        ServiceKind::ProjectileMover,
    ] {
        log::info!("  {service}: {} hits", tally.count(service));
    }
    log::info!("  total: {} hits", tally.total());

    Ok(())
}
