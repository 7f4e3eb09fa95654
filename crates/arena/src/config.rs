//! Arena configuration

use plane_collision::config::{CollisionConfig, Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Top-level arena settings, loadable from TOML or RON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ArenaConfig {
    /// World layout and simulation length
    pub world: WorldConfig,

    /// Tank behaviour
    pub tanks: TankConfig,

    /// Collision core settings
    pub collision: CollisionConfig,
}

/// World layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// RNG seed; the same seed replays the same match
    pub seed: u64,

    /// Half size of the square arena floor
    pub half_size: f32,

    /// Frames to simulate
    pub frames: u32,

    /// Obstacles scattered over the floor
    pub obstacle_count: u32,

    /// Pickups scattered over the floor
    pub item_count: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            half_size: 30.0,
            frames: 600,
            obstacle_count: 12,
            item_count: 8,
        }
    }
}

/// Tank behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    /// Tanks spawned at start
    pub count: u32,

    /// Forward advance per frame
    pub speed: f32,

    /// Largest heading change per frame (radians)
    pub max_turn: f32,

    /// Chance per frame that a tank fires
    pub fire_chance: f64,

    /// Projectile advance per frame
    pub shell_speed: f32,

    /// Frames a projectile lives before it is removed
    pub shell_lifetime: u32,

    /// Splash radius around a shell's impact point
    pub blast_radius: f32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            count: 6,
            speed: 0.15,
            max_turn: 0.05,
            fire_chance: 0.02,
            shell_speed: 0.8,
            shell_lifetime: 60,
            blast_radius: 3.0,
        }
    }
}

impl Config for ArenaConfig {}

impl ArenaConfig {
    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collision.validate()?;
        if !(self.world.half_size.is_finite() && self.world.half_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "world.half_size",
                reason: format!("expected a finite positive number, got {}", self.world.half_size),
            });
        }
        if !(self.tanks.blast_radius.is_finite() && self.tanks.blast_radius >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "tanks.blast_radius",
                reason: format!("expected a finite non-negative number, got {}", self.tanks.blast_radius),
            });
        }
        if !(0.0..=1.0).contains(&self.tanks.fire_chance) {
            return Err(ConfigError::Invalid {
                field: "tanks.fire_chance",
                reason: format!("expected a probability, got {}", self.tanks.fire_chance),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ArenaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ArenaConfig = load_toml("[world]\nseed = 99\n\n[collision]\ntrace_pairs = true\n");

        assert_eq!(config.world.seed, 99);
        assert_eq!(config.world.frames, WorldConfig::default().frames);
        assert!(config.collision.trace_pairs);
        assert_eq!(config.tanks, TankConfig::default());
    }

    #[test]
    fn test_bad_probability_is_rejected() {
        let mut config = ArenaConfig::default();
        config.tanks.fire_chance = 1.5;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "tanks.fire_chance",
                ..
            })
        ));
    }

    #[test]
    fn test_negative_blast_radius_is_rejected() {
        let mut config = ArenaConfig::default();
        config.tanks.blast_radius = -1.0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "tanks.blast_radius",
                ..
            })
        ));
    }

    fn load_toml(source: &str) -> ArenaConfig {
        let dir = std::env::temp_dir().join(format!("arena-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("arena.toml");
        std::fs::write(&path, source).unwrap();
        let config = ArenaConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        config
    }
}
