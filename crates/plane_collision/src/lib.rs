//! # Plane Collision
//!
//! Collision detection and positional resolution for boxes that only rotate
//! about the vertical axis, as used by ground-based vehicle games.
//!
//! ## Features
//!
//! - **Horizontal SAT**: four-axis overlap test and minimum translation vector
//! - **Resolve distribution**: per-axis split of each push between two bodies
//! - **Movement locks**: bodies pinned by a wall pass the push on instead of
//!   sinking into it
//! - **Frame pipeline**: fixed service order with bounded relaxation rounds
//! - **Hit events**: every overlapping pair is reported to subscribed handlers
//!
//! ## Quick Start
//!
//! ```rust
//! use plane_collision::prelude::*;
//!
//! let mut manager = CollisionManager::default();
//! let mut world = PoseTable::new();
//!
//! let tank = Entity::new(1);
//! world.insert(tank, Pose::from_position(Vec3::new(0.0, 0.0, 0.0)));
//! manager.register_tank(tank, ColliderBox::new(Vec3::new(2.0, 1.0, 2.0)));
//!
//! let wall = Entity::new(2);
//! let wall_pose = Pose::from_position(Vec3::new(0.0, 0.0, 2.5));
//! manager.register_obstacle(wall, &wall_pose, ColliderBox::new(Vec3::new(2.0, 1.0, 2.0)));
//!
//! world.advance(tank, 0.75);
//! let stats = manager.update(&mut world);
//!
//! assert_eq!(stats.pairs_resolved, 1);
//! assert_eq!(manager.lock_axis(tank), Some(MovementLockAxis::Z));
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod physics;

/// Common imports for collision users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, ConfigError},
        ecs::Entity,
        events::{HandlerId, HitEvent, HitHandler},
        foundation::math::{Pose, Quat, Vec3},
        physics::{
            BodyCategory, BodyProvider, ColliderBox, CollisionContext, CollisionManager, FrameStats,
            MovementLockAxis, Obb, PoseTable, ServiceKind,
        },
    };
}
