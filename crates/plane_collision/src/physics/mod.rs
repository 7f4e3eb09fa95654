//! Physics module for yaw-only OBB collision detection and response
//!
//! Provides the separating-axis test and minimum translation vector for boxes
//! on the ground plane, the per-axis resolve distributor with movement locks,
//! and the collision manager that runs them once per frame.

pub mod body;
pub mod context;
pub mod lock_axis;
pub mod manager;
pub mod obb;
pub mod resolve;
pub mod sat;
pub mod service;

#[cfg(test)]
mod tests;

pub use body::{BodyCategory, BodyProvider, BodyState, PoseTable};
pub use context::{CollisionContext, ContextKey, Lifecycle};
pub use lock_axis::{LockPhase, LockProtocol, LockState, MovementLockAxis, PlaneAxis};
pub use manager::{CollisionManager, RESOLVE_ROUNDS};
pub use obb::{ColliderBox, Obb};
pub use resolve::{ResolveBody, ResolveDistributor, ResolveInfo, ResolveOutcome};
pub use sat::{is_colliding, overlaps_circle_horizontal, try_calculate_mtv, Mtv};
pub use service::{CollisionService, FrameStats, Pairing, ServiceEnv, ServiceKind};
