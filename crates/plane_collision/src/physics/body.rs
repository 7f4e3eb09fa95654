//! Body categories and the pose-provider seam
//!
//! The collision core never owns game objects. Whatever does (an ECS, a
//! scene graph, a plain table) implements [`BodyProvider`] so the core can
//! pull fresh poses and push resolved displacements back.

use crate::ecs::Entity;
use crate::foundation::math::{Pose, Vec3};
use std::collections::HashMap;
use std::fmt;

/// What kind of body a context wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyCategory {
    /// Player or AI controlled vehicle; pushed around and lock-subject
    Tank,
    /// Immovable level geometry
    Obstacle,
    /// Pickup lying on the ground; static trigger target
    Item,
    /// Moving shell or missile; detected, never pushed
    Projectile,
}

impl BodyCategory {
    /// Every category, in registry order
    pub const ALL: [Self; 4] = [Self::Tank, Self::Obstacle, Self::Item, Self::Projectile];

    /// Bodies whose OBB is computed once at registration
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Obstacle | Self::Item)
    }

    /// Bodies whose OBB is rebuilt from the provider every frame
    pub const fn is_mover(self) -> bool {
        matches!(self, Self::Tank | Self::Projectile)
    }

    /// Bodies that take part in the movement-lock protocol
    pub const fn is_lock_subject(self) -> bool {
        matches!(self, Self::Tank)
    }
}

impl fmt::Display for BodyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tank => "tank",
            Self::Obstacle => "obstacle",
            Self::Item => "item",
            Self::Projectile => "projectile",
        };
        f.write_str(name)
    }
}

/// Source of poses and sink of displacements for dynamic bodies
///
/// A displacement passed to [`BodyProvider::apply_displacement`] must be
/// visible in the next [`BodyProvider::pose`] call for that entity: the
/// pipeline re-reads poses between passes of the same frame.
pub trait BodyProvider {
    /// Current world pose, or `None` if the entity no longer exists
    fn pose(&self, entity: Entity) -> Option<Pose>;

    /// Signed advance along the entity's forward axis during this step
    fn forward_delta(&self, _entity: Entity) -> f32 {
        0.0
    }

    /// Move the entity by a resolved displacement
    fn apply_displacement(&mut self, entity: Entity, displacement: Vec3);
}

/// Per-entity state kept by [`PoseTable`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    /// Current pose
    pub pose: Pose,
    /// Advance along forward this step
    pub forward_delta: f32,
}

/// Minimal table-backed [`BodyProvider`]
///
/// Useful for headless simulations and tests where nothing else owns the
/// poses.
#[derive(Debug, Clone, Default)]
pub struct PoseTable {
    bodies: HashMap<Entity, BodyState>,
}

impl PoseTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity's pose, clearing its forward delta
    pub fn insert(&mut self, entity: Entity, pose: Pose) {
        self.bodies.insert(
            entity,
            BodyState {
                pose,
                forward_delta: 0.0,
            },
        );
    }

    /// Forget an entity
    pub fn remove(&mut self, entity: Entity) -> Option<BodyState> {
        self.bodies.remove(&entity)
    }

    /// Look up an entity's state
    pub fn get(&self, entity: Entity) -> Option<&BodyState> {
        self.bodies.get(&entity)
    }

    /// Advance an entity along its forward axis and remember the step
    ///
    /// Returns `false` if the entity is unknown.
    pub fn advance(&mut self, entity: Entity, distance: f32) -> bool {
        match self.bodies.get_mut(&entity) {
            Some(state) => {
                let forward = state.pose.forward();
                state.pose.translate(forward * distance);
                state.forward_delta = distance;
                true
            }
            None => false,
        }
    }

    /// Zero every stored forward delta, e.g. at the end of a tick
    pub fn clear_deltas(&mut self) {
        for state in self.bodies.values_mut() {
            state.forward_delta = 0.0;
        }
    }

    /// Number of entities in the table
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True when the table is empty
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl BodyProvider for PoseTable {
    fn pose(&self, entity: Entity) -> Option<Pose> {
        self.bodies.get(&entity).map(|state| state.pose)
    }

    fn forward_delta(&self, entity: Entity) -> f32 {
        self.bodies.get(&entity).map_or(0.0, |state| state.forward_delta)
    }

    fn apply_displacement(&mut self, entity: Entity, displacement: Vec3) {
        if let Some(state) = self.bodies.get_mut(&entity) {
            state.pose.translate(displacement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::FRAC_PI_2;
    use approx::assert_relative_eq;

    #[test]
    fn test_category_flags() {
        assert!(BodyCategory::Obstacle.is_static());
        assert!(BodyCategory::Item.is_static());
        assert!(!BodyCategory::Projectile.is_static());
        assert!(BodyCategory::Projectile.is_mover());
        assert!(!BodyCategory::Item.is_mover());
        assert!(BodyCategory::Tank.is_lock_subject());
        assert!(!BodyCategory::Projectile.is_lock_subject());
    }

    #[test]
    fn test_pose_table_advance_and_displace() {
        let mut table = PoseTable::new();
        let tank = Entity::new(1);
        table.insert(tank, Pose::from_position_yaw(Vec3::zeros(), FRAC_PI_2));

        assert!(table.advance(tank, 2.0));
        assert_relative_eq!(table.forward_delta(tank), 2.0);
        assert_relative_eq!(table.pose(tank).unwrap().position, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);

        table.apply_displacement(tank, Vec3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(table.pose(tank).unwrap().position, Vec3::new(2.0, 0.0, 1.0), epsilon = 1e-5);

        table.clear_deltas();
        assert_eq!(table.forward_delta(tank), 0.0);
    }

    #[test]
    fn test_pose_table_unknown_entity() {
        let mut table = PoseTable::new();
        let ghost = Entity::new(9);

        assert!(table.pose(ghost).is_none());
        assert_eq!(table.forward_delta(ghost), 0.0);
        assert!(!table.advance(ghost, 1.0));
        table.apply_displacement(ghost, Vec3::new(1.0, 0.0, 0.0));
        assert!(table.is_empty());
    }
}
