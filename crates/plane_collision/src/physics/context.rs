//! Collision contexts: one per registered body
//!
//! A context bundles what the pipeline needs about a body: its identity and
//! category, the local collider it was registered with, the current world
//! OBB, and its movement-lock bits.
//!
//! Static contexts compute their OBB once and are permanently locked on
//! `ALL`. Dynamic contexts rebuild the OBB from the pose provider at the
//! start of every frame and again before every pass; their OBB is only
//! meaningful between one `begin_frame` and the next.

use crate::ecs::Entity;
use crate::foundation::collections::new_key_type;
use crate::foundation::math::{Pose, Vec3};
use crate::physics::body::{BodyCategory, BodyProvider};
use crate::physics::lock_axis::{LockState, MovementLockAxis};
use crate::physics::obb::{ColliderBox, Obb};
use crate::physics::resolve::{ResolveBody, ResolveInfo};

new_key_type! {
    /// Stable key of a context inside the manager's arena
    pub struct ContextKey;
}

/// How a context's OBB is kept up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Computed once from a fixed pose
    Static,
    /// Recomputed from the owner's pose every frame
    Dynamic,
}

/// Collision state of one registered body
#[derive(Debug, Clone)]
pub struct CollisionContext {
    entity: Entity,
    category: BodyCategory,
    lifecycle: Lifecycle,
    collider: ColliderBox,
    obb: Obb,
    lock: LockState,
    forward_delta: f32,
    active: bool,
}

impl CollisionContext {
    /// Context for an immovable body at a fixed pose
    pub fn new_static(entity: Entity, category: BodyCategory, pose: &Pose, collider: ColliderBox) -> Self {
        Self {
            entity,
            category,
            lifecycle: Lifecycle::Static,
            collider,
            obb: Obb::from_pose(pose, &collider),
            lock: LockState::immovable(),
            forward_delta: 0.0,
            active: true,
        }
    }

    /// Context for a moving body
    ///
    /// Inactive until the first [`CollisionContext::begin_frame`] finds a
    /// pose for it.
    pub fn new_dynamic(entity: Entity, category: BodyCategory, collider: ColliderBox) -> Self {
        Self {
            entity,
            category,
            lifecycle: Lifecycle::Dynamic,
            collider,
            obb: Obb::from_pose(&Pose::identity(), &collider),
            lock: LockState::free(),
            forward_delta: 0.0,
            active: false,
        }
    }

    /// Entity this context belongs to
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Category the entity was registered under
    pub fn category(&self) -> BodyCategory {
        self.category
    }

    /// Static or dynamic
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Local collider the OBB is built from
    pub fn collider(&self) -> &ColliderBox {
        &self.collider
    }

    /// Current world OBB
    pub fn obb(&self) -> &Obb {
        &self.obb
    }

    /// Finalized lock bits
    pub fn lock_axis(&self) -> MovementLockAxis {
        self.lock.current()
    }

    /// Full lock state including pending bits
    pub fn lock_state(&self) -> &LockState {
        &self.lock
    }

    /// Forward advance sampled at the start of this frame
    pub fn forward_delta(&self) -> f32 {
        self.forward_delta
    }

    /// False when the pose provider had no pose for this body this frame
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// What the resolver needs to know about this body
    pub fn resolve_body(&self) -> ResolveBody {
        ResolveBody::new(self.lock.current(), self.forward_delta)
    }

    /// Start-of-frame refresh: new OBB, cleared locks, sampled forward delta
    pub fn begin_frame<P: BodyProvider + ?Sized>(&mut self, provider: &P) {
        if self.lifecycle == Lifecycle::Static {
            return;
        }
        self.lock.reset();
        self.forward_delta = provider.forward_delta(self.entity);
        self.update_obb(provider);
    }

    /// Rebuild a dynamic OBB from the provider's current pose
    ///
    /// Returns whether the context is active afterwards. Static contexts are
    /// left untouched.
    pub fn update_obb<P: BodyProvider + ?Sized>(&mut self, provider: &P) -> bool {
        if self.lifecycle == Lifecycle::Static {
            return self.active;
        }
        match provider.pose(self.entity) {
            Some(pose) => {
                self.obb = Obb::from_pose(&pose, &self.collider);
                self.active = true;
            }
            None => {
                if self.active {
                    log::debug!("{} {} has no pose this frame, skipping", self.category, self.entity);
                }
                self.active = false;
            }
        }
        self.active
    }

    /// Commit lock bits recorded during the last pass
    pub fn finalize_lock_axis(&mut self) {
        self.lock.finalize();
    }

    /// Fold pushed axes into the pending lock bits
    pub fn record_push(&mut self, pushed: MovementLockAxis) {
        if self.category.is_lock_subject() {
            self.lock.record(pushed);
        }
    }

    /// Move a dynamic body by a resolved displacement
    ///
    /// The local OBB is translated immediately so later pairs of the same
    /// pass see the new position; the provider is told so the owner moves
    /// too. Static contexts and zero vectors are ignored.
    pub fn apply_resolve<P: BodyProvider + ?Sized>(&mut self, info: &ResolveInfo, provider: &mut P) {
        if self.lifecycle == Lifecycle::Static || info.is_zero() {
            return;
        }
        self.obb.translate(info.displacement);
        provider.apply_displacement(self.entity, info.displacement);
    }

    /// Replace the pose of a static context (e.g. an obstacle was relocated)
    pub fn reposition_static(&mut self, pose: &Pose) {
        if self.lifecycle == Lifecycle::Static {
            self.obb = Obb::from_pose(pose, &self.collider);
        }
    }

    /// Horizontal offset between two contexts' centres, A minus B
    pub fn center_offset(&self, other: &Self) -> Vec3 {
        crate::foundation::math::horizontal(self.obb.center() - other.obb.center())
    }

    #[cfg(test)]
    pub(crate) fn for_test(obb: Obb, lock: MovementLockAxis) -> Self {
        let mut state = LockState::free();
        state.record(lock);
        state.finalize();
        Self {
            entity: Entity::new(u32::MAX),
            category: BodyCategory::Tank,
            lifecycle: Lifecycle::Dynamic,
            collider: ColliderBox::new(obb.half_extent() * 2.0),
            obb,
            lock: state,
            forward_delta: 0.0,
            active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::PoseTable;
    use approx::assert_relative_eq;

    fn unit_collider() -> ColliderBox {
        ColliderBox::new(Vec3::new(2.0, 1.0, 2.0))
    }

    #[test]
    fn test_static_context_is_locked_and_fixed() {
        let pose = Pose::from_position(Vec3::new(3.0, 0.0, 0.0));
        let mut ctx = CollisionContext::new_static(Entity::new(1), BodyCategory::Obstacle, &pose, unit_collider());

        assert_eq!(ctx.lock_axis(), MovementLockAxis::ALL);
        assert!(ctx.is_active());

        let mut table = PoseTable::new();
        ctx.begin_frame(&table);
        ctx.record_push(MovementLockAxis::X);
        ctx.finalize_lock_axis();
        ctx.apply_resolve(&ResolveInfo { displacement: Vec3::new(1.0, 0.0, 0.0) }, &mut table);

        assert_eq!(ctx.lock_axis(), MovementLockAxis::ALL);
        assert_eq!(ctx.obb().center(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_dynamic_context_follows_provider() {
        let tank = Entity::new(7);
        let mut table = PoseTable::new();
        table.insert(tank, Pose::from_position(Vec3::new(1.0, 0.0, 1.0)));
        table.advance(tank, 0.5);

        let mut ctx = CollisionContext::new_dynamic(tank, BodyCategory::Tank, unit_collider());
        assert!(!ctx.is_active());

        ctx.begin_frame(&table);
        assert!(ctx.is_active());
        assert_eq!(ctx.forward_delta(), 0.5);
        assert_relative_eq!(ctx.obb().center(), Vec3::new(1.0, 0.0, 1.5), epsilon = 1e-6);

        ctx.apply_resolve(&ResolveInfo { displacement: Vec3::new(-0.25, 0.0, 0.0) }, &mut table);
        assert_relative_eq!(ctx.obb().center(), Vec3::new(0.75, 0.0, 1.5), epsilon = 1e-6);
        assert_relative_eq!(table.pose(tank).unwrap().position, Vec3::new(0.75, 0.0, 1.5), epsilon = 1e-6);
    }

    #[test]
    fn test_missing_pose_deactivates() {
        let tank = Entity::new(2);
        let mut table = PoseTable::new();
        table.insert(tank, Pose::identity());

        let mut ctx = CollisionContext::new_dynamic(tank, BodyCategory::Tank, unit_collider());
        ctx.begin_frame(&table);
        assert!(ctx.is_active());

        table.remove(tank);
        assert!(!ctx.update_obb(&table));
    }

    #[test]
    fn test_begin_frame_clears_locks() {
        let tank = Entity::new(3);
        let mut table = PoseTable::new();
        table.insert(tank, Pose::identity());

        let mut ctx = CollisionContext::new_dynamic(tank, BodyCategory::Tank, unit_collider());
        ctx.begin_frame(&table);
        ctx.record_push(MovementLockAxis::Z);
        ctx.finalize_lock_axis();
        assert_eq!(ctx.lock_axis(), MovementLockAxis::Z);

        ctx.begin_frame(&table);
        assert_eq!(ctx.lock_axis(), MovementLockAxis::NONE);
    }

    #[test]
    fn test_projectiles_ignore_lock_pushes() {
        let shell = Entity::new(4);
        let mut ctx = CollisionContext::new_dynamic(shell, BodyCategory::Projectile, unit_collider());
        ctx.record_push(MovementLockAxis::ALL);
        ctx.finalize_lock_axis();

        assert_eq!(ctx.lock_axis(), MovementLockAxis::NONE);
    }
}
