//! Frame pipeline scenarios driven through a `PoseTable`
//!
//! Every collider here is a 2 x 2 footprint unless stated otherwise, so
//! centres closer than 2.0 on an axis overlap and exactly 2.0 only touches.

use crate::ecs::Entity;
use crate::events::HitEvent;
use crate::foundation::logging;
use crate::foundation::math::{Pose, Vec3};
use crate::physics::{
    try_calculate_mtv, BodyCategory, BodyProvider, ColliderBox, CollisionManager, MovementLockAxis, PoseTable,
    ServiceKind,
};
use approx::assert_relative_eq;
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn square() -> ColliderBox {
        ColliderBox::new(Vec3::new(2.0, 1.0, 2.0))
    }

    fn at(x: f32, z: f32) -> Pose {
        Pose::from_position(Vec3::new(x, 0.0, z))
    }

    struct Arena {
        manager: CollisionManager,
        world: PoseTable,
    }

    impl Arena {
        fn new() -> Self {
            logging::init_for_tests();
            Self {
                manager: CollisionManager::default(),
                world: PoseTable::new(),
            }
        }

        fn tank(&mut self, id: u32, pose: Pose) -> Entity {
            let entity = Entity::new(id);
            self.world.insert(entity, pose);
            assert!(self.manager.register_tank(entity, square()));
            entity
        }

        fn wall(&mut self, id: u32, pose: Pose) -> Entity {
            let entity = Entity::new(id);
            assert!(self.manager.register_obstacle(entity, &pose, square()));
            entity
        }

        fn step(&mut self) {
            self.manager.update(&mut self.world);
            self.world.clear_deltas();
        }

        fn position(&self, entity: Entity) -> Vec3 {
            self.world.pose(entity).map(|pose| pose.position).unwrap()
        }

        fn services(&self) -> Vec<ServiceKind> {
            self.manager.frame_hits().iter().map(|hit| hit.service).collect()
        }
    }

    #[test]
    fn test_tank_driving_into_wall_is_stopped_and_locked() {
        let mut arena = Arena::new();
        let tank = arena.tank(1, at(0.0, 0.0));
        arena.wall(100, at(0.0, 2.5));

        arena.world.advance(tank, 0.75);
        arena.manager.update(&mut arena.world);

        assert_relative_eq!(arena.position(tank), Vec3::new(0.0, 0.0, 0.5), epsilon = EPSILON);
        assert_eq!(arena.manager.lock_axis(tank), Some(MovementLockAxis::Z));
        assert_eq!(arena.services(), vec![ServiceKind::MoverStatic]);

        let stats = arena.manager.last_stats();
        assert_eq!(stats.pairs_resolved, 1);
        assert_eq!(stats.hits, 1);

        // Locks do not outlive the frame
        arena.world.clear_deltas();
        arena.step();
        assert_eq!(arena.manager.lock_axis(tank), Some(MovementLockAxis::NONE));
        assert!(arena.manager.frame_hits().is_empty());
    }

    #[test]
    fn test_chain_against_wall_pushes_back_the_rammer() {
        let mut arena = Arena::new();
        let pinned = arena.tank(1, at(0.0, 0.5));
        let rammer = arena.tank(2, at(0.0, -1.5));
        arena.wall(100, at(0.0, 2.5));

        arena.world.advance(rammer, 0.5);
        arena.step();

        // Round 0 shoves the pinned tank into the wall, round 1 pushes it back
        // out, locks it, and hands the overlap to the rammer.
        assert_relative_eq!(arena.position(pinned), Vec3::new(0.0, 0.0, 0.5), epsilon = EPSILON);
        assert_relative_eq!(arena.position(rammer), Vec3::new(0.0, 0.0, -1.5), epsilon = EPSILON);
        assert_eq!(arena.manager.lock_axis(pinned), Some(MovementLockAxis::Z));
        assert_eq!(arena.manager.lock_axis(rammer), Some(MovementLockAxis::NONE));
        assert_eq!(
            arena.services(),
            vec![ServiceKind::MoverMover, ServiceKind::MoverStatic, ServiceKind::MoverMover]
        );
    }

    #[test]
    fn test_pushed_tank_does_not_pass_the_push_along() {
        let mut arena = Arena::new();
        let rammer = arena.tank(1, at(0.0, -0.5));
        let middle = arena.tank(2, at(1.8, 0.0));
        let end = arena.tank(3, at(3.6, 0.0));

        arena.world.advance(rammer, 0.5);
        arena.step();

        // The middle tank yields to the rammer but is not locked by it, so
        // its overlap with the idle end tank stays a tie in the second round.
        assert_relative_eq!(arena.position(rammer), Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(arena.position(middle), Vec3::new(2.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(arena.position(end), Vec3::new(3.6, 0.0, 0.0), epsilon = EPSILON);
        for tank in [rammer, middle, end] {
            assert_eq!(arena.manager.lock_axis(tank), Some(MovementLockAxis::NONE));
        }
        assert_eq!(arena.manager.last_stats().pairs_resolved, 1);
    }

    #[test]
    fn test_head_on_slower_tank_yields() {
        let mut arena = Arena::new();
        let slow = arena.tank(1, at(0.0, -0.25));
        let fast = arena.tank(2, at(0.0, 2.0));

        arena.world.advance(slow, 0.25);
        arena.world.advance(fast, -0.5);
        arena.step();

        assert_relative_eq!(arena.position(slow), Vec3::new(0.0, 0.0, -0.5), epsilon = EPSILON);
        assert_relative_eq!(arena.position(fast), Vec3::new(0.0, 0.0, 1.5), epsilon = EPSILON);
        assert_eq!(arena.manager.lock_axis(slow), Some(MovementLockAxis::Z));
        assert_eq!(arena.manager.lock_axis(fast), Some(MovementLockAxis::NONE));
    }

    #[test]
    fn test_idle_overlap_is_left_alone() {
        let mut arena = Arena::new();
        let a = arena.tank(1, at(0.0, 0.0));
        let b = arena.tank(2, at(1.0, 0.0));

        arena.step();

        assert_relative_eq!(arena.position(a), Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(arena.position(b), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        // Reported once per round
        assert_eq!(arena.services(), vec![ServiceKind::MoverMover; 2]);
        assert_eq!(arena.manager.last_stats().pairs_resolved, 0);
    }

    #[test]
    fn test_rotated_tank_never_stays_inside_rotated_wall() {
        let mut arena = Arena::new();
        let tank = arena.tank(1, Pose::from_position_yaw(Vec3::new(0.3, 0.0, -3.0), 0.5));
        let wall = arena.wall(100, Pose::from_position_yaw(Vec3::new(0.0, 0.0, 1.0), 0.8));

        for _ in 0..20 {
            arena.world.advance(tank, 0.2);
            arena.step();

            let tank_obb = *arena.manager.context(BodyCategory::Tank, tank).unwrap().obb();
            let wall_obb = *arena.manager.context(BodyCategory::Obstacle, wall).unwrap().obb();
            let residual = try_calculate_mtv(&tank_obb, &wall_obb).map_or(0.0, |mtv| mtv.overlap);
            assert!(residual < 1e-4, "tank left inside wall by {residual}");
        }

        assert!(arena.manager.last_stats().frame == 20);
    }

    #[test]
    fn test_projectile_hits_are_reported_without_moving_anything() {
        let mut arena = Arena::new();
        let tank = arena.tank(1, at(0.0, 0.0));
        let wall = arena.wall(100, at(4.0, 0.0));

        let shell = Entity::new(50);
        arena.world.insert(shell, at(2.95, 0.0));
        arena
            .manager
            .register_projectile(shell, ColliderBox::new(Vec3::new(0.2, 0.2, 2.2)));

        let seen: Rc<RefCell<Vec<HitEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        arena
            .manager
            .subscribe(Box::new(move |hit: &HitEvent| sink.borrow_mut().push(*hit)));

        arena.step();

        // Only the wall is in reach this frame
        assert_eq!(arena.services(), vec![ServiceKind::ProjectileStatic]);
        let hit = arena.manager.frame_hits()[0];
        assert_eq!(hit.entity_a, shell);
        assert_eq!(hit.other(shell), Some(wall));
        assert!(hit.resolve_a.is_zero() && hit.resolve_b.is_zero());
        assert_relative_eq!(arena.position(shell), Vec3::new(2.95, 0.0, 0.0), epsilon = EPSILON);

        // Drift onto the tank
        arena.world.apply_displacement(shell, Vec3::new(-2.0, 0.0, 0.0));
        arena.step();

        assert_eq!(arena.services(), vec![ServiceKind::ProjectileMover]);
        assert_eq!(arena.manager.frame_hits()[0].other(shell), Some(tank));
        assert_relative_eq!(arena.position(tank), Vec3::zeros(), epsilon = EPSILON);
        assert_eq!(arena.manager.lock_axis(tank), Some(MovementLockAxis::NONE));

        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1].frame, 2);
    }

    #[test]
    fn test_pickup_overlap_is_a_trigger() {
        let mut arena = Arena::new();
        let tank = arena.tank(1, at(0.0, 0.0));
        let crate_item = Entity::new(200);
        arena
            .manager
            .register_item(crate_item, &at(0.5, 0.5), ColliderBox::new(Vec3::new(1.0, 1.0, 1.0)));

        arena.step();

        assert_eq!(arena.services(), vec![ServiceKind::MoverPickup]);
        let hit = arena.manager.frame_hits()[0];
        assert_eq!((hit.category_a, hit.category_b), (BodyCategory::Tank, BodyCategory::Item));
        assert_relative_eq!(arena.position(tank), Vec3::zeros(), epsilon = EPSILON);

        // Picked up
        assert!(arena.manager.unregister_item(crate_item));
        arena.step();
        assert!(arena.manager.frame_hits().is_empty());
    }

    #[test]
    fn test_unregister_between_frames() {
        let mut arena = Arena::new();
        let a = arena.tank(1, at(0.0, 0.0));
        let b = arena.tank(2, at(1.5, 0.0));

        arena.world.advance(b, 0.1);
        arena.step();
        assert!(!arena.manager.frame_hits().is_empty());

        assert!(arena.manager.unregister_tank(a));
        arena.step();
        assert!(arena.manager.frame_hits().is_empty());
        assert_eq!(arena.manager.last_stats().pairs_tested, 0);

        // The same entity can come back
        assert!(arena.manager.register_tank(a, square()));
        assert_eq!(arena.manager.len(BodyCategory::Tank), 2);
        arena.step();
        assert_eq!(arena.manager.last_stats().pairs_tested, 2);
    }

    #[test]
    fn test_tank_without_pose_is_skipped() {
        let mut arena = Arena::new();
        let present = arena.tank(1, at(0.0, 0.0));
        let ghost = Entity::new(2);
        arena.manager.register_tank(ghost, square());
        arena.wall(100, at(0.0, 1.0));

        arena.step();

        let ghost_ctx = arena.manager.context(BodyCategory::Tank, ghost).unwrap();
        assert!(!ghost_ctx.is_active());
        // Only the present tank met the wall, once per round
        assert_eq!(arena.manager.last_stats().pairs_tested, 2);
        assert!(arena.manager.frame_hits().iter().all(|hit| hit.entity_a == present));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut arena = Arena::new();
        arena.tank(1, at(0.0, 0.0));
        arena.wall(100, at(0.0, 1.5));
        arena.step();

        arena.manager.clear();
        assert!(arena.manager.is_empty());
        assert!(arena.manager.frame_hits().is_empty());

        arena.step();
        assert_eq!(arena.manager.last_stats().pairs_tested, 0);
    }
}
