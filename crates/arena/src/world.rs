//! Seeded arena match: wandering tanks, scattered cover and pickups, shells

use crate::config::ArenaConfig;
use plane_collision::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const TANK_SIZE: [f32; 3] = [2.0, 1.2, 3.0];
const SHELL_SIZE: [f32; 3] = [0.2, 0.2, 0.6];
const ITEM_SIZE: [f32; 3] = [0.8, 0.8, 0.8];

/// Muzzle distance ahead of the tank centre
const MUZZLE_OFFSET: f32 = 2.0;

fn collider(size: [f32; 3]) -> ColliderBox {
    ColliderBox::new(Vec3::new(size[0], size[1], size[2]))
}

/// Hit counts per service, filled by a subscribed handler
#[derive(Debug, Clone, Default)]
pub struct HitTally {
    counts: HashMap<ServiceKind, u64>,
}

impl HitTally {
    /// Hits seen from `service`
    pub fn count(&self, service: ServiceKind) -> u64 {
        self.counts.get(&service).copied().unwrap_or(0)
    }

    /// Hits seen overall
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl HitHandler for HitTally {
    fn on_hit(&mut self, hit: &HitEvent) {
        *self.counts.entry(hit.service).or_insert(0) += 1;
    }
}

/// End-of-match numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchSummary {
    /// Frames simulated
    pub frames: u32,
    /// Shells fired
    pub shots: u32,
    /// Shells that struck a tank
    pub tank_hits: u32,
    /// Tanks caught in a blast radius
    pub splash_hits: u32,
    /// Pickups collected
    pub pickups: u32,
    /// Pairs separated by the resolver
    pub resolved_pairs: u64,
}

#[derive(Debug, Clone, Copy)]
struct Shell {
    entity: Entity,
    shooter: Entity,
    age: u32,
}

/// A running match
pub struct Match {
    config: ArenaConfig,
    manager: CollisionManager,
    bodies: PoseTable,
    rng: StdRng,
    tanks: Vec<Entity>,
    shells: Vec<Shell>,
    tally: Rc<RefCell<HitTally>>,
    next_id: u32,
    summary: MatchSummary,
}

/// Forwards hits to a shared tally
struct SharedTally(Rc<RefCell<HitTally>>);

impl HitHandler for SharedTally {
    fn on_hit(&mut self, hit: &HitEvent) {
        self.0.borrow_mut().on_hit(hit);
    }
}

impl Match {
    /// Lay out a new match from `config`
    pub fn new(config: ArenaConfig) -> Self {
        let mut manager = CollisionManager::new(config.collision.clone());
        let tally = Rc::new(RefCell::new(HitTally::default()));
        manager.subscribe(Box::new(SharedTally(Rc::clone(&tally))));

        let mut arena = Self {
            rng: StdRng::seed_from_u64(config.world.seed),
            manager,
            bodies: PoseTable::new(),
            tanks: Vec::new(),
            shells: Vec::new(),
            tally,
            next_id: 0,
            summary: MatchSummary::default(),
            config,
        };
        arena.populate();
        arena
    }

    fn spawn_id(&mut self) -> Entity {
        self.next_id += 1;
        Entity::new(self.next_id)
    }

    fn random_pose(&mut self) -> Pose {
        let half = self.config.world.half_size;
        let x = self.rng.gen_range(-half..half);
        let z = self.rng.gen_range(-half..half);
        let yaw = self.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
        Pose::from_position_yaw(Vec3::new(x, 0.0, z), yaw)
    }

    fn populate(&mut self) {
        for _ in 0..self.config.world.obstacle_count {
            let entity = self.spawn_id();
            let pose = self.random_pose();
            let size = [
                self.rng.gen_range(1.0..6.0),
                2.0,
                self.rng.gen_range(1.0..6.0),
            ];
            self.manager.register_obstacle(entity, &pose, collider(size));
            if let Some(ctx) = self.manager.context(BodyCategory::Obstacle, entity) {
                let obb = ctx.obb();
                log::debug!(
                    "{entity}: {:.1} m2 cover at {:?}",
                    obb.footprint_area(),
                    obb.corners()
                );
            }
        }

        for _ in 0..self.config.world.item_count {
            let entity = self.spawn_id();
            let pose = self.random_pose();
            self.manager.register_item(entity, &pose, collider(ITEM_SIZE));
        }

        for _ in 0..self.config.tanks.count {
            let entity = self.spawn_id();
            let pose = self.random_pose();
            self.bodies.insert(entity, pose);
            self.manager.register_tank(entity, collider(TANK_SIZE));
            self.tanks.push(entity);
        }

        log::info!(
            "Arena ready: {} tanks, {} obstacles, {} items (seed {})",
            self.manager.len(BodyCategory::Tank),
            self.manager.len(BodyCategory::Obstacle),
            self.manager.len(BodyCategory::Item),
            self.config.world.seed
        );
    }

    /// Collision manager driving the match
    pub fn manager(&self) -> &CollisionManager {
        &self.manager
    }

    /// Current pose of a tank or shell
    pub fn pose(&self, entity: Entity) -> Option<Pose> {
        self.bodies.pose(entity)
    }

    /// Tanks in spawn order
    pub fn tanks(&self) -> &[Entity] {
        &self.tanks
    }

    /// Hits seen so far, per service
    pub fn tally(&self) -> HitTally {
        self.tally.borrow().clone()
    }

    /// Run every configured frame and report
    pub fn run(&mut self) -> MatchSummary {
        for _ in 0..self.config.world.frames {
            self.step();
        }
        self.summary
    }

    /// Simulate one frame
    pub fn step(&mut self) {
        self.bodies.clear_deltas();
        self.drive_tanks();
        self.fire();
        self.fly_shells();

        let stats = self.manager.update(&mut self.bodies);
        self.summary.frames += 1;
        self.summary.resolved_pairs += u64::from(stats.pairs_resolved);

        self.consume_hits();
    }

    fn drive_tanks(&mut self) {
        let half = self.config.world.half_size;
        let speed = self.config.tanks.speed;
        let max_turn = self.config.tanks.max_turn;

        for index in 0..self.tanks.len() {
            let tank = self.tanks[index];
            let Some(pose) = self.bodies.pose(tank) else {
                continue;
            };

            let position = pose.position;
            let yaw = if position.x.abs() > half || position.z.abs() > half {
                // Head back towards the middle
                (-position.x).atan2(-position.z)
            } else {
                pose.yaw() + self.rng.gen_range(-max_turn..=max_turn)
            };

            self.bodies.insert(tank, Pose::from_position_yaw(position, yaw));
            self.bodies.advance(tank, speed);
        }
    }

    fn fire(&mut self) {
        let chance = self.config.tanks.fire_chance;
        for index in 0..self.tanks.len() {
            if !self.rng.gen_bool(chance) {
                continue;
            }
            let shooter = self.tanks[index];
            let Some(pose) = self.bodies.pose(shooter) else {
                continue;
            };

            let entity = self.spawn_id();
            let muzzle = pose.position + pose.forward() * MUZZLE_OFFSET;
            self.bodies.insert(entity, Pose::from_position_rotation(muzzle, pose.rotation));
            self.manager.register_projectile(entity, collider(SHELL_SIZE));
            self.shells.push(Shell {
                entity,
                shooter,
                age: 0,
            });
            self.summary.shots += 1;
            log::debug!("{shooter} fired {entity}");
        }
    }

    fn fly_shells(&mut self) {
        let speed = self.config.tanks.shell_speed;
        let lifetime = self.config.tanks.shell_lifetime;

        let mut expired = Vec::new();
        for shell in &mut self.shells {
            shell.age += 1;
            if shell.age > lifetime {
                expired.push(shell.entity);
            } else {
                self.bodies.advance(shell.entity, speed);
            }
        }
        for entity in expired {
            self.despawn_shell(entity);
        }
    }

    fn despawn_shell(&mut self, entity: Entity) {
        self.shells.retain(|shell| shell.entity != entity);
        self.manager.unregister_projectile(entity);
        self.bodies.remove(entity);
    }

    fn consume_hits(&mut self) {
        let mut spent_shells = Vec::new();
        let mut collected = Vec::new();

        for hit in self.manager.frame_hits() {
            match hit.service {
                ServiceKind::MoverPickup => collected.push((hit.entity_a, hit.entity_b)),
                ServiceKind::ProjectileStatic => spent_shells.push(hit.entity_a),
                ServiceKind::ProjectileMover => {
                    let own_shot = self
                        .shells
                        .iter()
                        .any(|shell| shell.entity == hit.entity_a && shell.shooter == hit.entity_b);
                    if !own_shot {
                        log::info!("{} hit {} on frame {}", hit.entity_a, hit.entity_b, hit.frame);
                        self.summary.tank_hits += 1;
                        spent_shells.push(hit.entity_a);
                    }
                }
                ServiceKind::MoverStatic | ServiceKind::MoverMover => {}
            }
        }

        for (tank, item) in collected {
            if self.manager.unregister_item(item) {
                log::info!("{tank} collected {item}");
                self.summary.pickups += 1;
            }
        }
        for shell in spent_shells {
            if self.manager.is_registered(BodyCategory::Projectile, shell) {
                if let Some(pose) = self.bodies.pose(shell) {
                    let caught = self.area_damage(pose.position);
                    self.summary.splash_hits += caught.len() as u32;
                }
                self.despawn_shell(shell);
            }
        }
    }

    /// Tanks within the blast radius of an impact at `center`
    pub fn area_damage(&mut self, center: Vec3) -> Vec<Entity> {
        let radius = self.config.tanks.blast_radius;
        let caught: Vec<Entity> = self
            .manager
            .get_overlapping_circle_horizontal(center, radius)
            .into_iter()
            .filter(|ctx| ctx.category() == BodyCategory::Tank)
            .map(CollisionContext::entity)
            .collect();

        if !caught.is_empty() {
            log::debug!("Blast at {center:?} caught {} tanks", caught.len());
        }
        caught
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> ArenaConfig {
        let mut config = ArenaConfig::default();
        config.world.seed = seed;
        config.world.frames = 120;
        config.world.half_size = 12.0;
        config.tanks.count = 5;
        config.tanks.fire_chance = 0.05;
        config
    }

    #[test]
    fn test_same_seed_replays_the_same_match() {
        let first = Match::new(small_config(3)).run();
        let second = Match::new(small_config(3)).run();

        assert_eq!(first, second);
        assert_eq!(first.frames, 120);
    }

    #[test]
    fn test_tally_matches_frame_hits() {
        let mut arena = Match::new(small_config(11));
        let mut pulled = 0u64;
        for _ in 0..60 {
            arena.step();
            pulled += arena.manager().frame_hits().len() as u64;
        }

        assert_eq!(arena.tally().total(), pulled);
    }

    #[test]
    fn test_tanks_stay_near_the_arena() {
        let config = small_config(5);
        let limit = config.world.half_size + 10.0;
        let mut arena = Match::new(config);
        for _ in 0..120 {
            arena.step();
        }

        for &tank in arena.tanks() {
            let position = arena.pose(tank).unwrap().position;
            assert!(position.iter().all(|c| c.is_finite()));
            assert!(position.x.abs() < limit && position.z.abs() < limit, "{tank} wandered to {position:?}");
        }
        assert_eq!(arena.manager().frame(), 120);
    }

    #[test]
    fn test_blast_catches_the_tank_under_it() {
        let mut arena = Match::new(small_config(9));
        arena.step();

        let tank = arena.tanks()[0];
        let position = arena.pose(tank).unwrap().position;
        let caught = arena.area_damage(position);

        assert!(caught.contains(&tank));
        assert!(caught.iter().all(|entity| arena.tanks().contains(entity)));
    }

    #[test]
    fn test_zero_radius_blast_away_from_everything_is_empty() {
        let mut config = small_config(9);
        config.tanks.blast_radius = 0.0;
        let mut arena = Match::new(config);
        arena.step();

        assert!(arena.area_damage(Vec3::new(1.0e4, 0.0, 1.0e4)).is_empty());
    }
}
