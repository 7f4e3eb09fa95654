//! Collision manager: registries, frame pipeline and spatial queries
//!
//! The manager owns every collision context, keyed by entity in one registry
//! per category. Each registry keeps a flat snapshot of its context keys that
//! is rebuilt only after membership changed, so a frame without spawns or
//! despawns allocates nothing.
//!
//! Frame order (fixed):
//! 1. refresh dynamic OBBs and clear mover locks
//! 2. `RESOLVE_ROUNDS` times: movers vs statics, finalize locks, movers vs
//!    movers
//! 3. trigger passes: movers vs pickups, projectiles vs statics,
//!    projectiles vs movers
//! 4. dispatch the frame's hits

use crate::config::CollisionConfig;
use crate::ecs::Entity;
use crate::events::{HandlerId, HitDispatcher, HitEvent, HitHandler};
use crate::foundation::collections::{Registry, SlotMap};
use crate::foundation::math::{Pose, Vec3};
use crate::physics::body::{BodyCategory, BodyProvider};
use crate::physics::context::{CollisionContext, ContextKey};
use crate::physics::lock_axis::{LockPhase, LockProtocol, MovementLockAxis};
use crate::physics::obb::ColliderBox;
use crate::physics::resolve::ResolveDistributor;
use crate::physics::sat::overlaps_circle_horizontal;
use crate::physics::service::{CollisionService, FrameStats, ServiceEnv, ServiceKind};

/// Number of resolve -> finalize -> resolve rounds per frame
///
/// Two rounds settle the common two-body contacts and simple three-body
/// chains. Changing it changes how stacks and corners behave.
pub const RESOLVE_ROUNDS: usize = 2;

/// Owner of all collision contexts and driver of the per-frame pipeline
#[derive(Debug)]
pub struct CollisionManager {
    config: CollisionConfig,
    distributor: ResolveDistributor,
    contexts: SlotMap<ContextKey, CollisionContext>,
    tanks: Registry<Entity, ContextKey>,
    obstacles: Registry<Entity, ContextKey>,
    items: Registry<Entity, ContextKey>,
    projectiles: Registry<Entity, ContextKey>,
    hits: HitDispatcher,
    protocol: LockProtocol,
    query_scratch: Vec<ContextKey>,
    frame: u64,
    last_stats: FrameStats,
}

impl Default for CollisionManager {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

impl CollisionManager {
    /// Create a manager with the given configuration
    pub fn new(config: CollisionConfig) -> Self {
        if let Err(err) = config.validate() {
            log::warn!("Collision config rejected ({err}), using defaults");
            return Self::new(CollisionConfig::default());
        }

        let capacity = config.registry_capacity;
        log::info!(
            "Collision manager ready (epsilon {}, {} resolve rounds)",
            config.resolve_epsilon,
            RESOLVE_ROUNDS
        );

        Self {
            distributor: ResolveDistributor::from_config(&config),
            contexts: SlotMap::with_capacity_and_key(capacity * 2),
            tanks: Registry::with_capacity(capacity),
            obstacles: Registry::with_capacity(capacity),
            items: Registry::with_capacity(capacity),
            projectiles: Registry::with_capacity(capacity),
            hits: HitDispatcher::with_capacity(capacity),
            protocol: LockProtocol::new(RESOLVE_ROUNDS),
            query_scratch: Vec::with_capacity(capacity * 2),
            frame: 0,
            last_stats: FrameStats::default(),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register a tank; returns `false` if it was already registered
    pub fn register_tank(&mut self, entity: Entity, collider: ColliderBox) -> bool {
        self.register_dynamic(BodyCategory::Tank, entity, collider)
    }

    /// Unregister a tank; returns `false` if it was not registered
    pub fn unregister_tank(&mut self, entity: Entity) -> bool {
        self.unregister(BodyCategory::Tank, entity)
    }

    /// Register an obstacle at a fixed pose
    pub fn register_obstacle(&mut self, entity: Entity, pose: &Pose, collider: ColliderBox) -> bool {
        self.register_static(BodyCategory::Obstacle, entity, pose, collider)
    }

    /// Unregister an obstacle
    pub fn unregister_obstacle(&mut self, entity: Entity) -> bool {
        self.unregister(BodyCategory::Obstacle, entity)
    }

    /// Register a pickup at a fixed pose
    pub fn register_item(&mut self, entity: Entity, pose: &Pose, collider: ColliderBox) -> bool {
        self.register_static(BodyCategory::Item, entity, pose, collider)
    }

    /// Unregister a pickup
    pub fn unregister_item(&mut self, entity: Entity) -> bool {
        self.unregister(BodyCategory::Item, entity)
    }

    /// Register a projectile
    pub fn register_projectile(&mut self, entity: Entity, collider: ColliderBox) -> bool {
        self.register_dynamic(BodyCategory::Projectile, entity, collider)
    }

    /// Unregister a projectile
    pub fn unregister_projectile(&mut self, entity: Entity) -> bool {
        self.unregister(BodyCategory::Projectile, entity)
    }

    /// Move a registered static body (obstacle or item) to a new pose
    pub fn reposition_static(&mut self, category: BodyCategory, entity: Entity, pose: &Pose) -> bool {
        if !category.is_static() {
            return false;
        }
        let Some(key) = self.registry(category).get(entity) else {
            return false;
        };
        match self.contexts.get_mut(key) {
            Some(ctx) => {
                ctx.reposition_static(pose);
                true
            }
            None => false,
        }
    }

    fn register_dynamic(&mut self, category: BodyCategory, entity: Entity, collider: ColliderBox) -> bool {
        debug_assert!(category.is_mover());
        if self.registry(category).contains(entity) {
            return false;
        }
        let key = self.contexts.insert(CollisionContext::new_dynamic(entity, category, collider));
        self.registry_mut(category).insert(entity, key);
        log::debug!("Registered {category} {entity}");
        true
    }

    fn register_static(
        &mut self,
        category: BodyCategory,
        entity: Entity,
        pose: &Pose,
        collider: ColliderBox,
    ) -> bool {
        debug_assert!(category.is_static());
        if self.registry(category).contains(entity) {
            return false;
        }
        let key = self
            .contexts
            .insert(CollisionContext::new_static(entity, category, pose, collider));
        self.registry_mut(category).insert(entity, key);
        log::debug!("Registered {category} {entity}");
        true
    }

    fn unregister(&mut self, category: BodyCategory, entity: Entity) -> bool {
        match self.registry_mut(category).remove(entity) {
            Some(key) => {
                self.contexts.remove(key);
                log::debug!("Unregistered {category} {entity}");
                true
            }
            None => false,
        }
    }

    /// Drop every registration; handlers stay subscribed
    pub fn clear(&mut self) {
        for category in BodyCategory::ALL {
            self.registry_mut(category).clear();
        }
        self.contexts.clear();
        self.hits.begin_frame();
        log::info!("Collision manager cleared");
    }

    fn registry(&self, category: BodyCategory) -> &Registry<Entity, ContextKey> {
        match category {
            BodyCategory::Tank => &self.tanks,
            BodyCategory::Obstacle => &self.obstacles,
            BodyCategory::Item => &self.items,
            BodyCategory::Projectile => &self.projectiles,
        }
    }

    fn registry_mut(&mut self, category: BodyCategory) -> &mut Registry<Entity, ContextKey> {
        match category {
            BodyCategory::Tank => &mut self.tanks,
            BodyCategory::Obstacle => &mut self.obstacles,
            BodyCategory::Item => &mut self.items,
            BodyCategory::Projectile => &mut self.projectiles,
        }
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    /// Check whether `entity` is registered under `category`
    pub fn is_registered(&self, category: BodyCategory, entity: Entity) -> bool {
        self.registry(category).contains(entity)
    }

    /// Number of bodies registered under `category`
    pub fn len(&self, category: BodyCategory) -> usize {
        self.registry(category).len()
    }

    /// True when nothing at all is registered
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Context of `entity` in `category`, if registered
    pub fn context(&self, category: BodyCategory, entity: Entity) -> Option<&CollisionContext> {
        let key = self.registry(category).get(entity)?;
        self.contexts.get(key)
    }

    /// Context by key, e.g. one carried in a [`HitEvent`]
    pub fn context_by_key(&self, key: ContextKey) -> Option<&CollisionContext> {
        self.contexts.get(key)
    }

    /// Finalized lock bits of a tank
    pub fn lock_axis(&self, entity: Entity) -> Option<MovementLockAxis> {
        self.context(BodyCategory::Tank, entity).map(CollisionContext::lock_axis)
    }

    /// Where the lock protocol stopped in the last frame
    pub fn lock_phase(&self) -> LockPhase {
        self.protocol.phase()
    }

    /// Frames run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Counters of the last frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    // ---------------------------------------------------------------------
    // Hits
    // ---------------------------------------------------------------------

    /// Subscribe to hit events
    pub fn subscribe(&mut self, handler: Box<dyn HitHandler>) -> HandlerId {
        self.hits.register_handler(handler)
    }

    /// Unsubscribe a handler
    pub fn unsubscribe(&mut self, id: HandlerId) -> bool {
        self.hits.unregister_handler(id)
    }

    /// Hits raised during the last frame
    pub fn frame_hits(&self) -> &[HitEvent] {
        self.hits.frame_hits()
    }

    // ---------------------------------------------------------------------
    // Frame pipeline
    // ---------------------------------------------------------------------

    /// Run one frame of detection and resolution
    pub fn update<P: BodyProvider + ?Sized>(&mut self, provider: &mut P) -> FrameStats {
        self.frame += 1;
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        self.hits.begin_frame();
        self.refresh_snapshots();

        let Self {
            config,
            distributor,
            contexts,
            tanks,
            obstacles,
            items,
            projectiles,
            hits,
            protocol,
            ..
        } = self;

        let tanks = tanks.cached();
        let obstacles = obstacles.cached();
        let items = items.cached();
        let projectiles = projectiles.cached();

        // 1. Begin frame
        for &key in tanks.iter().chain(projectiles.iter()) {
            if let Some(ctx) = contexts.get_mut(key) {
                ctx.begin_frame(&*provider);
            }
        }
        protocol.begin_frame();

        let mut env = ServiceEnv {
            contexts,
            provider,
            distributor,
            config,
            hits,
            stats: &mut stats,
        };

        // 2. Bounded relaxation
        for round in 0..RESOLVE_ROUNDS {
            CollisionService::pre_update(ServiceKind::MoverStatic, tanks, obstacles).execute(&mut env);
            protocol.static_pass_done();

            finalize_lock_axis(tanks, env.contexts);
            protocol.finalized();

            CollisionService::pre_update(ServiceKind::MoverMover, tanks, tanks).execute(&mut env);
            protocol.dynamic_pass_done();

            log::trace!("Frame {} round {} settled", env.stats.frame, round);
        }
        debug_assert!(protocol.is_complete());

        // 3. Trigger passes
        CollisionService::pre_update(ServiceKind::MoverPickup, tanks, items).execute(&mut env);
        CollisionService::pre_update(ServiceKind::ProjectileStatic, projectiles, obstacles)
            .execute(&mut env);
        CollisionService::pre_update(ServiceKind::ProjectileMover, projectiles, tanks).execute(&mut env);

        // 4. Hits
        env.hits.dispatch();

        log::debug!(
            "Frame {}: {} pairs tested, {} overlapping, {} resolved, {} skipped, {} hits",
            stats.frame,
            stats.pairs_tested,
            stats.pairs_overlapping,
            stats.pairs_resolved,
            stats.pairs_skipped,
            stats.hits
        );
        self.last_stats = stats;
        stats
    }

    fn refresh_snapshots(&mut self) {
        for category in BodyCategory::ALL {
            self.registry_mut(category).snapshot();
        }
    }

    // ---------------------------------------------------------------------
    // Spatial query
    // ---------------------------------------------------------------------

    /// Every registered body whose OBB overlaps a horizontal circle
    ///
    /// Intended for area effects outside the frame pipeline; callers filter
    /// by [`CollisionContext::category`] for what they affect. Dynamic OBBs
    /// are as of the end of the last frame and movers without a pose that
    /// frame are left out. Movers come first (tanks, then projectiles),
    /// followed by statics (obstacles, then items), each in registration
    /// order.
    pub fn get_overlapping_circle_horizontal(&mut self, center: Vec3, radius: f32) -> Vec<&CollisionContext> {
        let Self {
            tanks,
            projectiles,
            obstacles,
            items,
            query_scratch,
            ..
        } = self;

        query_scratch.clear();
        for registry in [tanks, projectiles, obstacles, items] {
            query_scratch.extend_from_slice(registry.snapshot());
        }

        let contexts = &self.contexts;
        self.query_scratch
            .iter()
            .filter_map(|&key| contexts.get(key))
            .filter(|ctx| ctx.is_active() && overlaps_circle_horizontal(ctx.obb(), center, radius))
            .collect()
    }
}

fn finalize_lock_axis(keys: &[ContextKey], contexts: &mut SlotMap<ContextKey, CollisionContext>) {
    for &key in keys {
        if let Some(ctx) = contexts.get_mut(key) {
            ctx.finalize_lock_axis();
        }
    }
}
