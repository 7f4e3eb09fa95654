//! Pairwise collision services
//!
//! A service walks the pairs of two flat context arrays, runs the SAT early
//! out, the MTV search and (for resolving kinds) the resolve distributor,
//! applies the resulting displacements and queues a hit per overlapping
//! pair. The set of services is closed: each kind is one category pairing
//! of the frame pipeline, picked by tag rather than by probing types.

use crate::config::CollisionConfig;
use crate::events::{HitDispatcher, HitEvent};
use crate::foundation::collections::SlotMap;
use crate::physics::body::BodyProvider;
use crate::physics::context::{CollisionContext, ContextKey};
use crate::physics::lock_axis::MovementLockAxis;
use crate::physics::resolve::{ResolveDistributor, ResolveInfo, ResolveOutcome};
use crate::physics::sat::{is_colliding, try_calculate_mtv};
use std::fmt;

/// How pairs are drawn from the two arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Every `(a, b)` of `A x B`
    CrossProduct,
    /// `(a[i], a[j])` with `i < j`; the second array is ignored
    UpperTriangle,
}

/// Closed set of category pairings run by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Tanks against obstacles; resolving
    MoverStatic,
    /// Tanks against tanks; resolving
    MoverMover,
    /// Tanks against pickups; trigger only
    MoverPickup,
    /// Projectiles against obstacles; trigger only
    ProjectileStatic,
    /// Projectiles against tanks; trigger only
    ProjectileMover,
}

impl ServiceKind {
    /// Pair iteration pattern
    pub const fn pairing(self) -> Pairing {
        match self {
            Self::MoverMover => Pairing::UpperTriangle,
            _ => Pairing::CrossProduct,
        }
    }

    /// Whether overlaps are separated or only reported
    pub const fn resolves(self) -> bool {
        matches!(self, Self::MoverStatic | Self::MoverMover)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MoverStatic => "mover-static",
            Self::MoverMover => "mover-mover",
            Self::MoverPickup => "mover-pickup",
            Self::ProjectileStatic => "projectile-static",
            Self::ProjectileMover => "projectile-mover",
        };
        f.write_str(name)
    }
}

/// Counters accumulated over one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number
    pub frame: u64,
    /// Pairs considered by any service
    pub pairs_tested: u32,
    /// Pairs that passed the SAT test
    pub pairs_overlapping: u32,
    /// Pairs where at least one body was moved
    pub pairs_resolved: u32,
    /// Pairs dropped without a push: degenerate geometry, coincident
    /// centres, or boxes that only touch
    pub pairs_skipped: u32,
    /// Hits queued
    pub hits: u32,
}

/// Everything a service touches while executing
pub struct ServiceEnv<'a, P: BodyProvider + ?Sized> {
    /// Context arena
    pub contexts: &'a mut SlotMap<ContextKey, CollisionContext>,
    /// Pose source and displacement sink
    pub provider: &'a mut P,
    /// Displacement policy
    pub distributor: &'a ResolveDistributor,
    /// Thresholds and diagnostics switches
    pub config: &'a CollisionConfig,
    /// Hit queue
    pub hits: &'a mut HitDispatcher,
    /// Frame counters
    pub stats: &'a mut FrameStats,
}

/// One configured pass over two context arrays
#[derive(Debug, Clone, Copy)]
pub struct CollisionService<'a> {
    kind: ServiceKind,
    a: &'a [ContextKey],
    b: &'a [ContextKey],
}

impl<'a> CollisionService<'a> {
    /// Cache the arrays for this call
    ///
    /// For [`ServiceKind::MoverMover`] both arrays are expected to be the
    /// same; only `a` is walked.
    pub fn pre_update(kind: ServiceKind, a: &'a [ContextKey], b: &'a [ContextKey]) -> Self {
        Self { kind, a, b }
    }

    /// Service kind
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Number of candidate pairs this service will visit
    pub fn pair_count(&self) -> usize {
        match self.kind.pairing() {
            Pairing::CrossProduct => self.a.len() * self.b.len(),
            Pairing::UpperTriangle => self.a.len() * self.a.len().saturating_sub(1) / 2,
        }
    }

    /// Run the pass
    ///
    /// Dynamic OBBs on both sides are refreshed from the provider first.
    /// Empty arrays are a no-op.
    pub fn execute<P: BodyProvider + ?Sized>(&self, env: &mut ServiceEnv<'_, P>) {
        if self.a.is_empty() || (self.kind.pairing() == Pairing::CrossProduct && self.b.is_empty()) {
            return;
        }

        refresh(self.a, env);
        if self.kind.pairing() == Pairing::CrossProduct {
            refresh(self.b, env);
        }

        match self.kind.pairing() {
            Pairing::CrossProduct => {
                for &key_a in self.a {
                    for &key_b in self.b {
                        self.process_pair(key_a, key_b, env);
                    }
                }
            }
            Pairing::UpperTriangle => {
                for (i, &key_a) in self.a.iter().enumerate() {
                    for &key_b in &self.a[i + 1..] {
                        self.process_pair(key_a, key_b, env);
                    }
                }
            }
        }
    }

    fn process_pair<P: BodyProvider + ?Sized>(
        &self,
        key_a: ContextKey,
        key_b: ContextKey,
        env: &mut ServiceEnv<'_, P>,
    ) {
        if key_a == key_b {
            return;
        }
        let (Some(ctx_a), Some(ctx_b)) = (env.contexts.get(key_a), env.contexts.get(key_b)) else {
            return;
        };
        if !ctx_a.is_active() || !ctx_b.is_active() {
            return;
        }
        env.stats.pairs_tested += 1;

        let epsilon = env.config.degenerate_epsilon;
        if ctx_a.obb().is_degenerate(epsilon) || ctx_b.obb().is_degenerate(epsilon) {
            env.stats.pairs_skipped += 1;
            log::trace!("{}: skipping degenerate pair {} / {}", self.kind, ctx_a.entity(), ctx_b.entity());
            return;
        }

        if !is_colliding(ctx_a.obb(), ctx_b.obb()) {
            return;
        }
        env.stats.pairs_overlapping += 1;

        if ctx_a.center_offset(ctx_b).norm_squared() <= epsilon * epsilon {
            env.stats.pairs_skipped += 1;
            log::trace!("{}: skipping coincident pair {} / {}", self.kind, ctx_a.entity(), ctx_b.entity());
            return;
        }

        let Some(mtv) = try_calculate_mtv(ctx_a.obb(), ctx_b.obb()) else {
            env.stats.pairs_skipped += 1;
            return;
        };

        let outcome = if self.kind.resolves() {
            env.distributor.distribute(&mtv, ctx_a.resolve_body(), ctx_b.resolve_body())
        } else {
            ResolveOutcome::none()
        };

        let mut hit = HitEvent {
            frame: env.stats.frame,
            service: self.kind,
            entity_a: ctx_a.entity(),
            category_a: ctx_a.category(),
            context_a: key_a,
            entity_b: ctx_b.entity(),
            category_b: ctx_b.category(),
            context_b: key_b,
            mtv,
            resolve_a: ResolveInfo::zero(),
            resolve_b: ResolveInfo::zero(),
        };

        if !outcome.is_noop() {
            apply(key_a, &outcome.a, outcome.pushed_a, env);
            apply(key_b, &outcome.b, MovementLockAxis::NONE, env);
            hit.resolve_a = outcome.a;
            hit.resolve_b = outcome.b;
            env.stats.pairs_resolved += 1;

            if env.config.trace_pairs {
                log::trace!(
                    "{}: {} {:?} / {} {:?} overlap {:.4}",
                    self.kind,
                    hit.entity_a,
                    outcome.a.displacement,
                    hit.entity_b,
                    outcome.b.displacement,
                    mtv.overlap
                );
            }
        }

        env.hits.send(hit);
        env.stats.hits += 1;
    }
}

fn refresh<P: BodyProvider + ?Sized>(keys: &[ContextKey], env: &mut ServiceEnv<'_, P>) {
    for &key in keys {
        if let Some(ctx) = env.contexts.get_mut(key) {
            ctx.update_obb(&*env.provider);
        }
    }
}

fn apply<P: BodyProvider + ?Sized>(
    key: ContextKey,
    info: &ResolveInfo,
    pushed: MovementLockAxis,
    env: &mut ServiceEnv<'_, P>,
) {
    if let Some(ctx) = env.contexts.get_mut(key) {
        ctx.apply_resolve(info, &mut *env.provider);
        ctx.record_push(pushed);
    }
}
