//! Resolve distribution: who moves, and by how much
//!
//! Given the minimum translation vector between two boxes, decide per world
//! axis which body absorbs the push. Locks win first; otherwise the body that
//! advanced less this step yields, so a tank driving into another is not
//! shoved back against its own motion.

use crate::config::CollisionConfig;
use crate::foundation::math::Vec3;
use crate::physics::context::CollisionContext;
use crate::physics::lock_axis::{MovementLockAxis, PlaneAxis};
use crate::physics::sat::{try_calculate_mtv, Mtv};

/// Displacement applied to one body as the result of one pairwise resolution
///
/// Stored as a raw vector rather than direction plus length so that a push
/// floored to the resolve epsilon survives unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolveInfo {
    /// World-space displacement, Y always zero
    pub displacement: Vec3,
}

impl ResolveInfo {
    /// No displacement
    pub fn zero() -> Self {
        Self {
            displacement: Vec3::zeros(),
        }
    }

    /// True when nothing needs to move
    pub fn is_zero(&self) -> bool {
        self.displacement == Vec3::zeros()
    }

    /// Length of the displacement
    pub fn magnitude(&self) -> f32 {
        self.displacement.norm()
    }
}

/// What the resolver needs to know about one side of a pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveBody {
    /// Finalized lock bits
    pub lock: MovementLockAxis,

    /// Signed advance along the body's own forward axis this step
    pub forward_delta: f32,
}

impl ResolveBody {
    /// Body with the given lock and forward delta
    pub const fn new(lock: MovementLockAxis, forward_delta: f32) -> Self {
        Self {
            lock,
            forward_delta,
        }
    }

    /// Static obstacle: fully locked, never moves
    pub const fn immovable() -> Self {
        Self::new(MovementLockAxis::ALL, 0.0)
    }
}

/// Result of distributing one MTV between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolveOutcome {
    /// Displacement for A
    pub a: ResolveInfo,
    /// Displacement for B
    pub b: ResolveInfo,
    /// Axes A was pushed on, to fold into A's pending lock bits
    ///
    /// B's lock bits are never touched by a resolution.
    pub pushed_a: MovementLockAxis,
}

impl ResolveOutcome {
    /// Outcome with no displacement on either side
    pub fn none() -> Self {
        Self::default()
    }

    /// True when neither body moves
    pub fn is_noop(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Yielder {
    A,
    B,
    Neither,
}

/// Decide which of two free bodies absorbs the push on an axis
///
/// Both moved: the one with the smaller absolute advance yields, A on an
/// exact tie. One moved: the stationary one yields. Neither moved: nobody.
fn yielder(delta_a: f32, delta_b: f32) -> Yielder {
    let moved_a = delta_a != 0.0;
    let moved_b = delta_b != 0.0;
    match (moved_a, moved_b) {
        (true, true) => {
            if delta_a.abs() <= delta_b.abs() {
                Yielder::A
            } else {
                Yielder::B
            }
        }
        (true, false) => Yielder::B,
        (false, true) => Yielder::A,
        (false, false) => Yielder::Neither,
    }
}

/// Splits minimum translation vectors into per-body displacements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveDistributor {
    epsilon: f32,
    lock_threshold: f32,
}

impl Default for ResolveDistributor {
    fn default() -> Self {
        Self::from_config(&CollisionConfig::default())
    }
}

impl ResolveDistributor {
    /// Distributor with an explicit epsilon floor and lock threshold
    pub const fn new(epsilon: f32, lock_threshold: f32) -> Self {
        Self {
            epsilon,
            lock_threshold,
        }
    }

    /// Distributor using the thresholds from `config`
    pub fn from_config(config: &CollisionConfig) -> Self {
        Self::new(config.resolve_epsilon, config.degenerate_epsilon)
    }

    /// Smallest non-zero displacement this distributor produces
    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Distribute `mtv` between A and B
    ///
    /// X and Z are decided independently, so a body can be free on one axis
    /// and blocked on the other.
    pub fn distribute(&self, mtv: &Mtv, a: ResolveBody, b: ResolveBody) -> ResolveOutcome {
        let mut disp_a = Vec3::zeros();
        let mut disp_b = Vec3::zeros();

        for axis in PlaneAxis::BOTH {
            let push = axis.component(&mtv.axis) * mtv.overlap;
            if push == 0.0 {
                continue;
            }

            if a.lock.blocks(axis) {
                if b.lock != MovementLockAxis::ALL {
                    axis.set_component(&mut disp_b, -push);
                }
            } else if b.lock.blocks(axis) {
                axis.set_component(&mut disp_a, push);
            } else {
                match yielder(a.forward_delta, b.forward_delta) {
                    Yielder::A => axis.set_component(&mut disp_a, push),
                    Yielder::B => axis.set_component(&mut disp_b, -push),
                    Yielder::Neither => {}
                }
            }
        }

        let disp_a = self.apply_epsilon_floor(disp_a);
        let disp_b = self.apply_epsilon_floor(disp_b);

        ResolveOutcome {
            a: ResolveInfo { displacement: disp_a },
            b: ResolveInfo { displacement: disp_b },
            pushed_a: MovementLockAxis::from_displacement(&disp_a, self.lock_threshold),
        }
    }

    /// Resolve two contexts directly from their current OBBs and locks
    ///
    /// Both OBBs must already be refreshed for this pass. Non-penetrating
    /// pairs come back as [`ResolveOutcome::none`].
    pub fn calculate_resolve_info(
        &self,
        ctx_a: &CollisionContext,
        ctx_b: &CollisionContext,
        delta_forward_a: f32,
        delta_forward_b: f32,
    ) -> ResolveOutcome {
        match try_calculate_mtv(ctx_a.obb(), ctx_b.obb()) {
            Some(mtv) => self.distribute(
                &mtv,
                ResolveBody::new(ctx_a.lock_axis(), delta_forward_a),
                ResolveBody::new(ctx_b.lock_axis(), delta_forward_b),
            ),
            None => ResolveOutcome::none(),
        }
    }

    /// Lift a non-zero displacement shorter than epsilon up to epsilon
    ///
    /// Keeps bodies from settling into a sub-epsilon overlap that floating
    /// point noise flips back and forth every frame. An exact zero stays zero.
    // TODO: compare against the pass's overlap; repeated tiny overlaps can
    // keep a pair from ever reaching exactly zero penetration.
    fn apply_epsilon_floor(&self, displacement: Vec3) -> Vec3 {
        let length = displacement.norm();
        if length > 0.0 && length < self.epsilon {
            displacement * (self.epsilon / length)
        } else {
            displacement
        }
    }
}
