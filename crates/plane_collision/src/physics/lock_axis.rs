//! Movement locks and the per-frame finalize protocol
//!
//! A mover that gets pushed during a resolution pass records which world
//! axes it was pushed on. Those bits stay *pending* until the pipeline
//! finalizes them; only finalized bits are read by the resolver. This keeps a
//! pass from reacting to its own pushes half-way through the pair loop.

use crate::foundation::math::Vec3;

bitflags::bitflags! {
    /// Plane axes a body is currently blocked on
    ///
    /// `ALL` marks a body that must never be pushed: static obstacles carry
    /// it permanently.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MovementLockAxis: u8 {
        /// Blocked along world X
        const X = 1 << 0;
        /// Blocked along world Z
        const Z = 1 << 1;
        /// Blocked on the whole plane
        const ALL = Self::X.bits() | Self::Z.bits();
    }
}

impl MovementLockAxis {
    /// No axis blocked
    pub const NONE: Self = Self::empty();

    /// Axes along which `displacement` moves by more than `threshold`
    pub fn from_displacement(displacement: &Vec3, threshold: f32) -> Self {
        let mut axes = Self::NONE;
        if displacement.x.abs() > threshold {
            axes |= Self::X;
        }
        if displacement.z.abs() > threshold {
            axes |= Self::Z;
        }
        axes
    }

    /// True when this mask blocks `axis`
    pub fn blocks(self, axis: PlaneAxis) -> bool {
        self.contains(axis.lock_bit())
    }
}

/// One of the two horizontal world axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneAxis {
    /// World X
    X,
    /// World Z
    Z,
}

impl PlaneAxis {
    /// Both plane axes, X first
    pub const BOTH: [Self; 2] = [Self::X, Self::Z];

    /// Lock bit for this axis
    pub const fn lock_bit(self) -> MovementLockAxis {
        match self {
            Self::X => MovementLockAxis::X,
            Self::Z => MovementLockAxis::Z,
        }
    }

    /// Component of `v` along this axis
    pub fn component(self, v: &Vec3) -> f32 {
        match self {
            Self::X => v.x,
            Self::Z => v.z,
        }
    }

    /// Write `value` into this axis' component of `v`
    pub fn set_component(self, v: &mut Vec3, value: f32) {
        match self {
            Self::X => v.x = value,
            Self::Z => v.z = value,
        }
    }
}

/// Lock bits of a single collision context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockState {
    committed: MovementLockAxis,
    pending: MovementLockAxis,
    fixed: bool,
}

impl LockState {
    /// Lock state of a mover: starts free, changes during the frame
    pub const fn free() -> Self {
        Self {
            committed: MovementLockAxis::NONE,
            pending: MovementLockAxis::NONE,
            fixed: false,
        }
    }

    /// Lock state of a static body: `ALL`, never changes
    pub const fn immovable() -> Self {
        Self {
            committed: MovementLockAxis::ALL,
            pending: MovementLockAxis::NONE,
            fixed: true,
        }
    }

    /// Bits the resolver reads this pass
    pub const fn current(&self) -> MovementLockAxis {
        self.committed
    }

    /// Bits recorded since the last finalize
    pub const fn pending(&self) -> MovementLockAxis {
        self.pending
    }

    /// True for static bodies
    pub const fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Fold the axes of a push into the pending bits
    pub fn record(&mut self, pushed: MovementLockAxis) {
        if !self.fixed {
            self.pending |= pushed;
        }
    }

    /// Commit pending bits so later passes see them
    pub fn finalize(&mut self) {
        if !self.fixed {
            self.committed |= self.pending;
            self.pending = MovementLockAxis::NONE;
        }
    }

    /// Start-of-frame reset
    pub fn reset(&mut self) {
        if !self.fixed {
            self.committed = MovementLockAxis::NONE;
            self.pending = MovementLockAxis::NONE;
        }
    }
}

/// Where the frame pipeline is in the lock protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    /// Before the first resolution of the frame; all mover locks cleared
    Cleared,
    /// Movers were resolved against statics in `round`
    ResolvedStatic {
        /// Zero-based round index
        round: usize,
    },
    /// Locks of `round` have been committed
    Finalized {
        /// Zero-based round index
        round: usize,
    },
    /// Movers were resolved against each other in `round`
    ResolvedDynamic {
        /// Zero-based round index
        round: usize,
    },
}

/// Tracks the fixed resolve -> finalize -> resolve order within one frame
///
/// The manager drives it; out-of-order transitions are programming errors
/// and are caught in debug builds.
#[derive(Debug, Clone, Copy)]
pub struct LockProtocol {
    phase: LockPhase,
    rounds: usize,
}

impl LockProtocol {
    /// Protocol for a frame of `rounds` rounds
    pub const fn new(rounds: usize) -> Self {
        Self {
            phase: LockPhase::Cleared,
            rounds,
        }
    }

    /// Current phase
    pub const fn phase(&self) -> LockPhase {
        self.phase
    }

    /// True once every round has run its mover-vs-mover pass
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, LockPhase::ResolvedDynamic { round } if round + 1 == self.rounds)
    }

    /// Reset for a new frame
    pub fn begin_frame(&mut self) {
        self.phase = LockPhase::Cleared;
    }

    /// A mover-vs-static pass finished
    pub fn static_pass_done(&mut self) {
        let round = match self.phase {
            LockPhase::Cleared => 0,
            LockPhase::ResolvedDynamic { round } => round + 1,
            other => {
                debug_assert!(false, "static pass out of order after {other:?}");
                return;
            }
        };
        debug_assert!(round < self.rounds, "more static passes than rounds");
        self.phase = LockPhase::ResolvedStatic { round };
    }

    /// Pending locks were finalized
    pub fn finalized(&mut self) {
        match self.phase {
            LockPhase::ResolvedStatic { round } => self.phase = LockPhase::Finalized { round },
            other => debug_assert!(false, "finalize out of order after {other:?}"),
        }
    }

    /// A mover-vs-mover pass finished
    pub fn dynamic_pass_done(&mut self) {
        match self.phase {
            LockPhase::Finalized { round } => self.phase = LockPhase::ResolvedDynamic { round },
            other => debug_assert!(false, "mover pass out of order after {other:?}"),
        }
    }
}
