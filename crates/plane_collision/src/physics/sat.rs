//! Separating-axis tests restricted to the ground plane
//!
//! Both boxes share the world up axis and never tilt, so every edge-edge
//! cross product of the general 3D test is either vertical or parallel to a
//! face axis already on the list. Four candidate axes are enough: each box's
//! local right and forward, flattened onto the plane.

use crate::foundation::math::{horizontal, Vec3};
use crate::physics::obb::Obb;

/// Squared length under which a candidate axis is treated as missing
const AXIS_EPSILON_SQ: f32 = 1e-12;

/// Minimum translation vector between two overlapping boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mtv {
    /// Unit axis on the plane, pointing from B's centre towards A's
    pub axis: Vec3,

    /// Penetration depth along `axis`, always positive
    pub overlap: f32,
}

impl Mtv {
    /// Displacement that would push A clear of B on its own
    pub fn push_a(&self) -> Vec3 {
        self.axis * self.overlap
    }
}

/// The four candidate axes: A's right and forward, then B's
pub fn candidate_axes(a: &Obb, b: &Obb) -> [Vec3; 4] {
    [a.right(), a.forward(), b.right(), b.forward()]
}

/// Horizontal SAT overlap test
///
/// Returns at the first separating axis, i.e. one where the projected centre
/// distance exceeds the summed radii. Boxes that only touch therefore collide
/// here, while [`try_calculate_mtv`] finds no penetration for them.
pub fn is_colliding(a: &Obb, b: &Obb) -> bool {
    let delta = horizontal(b.center() - a.center());

    for axis in candidate_axes(a, b) {
        if axis.norm_squared() <= AXIS_EPSILON_SQ {
            continue;
        }
        let distance = delta.dot(&axis).abs();
        if distance > a.projected_radius(&axis) + b.projected_radius(&axis) {
            return false;
        }
    }

    true
}

/// Axis of least penetration and its depth, or `None` if the boxes do not
/// overlap
///
/// Runs over the same four axes as [`is_colliding`], normalised. The chosen
/// axis is flipped to point from B towards A so that `+axis * overlap` always
/// pushes A away from B. Also returns `None` when every candidate axis is
/// degenerate.
pub fn try_calculate_mtv(a: &Obb, b: &Obb) -> Option<Mtv> {
    let delta = horizontal(a.center() - b.center());
    let mut best: Option<Mtv> = None;

    for axis in candidate_axes(a, b) {
        let length_sq = axis.norm_squared();
        if length_sq <= AXIS_EPSILON_SQ {
            continue;
        }
        let axis = axis / length_sq.sqrt();

        let overlap =
            a.projected_radius(&axis) + b.projected_radius(&axis) - delta.dot(&axis).abs();
        if overlap <= 0.0 {
            return None;
        }

        if best.map_or(true, |current| overlap < current.overlap) {
            best = Some(Mtv { axis, overlap });
        }
    }

    let mut mtv = best?;
    if delta.dot(&mtv.axis) < 0.0 {
        mtv.axis = -mtv.axis;
    }
    Some(mtv)
}

/// Circle-versus-box overlap on the plane
///
/// Projects the box onto the line joining its centre to the circle's centre
/// and compares the centre distance with the circle radius plus the box's
/// projected half-length. A circle centred inside the box always overlaps.
pub fn overlaps_circle_horizontal(obb: &Obb, center: Vec3, radius: f32) -> bool {
    let delta = horizontal(center - obb.center());
    let distance_sq = delta.norm_squared();
    if distance_sq <= AXIS_EPSILON_SQ {
        return radius >= 0.0;
    }

    let distance = distance_sq.sqrt();
    let axis = delta / distance;
    distance <= radius + obb.projected_radius(&axis)
}
