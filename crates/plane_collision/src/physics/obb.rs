//! Oriented bounding boxes on the ground plane
//!
//! An [`Obb`] is a value: centre, half-extents and a (yaw-only) rotation. It
//! holds no reference back to whatever owns it. Static bodies build theirs
//! once at registration; dynamic bodies rebuild theirs from a fresh [`Pose`]
//! every frame.

use crate::foundation::math::{horizontal, local_forward, local_right, Pose, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local box declared by an entity: offset from its pivot plus full size
///
/// This mirrors a box collider attached to a game object. The same collider
/// is reused every time the owner's OBB is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderBox {
    /// Offset of the box centre from the owner's pivot, in local space
    pub center: Vec3,

    /// Full edge lengths along local X, Y and Z
    pub size: Vec3,
}

impl ColliderBox {
    /// Box centred on the pivot
    pub fn new(size: Vec3) -> Self {
        Self {
            center: Vec3::zeros(),
            size,
        }
    }

    /// Box with a local offset
    pub fn with_offset(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Half of `size`, made non-negative
    pub fn half_extent(&self) -> Vec3 {
        self.size.abs() * 0.5
    }
}

/// Oriented bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    center: Vec3,
    half_extent: Vec3,
    rotation: Quat,
}

impl Obb {
    /// Create an OBB from world centre, half-extents and rotation
    ///
    /// Negative half-extents are folded to their absolute value.
    pub fn new(center: Vec3, half_extent: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            half_extent: half_extent.abs(),
            rotation,
        }
    }

    /// Axis-aligned OBB (identity rotation)
    pub fn axis_aligned(center: Vec3, half_extent: Vec3) -> Self {
        Self::new(center, half_extent, Quat::identity())
    }

    /// World OBB for `collider` attached to an owner at `pose`
    pub fn from_pose(pose: &Pose, collider: &ColliderBox) -> Self {
        Self::new(
            pose.transform_point(collider.center),
            collider.half_extent(),
            pose.rotation,
        )
    }

    /// World-space centre
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Non-negative half-extents along the local axes
    pub fn half_extent(&self) -> Vec3 {
        self.half_extent
    }

    /// Rotation of the box
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local right axis in world space, vertical component discarded
    pub fn right(&self) -> Vec3 {
        horizontal(self.rotation * local_right())
    }

    /// Local forward axis in world space, vertical component discarded
    pub fn forward(&self) -> Vec3 {
        horizontal(self.rotation * local_forward())
    }

    /// Half-length of this box's shadow on `axis`
    ///
    /// Only the two horizontal local axes contribute. `axis` does not have to
    /// be unit length; the result scales with it.
    pub fn projected_radius(&self, axis: &Vec3) -> f32 {
        (self.right() * self.half_extent.x).dot(axis).abs()
            + (self.forward() * self.half_extent.z).dot(axis).abs()
    }

    /// The four footprint corners on the box's own height
    ///
    /// Order: (+x,+z), (+x,-z), (-x,-z), (-x,+z), i.e. clockwise seen from
    /// above.
    pub fn corners(&self) -> [Vec3; 4] {
        let right = self.right() * self.half_extent.x;
        let forward = self.forward() * self.half_extent.z;
        [
            self.center + right + forward,
            self.center + right - forward,
            self.center - right - forward,
            self.center - right + forward,
        ]
    }

    /// Footprint area on the plane
    pub fn footprint_area(&self) -> f32 {
        4.0 * self.half_extent.x * self.half_extent.z
    }

    /// True when the footprint has (near) zero area or the data is not finite
    pub fn is_degenerate(&self, epsilon: f32) -> bool {
        let finite = self.center.iter().all(|c| c.is_finite())
            && self.half_extent.iter().all(|c| c.is_finite());
        !finite || self.half_extent.x <= epsilon || self.half_extent.z <= epsilon
    }

    /// Move the box by a world-space displacement
    pub fn translate(&mut self, displacement: Vec3) {
        self.center += displacement;
    }

    /// Copy of the box moved by `displacement`
    pub fn translated(&self, displacement: Vec3) -> Self {
        let mut moved = *self;
        moved.translate(displacement);
        moved
    }
}
