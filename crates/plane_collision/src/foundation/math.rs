//! Math utilities and types
//!
//! Provides the vector and rotation types the collision core works in.
//! World space is Y-up and right-handed; bodies only ever rotate about +Y,
//! so local `+X` is "right" and local `+Z` is "forward".

pub use nalgebra::{Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi as f32
    pub const PI: f32 = std::f32::consts::PI;
    /// Half of pi as f32
    pub const FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2;
}

/// Local right axis (+X)
pub fn local_right() -> Vec3 {
    Vec3::new(1.0, 0.0, 0.0)
}

/// Local forward axis (+Z)
pub fn local_forward() -> Vec3 {
    Vec3::new(0.0, 0.0, 1.0)
}

/// Drop the vertical component of a vector
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Rotation of `radians` about the world up axis
pub fn yaw_rotation(radians: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), radians)
}

/// World pose of a collidable body: position plus (yaw-only) rotation
///
/// This is what a pose provider hands to the collision core every time a
/// dynamic OBB is refreshed. Scale is deliberately absent: collider sizes are
/// declared in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in world space
    pub position: Vec3,

    /// Rotation quaternion (expected to be a pure yaw)
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Pose {
    /// Create a new identity pose
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a pose with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a pose with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create a pose from a position and a heading about +Y
    pub fn from_position_yaw(position: Vec3, yaw_radians: f32) -> Self {
        Self {
            position,
            rotation: yaw_rotation(yaw_radians),
        }
    }

    /// Heading about +Y in radians, measured from +Z towards +X
    pub fn yaw(&self) -> f32 {
        let forward = self.forward();
        forward.x.atan2(forward.z)
    }

    /// Local right axis rotated into world space, flattened onto the plane
    ///
    /// Not renormalised: callers that need a unit axis normalise it
    /// themselves and treat a zero result as degenerate.
    pub fn right(&self) -> Vec3 {
        horizontal(self.rotation * local_right())
    }

    /// Local forward axis rotated into world space, flattened onto the plane
    pub fn forward(&self) -> Vec3 {
        horizontal(self.rotation * local_forward())
    }

    /// Transform a local-space point into world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Move the pose by a world-space displacement
    pub fn translate(&mut self, displacement: Vec3) {
        self.position += displacement;
    }
}
