//! Quaternion and 3-vector algebra for rigid-body transforms.
//!
//! All rotations are unit quaternions in `(x, y, z, w)` component order with
//! the Hamilton product convention: `a.multiply(b)` applied to a vector is
//! `a(b(v))`. Stored rotations are kept unit-norm; normalization of a
//! degenerate quaternion falls back to identity.

use serde::{Deserialize, Serialize};

/// Norm below which a quaternion is considered degenerate.
const DEGENERATE_NORM: f64 = 1e-10;

/// Dot-product threshold above which SLERP falls back to linear
/// interpolation (the great-circle arc is too short to divide by its sine).
const SLERP_LINEAR_THRESHOLD: f64 = 0.9995;

/// A 3-vector in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vector3 {
    /// Create a new vector.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Component-wise sum.
    #[inline]
    pub fn add(&self, other: &Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Component-wise negation.
    #[inline]
    pub fn neg(&self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }

    /// Cross product `self × other`.
    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length.
    #[inline]
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Linear interpolation from `self` to `other` at parameter `t`.
    #[inline]
    pub fn lerp(&self, other: &Vector3, t: f64) -> Vector3 {
        Vector3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }
}

/// A rotation quaternion `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// X (vector) component
    pub x: f64,
    /// Y (vector) component
    pub y: f64,
    /// Z (vector) component
    pub z: f64,
    /// W (scalar) component
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion from components.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation `(0, 0, 0, 1)`.
    #[inline]
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians about the Z axis.
    pub fn from_yaw(angle: f64) -> Self {
        let half = angle * 0.5;
        Self::new(0.0, 0.0, half.sin(), half.cos())
    }

    /// Four-component dot product.
    #[inline]
    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Euclidean norm of the four components.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit-norm copy. Degenerate input (norm < 1e-10) becomes identity.
    pub fn normalized(&self) -> Quaternion {
        let n = self.norm();
        if n < DEGENERATE_NORM {
            return Quaternion::identity();
        }
        Quaternion::new(self.x / n, self.y / n, self.z / n, self.w / n)
    }

    /// Inverse rotation. Valid for unit quaternions (conjugate).
    #[inline]
    pub fn inverse(&self) -> Quaternion {
        Quaternion::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Negate all four components (same rotation, opposite hemisphere).
    #[inline]
    fn negated(&self) -> Quaternion {
        Quaternion::new(-self.x, -self.y, -self.z, -self.w)
    }

    /// Hamilton product `self · other`.
    ///
    /// Composition order: `a.multiply(b)` rotates a vector by `b` first,
    /// then by `a`.
    pub fn multiply(&self, other: &Quaternion) -> Quaternion {
        let (ax, ay, az, aw) = (self.x, self.y, self.z, self.w);
        let (bx, by, bz, bw) = (other.x, other.y, other.z, other.w);
        Quaternion::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Rotate a vector by this quaternion.
    ///
    /// Uses `v + 2(w(q × v) + q × (q × v))` with `q` the vector part,
    /// avoiding the quaternion-vector promotion of `q·(0,v)·q⁻¹`.
    pub fn rotate(&self, v: &Vector3) -> Vector3 {
        let q = Vector3::new(self.x, self.y, self.z);
        let qv = q.cross(v);
        let qqv = q.cross(&qv);
        Vector3::new(
            v.x + 2.0 * (self.w * qv.x + qqv.x),
            v.y + 2.0 * (self.w * qv.y + qqv.y),
            v.z + 2.0 * (self.w * qv.z + qqv.z),
        )
    }

    /// Spherical linear interpolation from `self` to `other` at `t ∈ [0, 1]`.
    ///
    /// Interpolates along the shorter great-circle arc (the hemisphere of
    /// `other` with non-negative dot product is chosen). Nearly parallel
    /// inputs use a normalized linear blend instead of dividing by a
    /// vanishing sine. The result is unit-norm.
    pub fn slerp(&self, other: &Quaternion, t: f64) -> Quaternion {
        let mut d = self.dot(other);
        let mut end = *other;
        if d < 0.0 {
            end = end.negated();
            d = -d;
        }

        if d > SLERP_LINEAR_THRESHOLD {
            let blended = Quaternion::new(
                self.x + (end.x - self.x) * t,
                self.y + (end.y - self.y) * t,
                self.z + (end.z - self.z) * t,
                self.w + (end.w - self.w) * t,
            );
            return blended.normalized();
        }

        let theta_0 = d.acos();
        let theta = theta_0 * t;
        let sin_theta_0 = theta_0.sin();
        let sin_theta = theta.sin();

        let s0 = theta.cos() - d * sin_theta / sin_theta_0;
        let s1 = sin_theta / sin_theta_0;

        Quaternion::new(
            s0 * self.x + s1 * end.x,
            s0 * self.y + s1 * end.y,
            s0 * self.z + s1 * end.z,
            s0 * self.w + s1 * end.w,
        )
        .normalized()
    }

    /// Heading about the Z axis: `atan2(2(wz + xy), 1 − 2(y² + z²))`.
    #[inline]
    pub fn yaw(&self) -> f64 {
        let siny = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny.atan2(cosy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn quat_approx_eq(a: &Quaternion, b: &Quaternion, epsilon: f64) {
        // Compare up to sign: q and -q are the same rotation.
        let d = a.dot(b);
        assert!(
            d.abs() > 1.0 - epsilon,
            "quaternions differ: {:?} vs {:?} (|dot| = {})",
            a,
            b,
            d.abs()
        );
    }

    #[test]
    fn test_normalize_unit_is_identity_operation() {
        let q = Quaternion::from_yaw(1.2);
        let n = q.normalized();
        assert_relative_eq!(n.x, q.x, epsilon = 1e-10);
        assert_relative_eq!(n.y, q.y, epsilon = 1e-10);
        assert_relative_eq!(n.z, q.z, epsilon = 1e-10);
        assert_relative_eq!(n.w, q.w, epsilon = 1e-10);
    }

    #[test]
    fn test_normalize_degenerate_falls_back_to_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(q.normalized(), Quaternion::identity());

        let tiny = Quaternion::new(1e-12, 0.0, 0.0, 1e-12);
        assert_eq!(tiny.normalized(), Quaternion::identity());
    }

    #[test]
    fn test_rotate_preserves_length() {
        let q = Quaternion::new(0.1, 0.3, -0.2, 0.9).normalized();
        let v = Vector3::new(1.0, -2.0, 3.0);
        let r = q.rotate(&v);
        assert_relative_eq!(r.norm(), v.norm(), epsilon = 1e-9);
    }

    #[test]
    fn test_rotate_yaw_quarter_turn() {
        let q = Quaternion::from_yaw(FRAC_PI_2);
        let r = q.rotate(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(r.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(r.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multiply_composes_rotations() {
        let a = Quaternion::from_yaw(0.4);
        let b = Quaternion::from_yaw(0.3);
        let v = Vector3::new(1.0, 2.0, 0.0);

        let composed = a.multiply(&b).rotate(&v);
        let sequential = a.rotate(&b.rotate(&v));
        assert_relative_eq!(composed.x, sequential.x, epsilon = 1e-9);
        assert_relative_eq!(composed.y, sequential.y, epsilon = 1e-9);
        assert_relative_eq!(composed.z, sequential.z, epsilon = 1e-9);
    }

    #[test]
    fn test_multiply_by_inverse_is_identity() {
        let q = Quaternion::new(0.2, -0.5, 0.1, 0.8).normalized();
        let r = q.multiply(&q.inverse());
        quat_approx_eq(&r, &Quaternion::identity(), 1e-9);
    }

    #[test]
    fn test_slerp_endpoints() {
        let a = Quaternion::from_yaw(0.2);
        let b = Quaternion::from_yaw(2.1);

        quat_approx_eq(&a.slerp(&b, 0.0), &a, 1e-9);
        quat_approx_eq(&a.slerp(&b, 1.0), &b, 1e-9);
    }

    #[test]
    fn test_slerp_midpoint_is_unit_and_halfway() {
        let a = Quaternion::from_yaw(0.0);
        let b = Quaternion::from_yaw(1.0);
        let mid = a.slerp(&b, 0.5);

        assert_relative_eq!(mid.norm(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(mid.yaw(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_slerp_constant_angular_velocity() {
        let a = Quaternion::from_yaw(0.0);
        let b = Quaternion::from_yaw(2.0);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert_relative_eq!(a.slerp(&b, t).yaw(), 2.0 * t, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_slerp_short_path_with_negated_operand() {
        // q and -q are the same rotation; the halfway point must come back
        // near q instead of swinging around the 4-sphere.
        let q = Quaternion::from_yaw(0.7);
        let mid = q.slerp(&q.negated(), 0.5);
        quat_approx_eq(&mid, &q, 1e-6);
    }

    #[test]
    fn test_slerp_nearly_parallel_uses_linear_blend() {
        let a = Quaternion::from_yaw(0.0);
        let b = Quaternion::from_yaw(1e-5);
        let mid = a.slerp(&b, 0.5);
        assert_relative_eq!(mid.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.yaw(), 5e-6, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_extraction() {
        for angle in [-PI + 0.01, -1.0, 0.0, 0.5, 1.5, PI - 0.01] {
            assert_relative_eq!(Quaternion::from_yaw(angle).yaw(), angle, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_vector_lerp() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(2.0, 4.0, -6.0);
        let mid = a.lerp(&b, 0.25);
        assert_relative_eq!(mid.x, 0.5);
        assert_relative_eq!(mid.y, 1.0);
        assert_relative_eq!(mid.z, -1.5);
    }
}
