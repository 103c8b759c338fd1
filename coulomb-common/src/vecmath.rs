use crate::error::VectorError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A simple 2D vector with value semantics.
///
/// Every operation returns a new vector; holders such as particle state
/// assign the result back instead of mutating in place.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Creates a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Creates a zero vector.
    pub fn zero() -> Self {
        Vec2 { x: 0.0, y: 0.0 }
    }

    /// Creates the vector (1, 1).
    pub fn one() -> Self {
        Vec2 { x: 1.0, y: 1.0 }
    }

    /// Unit vector pointing at `angle_rad`.
    pub fn from_angle(angle_rad: f64) -> Self {
        Vec2::new(angle_rad.cos(), angle_rad.sin())
    }

    pub fn dot(&self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Calculates the squared length (magnitude) of the vector.
    pub fn length_squared(&self) -> f64 {
        self.dot(*self)
    }

    /// Calculates the length (magnitude) of the vector.
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Calculates the squared distance to another vector (point).
    pub fn distance_squared(&self, other: Vec2) -> f64 {
        (other - *self).length_squared()
    }

    /// Calculates the distance to another vector (point).
    pub fn distance(&self, other: Vec2) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Scales the vector by a scalar value.
    pub fn scale(&self, scalar: f64) -> Self {
        Vec2 { x: self.x * scalar, y: self.y * scalar }
    }

    /// Component-wise product.
    pub fn mul_elementwise(&self, other: Vec2) -> Self {
        Vec2 { x: self.x * other.x, y: self.y * other.y }
    }

    /// Component-wise quotient. A zero component in `other` yields an
    /// infinite or NaN component, as plain float division does.
    pub fn div_elementwise(&self, other: Vec2) -> Self {
        Vec2 { x: self.x / other.x, y: self.y / other.y }
    }

    /// Returns the unit vector pointing the same way.
    ///
    /// Fails with [`VectorError::Degenerate`] for the zero vector.
    pub fn normalized(&self) -> Result<Self, VectorError> {
        let len = self.length();
        if len == 0.0 {
            return Err(VectorError::Degenerate);
        }
        Ok(*self / len)
    }

    /// Normalizes the vector, returning a zero vector if the length is zero.
    pub fn normalize_or_zero(&self) -> Self {
        self.normalized().unwrap_or_default()
    }

    /// Polar angle in radians, in the range `[-PI/2, 3PI/2)`.
    ///
    /// Computed from the arcsine of the normalized y component and mirrored
    /// for vectors pointing into the left half-plane.
    pub fn angle(&self) -> Result<f64, VectorError> {
        let norm = self.normalized()?;
        let angle_sin = norm.y.asin();
        if norm.x < 0.0 {
            Ok(PI - angle_sin)
        } else {
            Ok(angle_sin)
        }
    }
}

// Implement standard operators for convenience
impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        self.scale(scalar)
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        // Not guarded: a zero divisor gives inf/NaN components.
        Self { x: self.x / scalar, y: self.y / scalar }
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(v: [f64; 2]) -> Self {
        Vec2::new(v[0], v[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn arithmetic_is_pure() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -4.0);
        assert_eq!(a + b, Vec2::new(4.0, -2.0));
        assert_eq!(a - b, Vec2::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(b / 2.0, Vec2::new(1.5, -2.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));
        assert_eq!(a.mul_elementwise(b), Vec2::new(3.0, -8.0));
        assert_eq!(b.div_elementwise(a), Vec2::new(3.0, -2.0));
        // Operands are untouched.
        assert_eq!(a, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn division_by_zero_is_not_guarded() {
        let v = Vec2::new(1.0, 0.0) / 0.0;
        assert!(v.x.is_infinite());
        assert!(v.y.is_nan());
        let w = Vec2::one().div_elementwise(Vec2::new(0.0, 1.0));
        assert!(w.x.is_infinite());
        assert_eq!(w.y, 1.0);
    }

    #[test]
    fn length_and_dot() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.dot(Vec2::new(1.0, 1.0)), 7.0);
        assert_eq!(v.length_squared(), 25.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(Vec2::zero().distance(v), 5.0);
    }

    #[test]
    fn normalized_has_unit_length() {
        let n = Vec2::new(-6.0, 8.0).normalized().unwrap();
        assert!(close(n.length(), 1.0));
        assert!(close(n.x, -0.6));
        assert!(close(n.y, 0.8));
    }

    #[test]
    fn zero_vector_is_degenerate() {
        assert_eq!(Vec2::zero().normalized(), Err(VectorError::Degenerate));
        assert_eq!(Vec2::zero().angle(), Err(VectorError::Degenerate));
        assert_eq!(Vec2::zero().normalize_or_zero(), Vec2::zero());
    }

    #[test]
    fn angle_covers_all_quadrants() {
        assert!(close(Vec2::new(1.0, 0.0).angle().unwrap(), 0.0));
        assert!(close(Vec2::new(0.0, 2.0).angle().unwrap(), PI / 2.0));
        assert!(close(Vec2::new(-1.0, 0.0).angle().unwrap(), PI));
        assert!(close(Vec2::new(-1.0, -1.0).angle().unwrap(), 5.0 * PI / 4.0));
        assert!(close(Vec2::new(1.0, -1.0).angle().unwrap(), -PI / 4.0));
        assert!(close(Vec2::new(0.0, -1.0).angle().unwrap(), -PI / 2.0));
    }

    #[test]
    fn from_angle_round_trips_through_angle() {
        let theta = 2.0;
        let v = Vec2::from_angle(theta) * 3.0;
        assert!(close(v.angle().unwrap(), theta));
    }
}
