//! 3D world position

use serde::{Deserialize, Serialize};

/// 3D position in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    /// X coordinate (left/right, positive = right)
    pub x: f32,
    /// Y coordinate (front/back, positive = front)
    pub y: f32,
    /// Z coordinate (up/down, positive = up)
    pub z: f32,
}

impl Position3D {
    /// Create new position
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Origin position
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Get magnitude (distance from origin)
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalize to unit vector
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag < 1e-10 {
            return Self::new(0.0, 1.0, 0.0); // Default forward
        }
        Self::new(self.x / mag, self.y / mag, self.z / mag)
    }

    /// Linear interpolation
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    /// Distance to another point
    pub fn distance_to(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance to another point (avoids the sqrt in grid pruning)
    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl Default for Position3D {
    fn default() -> Self {
        Self::origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Position3D::new(0.0, 0.0, 0.0);
        let b = Position3D::new(3.0, 4.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 0.001);
        assert!((a.distance_squared(&b) - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_lerp() {
        let a = Position3D::new(0.0, 0.0, 0.0);
        let b = Position3D::new(10.0, -2.0, 4.0);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.x - 5.0).abs() < 0.001);
        assert!((mid.y - (-1.0)).abs() < 0.001);
        assert!((mid.z - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_normalize_degenerate() {
        let zero = Position3D::origin();
        let n = zero.normalize();
        assert!((n.magnitude() - 1.0).abs() < 0.001);
    }
}
