//! 平面点

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::EPSILON;

/// 平面点（毫米），可选高度 `z`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub z: Option<f64>,
}

impl Vertex {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub const fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// 平面欧氏距离（忽略 `z`）
    pub fn distance(&self, other: &Vertex) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// 指向 `other` 的方向角（弧度）
    pub fn heading_to(&self, other: &Vertex) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// 在平面上与 `other` 重合（容差 [`EPSILON`]）
    pub fn coincides(&self, other: &Vertex) -> bool {
        self.distance(other) < EPSILON
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// 沿方向角 `angle`（弧度）平移 `distance`
    pub fn offset(&self, angle: f64, distance: f64) -> Vertex {
        Vertex {
            x: self.x + distance * angle.cos(),
            y: self.y + distance * angle.sin(),
            z: self.z,
        }
    }

    pub fn midpoint(&self, other: &Vertex) -> Vertex {
        Vertex::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((x, y): (f64, f64)) -> Self {
        Vertex::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_ignores_z() {
        let a = Vertex::with_z(0.0, 0.0, 100.0);
        let b = Vertex::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_heading_and_offset() {
        let a = Vertex::new(0.0, 0.0);
        let b = Vertex::new(0.0, 10.0);
        let heading = a.heading_to(&b);
        assert!((heading - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let c = a.offset(heading, 10.0);
        assert!(c.coincides(&b));
    }

    #[test]
    fn test_coincides_tolerance() {
        let a = Vertex::new(1.0, 1.0);
        assert!(a.coincides(&Vertex::new(1.0 + 1e-9, 1.0)));
        assert!(!a.coincides(&Vertex::new(1.01, 1.0)));
    }
}
