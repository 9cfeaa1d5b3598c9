use serde::{Deserialize, Serialize};

use crate::vector::Vector;

/// Axis-aligned bounding box over any vector dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<V> {
    pub min: V,
    pub max: V,
}

impl<V: Vector> Bounds<V> {
    pub fn new(min: V, max: V) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[V]) -> Option<Self> {
        let (&first, rest) = points.split_first()?;
        let mut min = first;
        let mut max = first;
        for &p in rest {
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self { min, max })
    }

    pub fn center(&self) -> V {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> V {
        self.max - self.min
    }

    pub fn contains_point(&self, p: V) -> bool {
        (0..V::DIM).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn intersects(&self, other: &Self) -> bool {
        (0..V::DIM).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn expand(&self, amount: f64) -> Self {
        let offset = V::splat(amount);
        Self {
            min: self.min - offset,
            max: self.max + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{dvec2, dvec3};

    #[test]
    fn test_from_points() {
        let pts = vec![dvec3(1.0, 2.0, 3.0), dvec3(-1.0, 5.0, 0.0), dvec3(3.0, -1.0, 2.0)];
        let b = Bounds::from_points(&pts).unwrap();
        assert_eq!(b.min, dvec3(-1.0, -1.0, 0.0));
        assert_eq!(b.max, dvec3(3.0, 5.0, 3.0));
        assert!(Bounds::<glam::DVec3>::from_points(&[]).is_none());
    }

    #[test]
    fn test_contains_and_intersects_2d() {
        let a = Bounds::new(dvec2(0.0, 0.0), dvec2(2.0, 2.0));
        let b = Bounds::new(dvec2(1.0, 1.0), dvec2(3.0, 3.0));
        let c = Bounds::new(dvec2(5.0, 5.0), dvec2(6.0, 6.0));
        assert!(a.contains_point(dvec2(0.5, 1.5)));
        assert!(!a.contains_point(dvec2(2.5, 1.5)));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.merge(&c).max, dvec2(6.0, 6.0));
    }
}
