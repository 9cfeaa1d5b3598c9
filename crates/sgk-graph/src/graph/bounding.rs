use sgk_core::BoundingBox;
use sgk_geometry::SplineCurve;
use sgk_math::{Bounds, Point};

use super::spline_graph::SplineGraph;

impl<P: Point> BoundingBox for SplineGraph<P> {
    type Point = P;

    fn bounding_box(&self) -> (P, P) {
        let merged = self
            .splines
            .values()
            .filter(|s| s.num_points() > 0)
            .map(|s| {
                let (min, max) = s.bounding_box();
                Bounds::new(min, max)
            })
            .reduce(|a, b| a.merge(&b));
        match merged {
            Some(b) => (b.min, b.max),
            None => (P::ZERO, P::ZERO),
        }
    }
}
