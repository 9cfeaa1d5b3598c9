//! SGK math primitives: homogeneous vectors, curvature, bounds, quadrature and
//! dense linear solves.

pub mod bounds;
pub mod integration;
pub mod linear;
pub mod vector;

pub use glam::{dvec2, dvec3, dvec4, DVec2, DVec3, DVec4};
pub use bounds::Bounds;
pub use integration::{GaussLegendre, DEFAULT_NEWTON_ITERATIONS};
pub use linear::DenseSystem;
pub use vector::{
    curvature, principal_curvature, rational_derivatives, weight_to_one, Point, Vector,
};

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector2 = DVec2;
pub type Vector3 = DVec3;
