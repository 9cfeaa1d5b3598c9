//! Knot vector utilities and the de Boor family of B-spline algorithms.

pub mod deboor;
pub mod knot;

pub use knot::{basis_functions, clamped_knot_vector, find_span, multiplicity};
