//! SGK spline graph: splines joined at their endpoints, with edits that
//! propagate across junctions.

pub mod graph;

pub use graph::{ConnectionRecord, Direction, Endpoint, GraphRecord, SplineGraph, SplineId};
