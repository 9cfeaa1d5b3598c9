mod bounding;
mod cluster;
mod propagate;
pub mod record;
pub mod spline_graph;
pub mod types;
mod validate;

pub use record::{ConnectionRecord, GraphRecord};
pub use spline_graph::SplineGraph;
pub use types::*;
