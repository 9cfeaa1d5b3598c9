use serde::{Deserialize, Serialize};
use sgk_geometry::SplineEnd;
use slotmap::new_key_type;

// --- SlotMap key types ---

new_key_type! {
    pub struct SplineId;
}

/// One end of one spline in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub spline: SplineId,
    pub end: SplineEnd,
}

impl Endpoint {
    pub fn new(spline: SplineId, end: SplineEnd) -> Self {
        Self { spline, end }
    }

    pub fn start(spline: SplineId) -> Self {
        Self::new(spline, SplineEnd::Start)
    }

    pub fn end(spline: SplineId) -> Self {
        Self::new(spline, SplineEnd::End)
    }

    /// The other end of the same spline.
    pub fn opposite(self) -> Self {
        Self::new(self.spline, self.end.opposite())
    }
}

/// Which adjacency a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Leave each spline through its `End`.
    Forward,
    /// Leave each spline through its `Start`.
    Backward,
    /// Follow both adjacency maps.
    Both,
}

impl Direction {
    /// Ends to leave a spline through, given the end it was entered by.
    ///
    /// Directional walks keep going the way they came in, so they leave
    /// through the end opposite the entry.
    pub(crate) fn exits(self, entered: Option<SplineEnd>) -> Vec<SplineEnd> {
        match (self, entered) {
            (Direction::Both, _) => vec![SplineEnd::Start, SplineEnd::End],
            (_, Some(end)) => vec![end.opposite()],
            (Direction::Forward, None) => vec![SplineEnd::End],
            (Direction::Backward, None) => vec![SplineEnd::Start],
        }
    }
}
