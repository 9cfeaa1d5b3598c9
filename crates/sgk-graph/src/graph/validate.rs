use sgk_core::{Result, SgkError, Validate};
use sgk_geometry::SplineEnd;
use sgk_math::Point;

use super::spline_graph::SplineGraph;
use super::types::*;

impl<P: Point> Validate for SplineGraph<P> {
    fn validate(&self) -> Result<()> {
        for (id, spline) in &self.splines {
            if !self.forward.contains_key(id) || !self.backward.contains_key(id) {
                return Err(SgkError::NotFound(format!(
                    "Spline {:?} has no adjacency entry",
                    id
                )));
            }
            spline.validate()?;
        }

        for (id, _) in &self.splines {
            for end in [SplineEnd::Start, SplineEnd::End] {
                let own = Endpoint::new(id, end);
                let links = self.links(own);
                for (i, &neighbour) in links.iter().enumerate() {
                    if !self.contains(neighbour.spline) {
                        return Err(SgkError::NotFound(format!(
                            "{:?} is connected to missing spline {:?}",
                            own, neighbour.spline
                        )));
                    }
                    if neighbour == own || links[..i].contains(&neighbour) {
                        return Err(SgkError::InvalidOperation(format!(
                            "{:?} has a repeated or self connection to {:?}",
                            own, neighbour
                        )));
                    }
                    if !self.links(neighbour).contains(&own) {
                        return Err(SgkError::InvalidOperation(format!(
                            "Connection symmetry violated: {:?} -> {:?} has no reverse",
                            own, neighbour
                        )));
                    }
                }
            }
        }

        // Entries left behind by deleted splines
        if let Some(stale) = self
            .forward
            .keys()
            .chain(self.backward.keys())
            .find(|&id| !self.contains(id))
        {
            return Err(SgkError::InvalidOperation(format!(
                "adjacency entry for deleted spline {:?}",
                stale
            )));
        }

        Ok(())
    }
}
