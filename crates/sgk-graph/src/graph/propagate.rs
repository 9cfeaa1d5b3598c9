use std::collections::{HashSet, VecDeque};

use log::debug;
use sgk_core::{Result, SgkError};
use sgk_geometry::{Continuity, ControlHandle, Spline, SplineCurve, SplineEnd};
use sgk_math::Point;

use super::spline_graph::SplineGraph;
use super::types::*;

impl<P: Point> SplineGraph<P> {
    /// Move the `nth` control point (or handle) matching `from` to `to`, then
    /// walk the graph breadth-first for up to `move_level` hops and make every
    /// spline at a visited junction agree with the spline it was reached from.
    ///
    /// With a `spline_hint` only that spline is searched for `from`.
    /// Returns the splines that were edited, the moved one first.
    pub fn adjust_ctrl_point_pos(
        &mut self,
        from: P,
        to: P,
        spline_hint: Option<SplineId>,
        move_level: usize,
        handle: ControlHandle,
        nth: usize,
    ) -> Result<Vec<SplineId>> {
        let tol_sqr = self.tolerance.linear_sqr();
        let found = match spline_hint {
            Some(id) => self
                .spline(id)?
                .find_ctrl_point(from, handle, nth, tol_sqr)
                .map(|index| (id, index)),
            None => self.find_ctrl_point(from, None, handle, nth),
        };
        let (origin, index) = found
            .ok_or_else(|| SgkError::NotFound(format!("{:?} near {:?}", handle, from)))?;
        self.spline_mut(origin)?.move_ctrl_point(index, handle, to)?;
        debug!("moved {:?} {} of spline {:?} to {:?}", handle, index, origin, to);

        let mut touched = vec![origin];
        let mut visited = HashSet::from([origin]);
        let mut queue = VecDeque::from([(origin, 0usize)]);
        while let Some((id, level)) = queue.pop_front() {
            if level >= move_level {
                continue;
            }
            for end in [SplineEnd::Start, SplineEnd::End] {
                let source = Endpoint::new(id, end);
                for neighbour in self.links(source).to_vec() {
                    if !visited.insert(neighbour.spline) {
                        continue;
                    }
                    self.sync_junction(source, neighbour)?;
                    touched.push(neighbour.spline);
                    queue.push_back((neighbour.spline, level + 1));
                }
            }
        }
        Ok(touched)
    }

    /// Snap `target`'s endpoint onto `source`'s and, between two Bezier
    /// strings, align `target`'s inward handle with `source`'s outward one.
    fn sync_junction(&mut self, source: Endpoint, target: Endpoint) -> Result<()> {
        let from = self.spline(source.spline)?;
        let Some(pos) = from.endpoint(source.end) else {
            return Ok(());
        };
        let outward = match from {
            Spline::BezierString(s) => s.end_handles(source.end).map(|(outward, _)| outward),
            Spline::ClampedBSpline(_) => None,
        };
        let tol_sqr = self.tolerance.linear_sqr();

        let spline = self.spline_mut(target.spline)?;
        let n = spline.num_points();
        if n == 0 {
            return Ok(());
        }
        let index = match target.end {
            SplineEnd::Start => 0,
            SplineEnd::End => n - 1,
        };
        if spline
            .endpoint(target.end)
            .is_some_and(|p| p.distance_squared(pos) > tol_sqr)
        {
            spline.move_ctrl_point(index, ControlHandle::Position, pos)?;
        }
        if let (Spline::BezierString(s), Some(outward)) = (spline, outward) {
            let smooth = s
                .point(index)
                .is_some_and(|node| node.continuity != Continuity::C0);
            if smooth {
                let inward = match target.end {
                    SplineEnd::Start => ControlHandle::Next,
                    SplineEnd::End => ControlHandle::Prev,
                };
                s.move_ctrl_point(index, inward, outward)?;
            }
        }
        debug!("synced {:?} to {:?}", target, source);
        Ok(())
    }
}
