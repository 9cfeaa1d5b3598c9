use log::debug;
use sgk_core::{Result, SgkError, Tolerance};
use sgk_geometry::{Continuity, ControlHandle, Spline, SplineCurve, SplineEnd, SplineType};
use sgk_math::Point;
use slotmap::{SecondaryMap, SlotMap};

use super::types::*;

/// Splines keyed by [`SplineId`] with symmetric endpoint adjacency.
///
/// `forward` lists what is attached at each spline's `End`, `backward` what is
/// attached at its `Start`. Every connection appears in both participants'
/// lists. Cycles are allowed.
#[derive(Debug, Clone)]
pub struct SplineGraph<P: Point> {
    pub(crate) splines: SlotMap<SplineId, Spline<P>>,
    pub(crate) forward: SecondaryMap<SplineId, Vec<Endpoint>>,
    pub(crate) backward: SecondaryMap<SplineId, Vec<Endpoint>>,
    pub(crate) tolerance: Tolerance,
}

impl<P: Point> Default for SplineGraph<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Point> SplineGraph<P> {
    pub fn new() -> Self {
        Self::with_tolerance(Tolerance::default())
    }

    pub fn with_tolerance(tolerance: Tolerance) -> Self {
        Self {
            splines: SlotMap::with_key(),
            forward: SecondaryMap::new(),
            backward: SecondaryMap::new(),
            tolerance,
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: Tolerance) {
        self.tolerance = tolerance;
    }

    pub fn len(&self) -> usize {
        self.splines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splines.is_empty()
    }

    pub fn contains(&self, id: SplineId) -> bool {
        self.splines.contains_key(id)
    }

    pub fn get(&self, id: SplineId) -> Option<&Spline<P>> {
        self.splines.get(id)
    }

    pub fn get_mut(&mut self, id: SplineId) -> Option<&mut Spline<P>> {
        self.splines.get_mut(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = SplineId> + '_ {
        self.splines.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SplineId, &Spline<P>)> + '_ {
        self.splines.iter()
    }

    pub(crate) fn spline(&self, id: SplineId) -> Result<&Spline<P>> {
        self.splines
            .get(id)
            .ok_or_else(|| SgkError::NotFound(format!("Spline {:?} not in graph", id)))
    }

    pub(crate) fn spline_mut(&mut self, id: SplineId) -> Result<&mut Spline<P>> {
        self.splines
            .get_mut(id)
            .ok_or_else(|| SgkError::NotFound(format!("Spline {:?} not in graph", id)))
    }

    /// Endpoints attached at `endpoint` (empty for unknown splines).
    pub fn links(&self, endpoint: Endpoint) -> &[Endpoint] {
        let map = match endpoint.end {
            SplineEnd::End => &self.forward,
            SplineEnd::Start => &self.backward,
        };
        map.get(endpoint.spline).map(Vec::as_slice).unwrap_or(&[])
    }

    fn links_mut(&mut self, endpoint: Endpoint) -> Option<&mut Vec<Endpoint>> {
        let map = match endpoint.end {
            SplineEnd::End => &mut self.forward,
            SplineEnd::Start => &mut self.backward,
        };
        map.get_mut(endpoint.spline)
    }

    /// Connected endpoints, or `None` when nothing is attached.
    pub fn has_connection(&self, endpoint: Endpoint) -> Option<&[Endpoint]> {
        let links = self.links(endpoint);
        (!links.is_empty()).then_some(links)
    }

    pub fn add_spline_to_graph(&mut self, spline: Spline<P>) -> SplineId {
        let spline_type = spline.spline_type();
        let id = self.splines.insert(spline);
        self.forward.insert(id, Vec::new());
        self.backward.insert(id, Vec::new());
        debug!("added {:?} spline {:?}", spline_type, id);
        id
    }

    /// Add an empty spline of the given type.
    pub fn add_defaulted(&mut self, spline_type: SplineType) -> SplineId {
        self.add_spline_to_graph(Spline::defaulted(spline_type))
    }

    /// Attach `a` to `b`. Connecting an already connected pair is a no-op.
    pub fn connect(&mut self, a: Endpoint, b: Endpoint) -> Result<()> {
        self.spline(a.spline)?;
        self.spline(b.spline)?;
        if a == b {
            return Err(SgkError::InvalidOperation(format!(
                "cannot connect {:?} to itself",
                a
            )));
        }
        if self.links(a).contains(&b) {
            return Ok(());
        }
        if let Some(links) = self.links_mut(a) {
            links.push(b);
        }
        if let Some(links) = self.links_mut(b) {
            links.push(a);
        }
        debug!("connected {:?} <-> {:?}", a, b);
        Ok(())
    }

    /// Detach `a` from `b`. Returns whether they were connected.
    pub fn split_connection(&mut self, a: Endpoint, b: Endpoint) -> Result<bool> {
        self.spline(a.spline)?;
        self.spline(b.spline)?;
        let mut removed = false;
        if let Some(links) = self.links_mut(a) {
            let before = links.len();
            links.retain(|&e| e != b);
            removed |= links.len() != before;
        }
        if let Some(links) = self.links_mut(b) {
            links.retain(|&e| e != a);
        }
        if removed {
            debug!("split connection {:?} <-> {:?}", a, b);
        }
        Ok(removed)
    }

    /// Every connection touching `id`, as `(own endpoint, neighbour endpoint)`.
    fn edges_of(&self, id: SplineId) -> Vec<(Endpoint, Endpoint)> {
        [SplineEnd::Start, SplineEnd::End]
            .into_iter()
            .flat_map(|end| {
                let own = Endpoint::new(id, end);
                self.links(own).iter().map(move |&nb| (own, nb))
            })
            .collect()
    }

    /// Remove a spline and every connection to it.
    pub fn delete_spline(&mut self, id: SplineId) -> Result<Spline<P>> {
        self.spline(id)?;
        for (own, nb) in self.edges_of(id) {
            self.split_connection(own, nb)?;
        }
        self.forward.remove(id);
        self.backward.remove(id);
        let spline = self.splines.remove(id).ok_or_else(|| {
            SgkError::NotFound(format!("Spline {:?} not in graph", id))
        })?;
        debug!("deleted spline {:?}", id);
        Ok(spline)
    }

    /// Reverse a spline. Its forward and backward adjacency swap and every
    /// neighbour's reference to it flips end.
    pub fn reverse_spline(&mut self, id: SplineId) -> Result<()> {
        self.spline_mut(id)?.reverse();
        let edges = self.edges_of(id);
        for &(own, nb) in &edges {
            self.split_connection(own, nb)?;
        }
        let flip = |e: Endpoint| if e.spline == id { e.opposite() } else { e };
        for (own, nb) in edges {
            self.connect(flip(own), flip(nb))?;
        }
        debug!("reversed spline {:?}", id);
        Ok(())
    }

    /// Convert a spline to another representation, keeping its id and
    /// connections.
    pub fn change_spline_type(&mut self, id: SplineId, spline_type: SplineType) -> Result<()> {
        let converted = self.spline(id)?.converted(spline_type, self.tolerance.linear)?;
        *self.spline_mut(id)? = converted;
        debug!("spline {:?} is now {:?}", id, spline_type);
        Ok(())
    }

    /// Create a spline that continues `existing` from its `end`.
    ///
    /// The new spline starts at that endpoint, followed by `points`, and is
    /// connected to it. Unless `continuity` is `C0`, its start tangent mirrors
    /// the tangent of `existing` at the junction.
    pub fn create_spline_besides_existed(
        &mut self,
        existing: SplineId,
        end: SplineEnd,
        spline_type: SplineType,
        continuity: Continuity,
        points: &[P],
    ) -> Result<SplineId> {
        let source = self.spline(existing)?;
        let junction = source.endpoint(end).ok_or_else(|| {
            SgkError::InvalidOperation(format!("Spline {:?} has no control points", existing))
        })?;
        let inner = inward_point(source, end);
        let seed = inner
            .map(|inner| junction * 2.0 - inner)
            .filter(|seed| seed.distance_squared(junction) > self.tolerance.linear_sqr());

        let mut spline = Spline::defaulted(spline_type);
        spline.add_point_at_last(junction);
        match (&mut spline, seed) {
            (Spline::ClampedBSpline(b), Some(seed)) if continuity != Continuity::C0 => {
                b.add_point_at_last(seed);
                for &p in points {
                    b.add_point_at_last(p);
                }
            }
            (Spline::BezierString(s), seed) => {
                for &p in points {
                    s.add_point_at_last(p);
                }
                s.set_continuity(0, continuity)?;
                match seed {
                    Some(seed) if continuity != Continuity::C0 && s.num_points() > 1 => {
                        s.move_ctrl_point(0, ControlHandle::Next, seed)?;
                    }
                    _ => {}
                }
            }
            (other, _) => {
                for &p in points {
                    other.add_point_at_last(p);
                }
            }
        }

        let id = self.add_spline_to_graph(spline);
        self.connect(Endpoint::new(existing, end), Endpoint::start(id))?;
        Ok(id)
    }

    /// First spline (the hinted one first) holding the `nth` match of `pos`
    /// for `handle`, with the control point index.
    pub fn find_ctrl_point(
        &self,
        pos: P,
        spline_hint: Option<SplineId>,
        handle: ControlHandle,
        nth: usize,
    ) -> Option<(SplineId, usize)> {
        let tol_sqr = self.tolerance.linear_sqr();
        spline_hint
            .into_iter()
            .chain(self.splines.keys().filter(|&id| Some(id) != spline_hint))
            .find_map(|id| {
                let index = self.splines.get(id)?.find_ctrl_point(pos, handle, nth, tol_sqr)?;
                Some((id, index))
            })
    }
}

/// Control point next to the endpoint on the inside of the curve: the inner
/// handle of a Bezier string, the second control point of a B-spline.
pub(crate) fn inward_point<P: Point>(spline: &Spline<P>, end: SplineEnd) -> Option<P> {
    match spline {
        Spline::BezierString(s) => s.end_handles(end).map(|(_, inward)| inward),
        Spline::ClampedBSpline(b) => {
            let n = b.num_points();
            if n < 2 {
                return None;
            }
            match end {
                SplineEnd::Start => b.ctrl_point(1),
                SplineEnd::End => b.ctrl_point(n - 2),
            }
        }
    }
}
