use std::collections::{HashSet, VecDeque};

use sgk_math::Point;

use super::spline_graph::SplineGraph;
use super::types::*;

impl<P: Point> SplineGraph<P> {
    /// Splines reachable from `id` with their hop distance, in breadth-first
    /// order. `id` itself is never listed, even on a cycle.
    pub fn get_cluster_without_self(
        &self,
        id: SplineId,
        direction: Direction,
    ) -> Vec<(SplineId, usize)> {
        let mut cluster = Vec::new();
        if !self.contains(id) {
            return cluster;
        }
        let mut visited = HashSet::from([id]);
        let mut queue = VecDeque::from([(id, None, 0usize)]);
        while let Some((current, entered, distance)) = queue.pop_front() {
            for end in direction.exits(entered) {
                for neighbour in self.links(Endpoint::new(current, end)) {
                    if visited.insert(neighbour.spline) {
                        cluster.push((neighbour.spline, distance + 1));
                        queue.push_back((neighbour.spline, Some(neighbour.end), distance + 1));
                    }
                }
            }
        }
        cluster
    }
}
