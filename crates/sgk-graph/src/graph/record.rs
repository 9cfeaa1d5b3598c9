//! Versioned snapshot of a whole graph: spline records plus an edge list that
//! refers to splines by their position in the record.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};
use sgk_core::{Result, SgkError};
use sgk_geometry::{Spline, SplineEnd, SplineRecord};
use sgk_math::Point;

use super::spline_graph::SplineGraph;
use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub a: usize,
    pub a_end: SplineEnd,
    pub b: usize,
    pub b_end: SplineEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "P: Serialize, P::Hom: Serialize",
    deserialize = "P: Deserialize<'de>, P::Hom: Deserialize<'de>"
))]
pub struct GraphRecord<P: Point> {
    pub splines: Vec<SplineRecord<P>>,
    pub connections: Vec<ConnectionRecord>,
}

impl<P: Point> SplineGraph<P> {
    /// Snapshot the graph. Each connection is written once.
    pub fn to_record(&self) -> GraphRecord<P> {
        let ids: Vec<SplineId> = self.ids().collect();
        let index: HashMap<SplineId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let splines = ids
            .iter()
            .filter_map(|&id| self.get(id))
            .map(Spline::to_record)
            .collect();

        let mut connections = Vec::new();
        for (a, &id) in ids.iter().enumerate() {
            for a_end in [SplineEnd::Start, SplineEnd::End] {
                for neighbour in self.links(Endpoint::new(id, a_end)) {
                    let Some(&b) = index.get(&neighbour.spline) else {
                        continue;
                    };
                    // Keep the copy whose first endpoint sorts lower
                    if (a, a_end as u8) <= (b, neighbour.end as u8) {
                        connections.push(ConnectionRecord {
                            a,
                            a_end,
                            b,
                            b_end: neighbour.end,
                        });
                    }
                }
            }
        }

        GraphRecord {
            splines,
            connections,
        }
    }

    /// Rebuild a graph and return it with the new id of every record, in
    /// record order.
    ///
    /// A spline written by another major version is treated as absent: its
    /// slot is `None` and its connections are dropped. Any other invalid
    /// spline record fails the whole load.
    pub fn from_record(record: &GraphRecord<P>) -> Result<(Self, Vec<Option<SplineId>>)> {
        let mut graph = Self::new();
        let mut ids = Vec::with_capacity(record.splines.len());
        for (i, spline_record) in record.splines.iter().enumerate() {
            match Spline::from_record(spline_record) {
                Ok(spline) => ids.push(Some(graph.add_spline_to_graph(spline))),
                Err(SgkError::VersionMismatch { expected, found }) => {
                    warn!(
                        "skipping spline record {}: major version {} (expected {})",
                        i, found, expected
                    );
                    ids.push(None);
                }
                Err(e) => return Err(e),
            }
        }

        for c in &record.connections {
            let a = ids.get(c.a).copied().flatten();
            let b = ids.get(c.b).copied().flatten();
            match (a, b) {
                (Some(a), Some(b)) => {
                    graph.connect(Endpoint::new(a, c.a_end), Endpoint::new(b, c.b_end))?
                }
                _ => warn!("dropping connection {:?}: spline not loaded", c),
            }
        }
        Ok((graph, ids))
    }
}
