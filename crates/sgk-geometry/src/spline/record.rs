//! Versioned, serde-friendly snapshot of a spline.

use serde::{Deserialize, Serialize};
use sgk_core::{Result, SgkError};
use sgk_math::Point;

use super::{BezierString, ClampedBSpline, Continuity, Spline, SplineCurve, SplineType};

/// Bumped when a record can no longer be read by older code.
pub const SPLINE_RECORD_MAJOR_VERSION: u32 = 1;
/// Bumped for backward compatible additions.
pub const SPLINE_RECORD_MINOR_VERSION: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "P: Serialize, P::Hom: Serialize",
    deserialize = "P: Deserialize<'de>, P::Hom: Deserialize<'de>"
))]
pub struct SplineRecord<P: Point> {
    pub major_version: u32,
    pub minor_version: u32,
    pub spline_type: SplineType,
    pub payload: SplinePayload<P>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "P: Serialize, P::Hom: Serialize",
    deserialize = "P: Deserialize<'de>, P::Hom: Deserialize<'de>"
))]
pub enum SplinePayload<P: Point> {
    ClampedBSpline {
        degree: usize,
        control_points: Vec<P::Hom>,
        knots: Vec<f64>,
    },
    BezierString {
        positions: Vec<P>,
        prev_handles: Vec<P>,
        next_handles: Vec<P>,
        params: Vec<f64>,
        continuity: Vec<Continuity>,
    },
}

impl<P: Point> Spline<P> {
    pub fn to_record(&self) -> SplineRecord<P> {
        let payload = match self {
            Spline::ClampedBSpline(s) => SplinePayload::ClampedBSpline {
                degree: s.degree(),
                control_points: s.homogeneous_points(),
                knots: s.knots().to_vec(),
            },
            Spline::BezierString(s) => SplinePayload::BezierString {
                positions: s.ctrl_points(),
                prev_handles: s.ctrl_points_prev(),
                next_handles: s.ctrl_points_next(),
                params: s.params(),
                continuity: s.continuities(),
            },
        };
        SplineRecord {
            major_version: SPLINE_RECORD_MAJOR_VERSION,
            minor_version: SPLINE_RECORD_MINOR_VERSION,
            spline_type: self.spline_type(),
            payload,
        }
    }

    /// Rebuild a spline. Records from another major version are rejected.
    pub fn from_record(record: &SplineRecord<P>) -> Result<Self> {
        if record.major_version != SPLINE_RECORD_MAJOR_VERSION {
            return Err(SgkError::VersionMismatch {
                expected: SPLINE_RECORD_MAJOR_VERSION,
                found: record.major_version,
            });
        }
        let spline: Self = match &record.payload {
            SplinePayload::ClampedBSpline {
                degree,
                control_points,
                knots,
            } => ClampedBSpline::from_homogeneous(*degree, control_points.clone(), knots.clone())?
                .into(),
            SplinePayload::BezierString {
                positions,
                prev_handles,
                next_handles,
                params,
                continuity,
            } => BezierString::from_parts(positions, prev_handles, next_handles, params, continuity)?
                .into(),
        };
        if spline.spline_type() != record.spline_type {
            return Err(SgkError::InvalidOperation(format!(
                "record tagged {:?} carries a {:?} payload",
                record.spline_type,
                spline.spline_type()
            )));
        }
        Ok(spline)
    }
}
