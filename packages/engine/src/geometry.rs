//! Planar location curves and constant perpendicular offsets.
//!
//! Wall location curves live in the plan (XY) plane; elevations are carried
//! separately by [`crate::types::VerticalConstraints`]. Offsets are signed:
//! a positive distance moves the curve to the left of its run direction.

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lengths below this are treated as zero.
const GEOMETRY_EPSILON: f64 = 1e-9;

/// Errors raised when a curve cannot be measured or offset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The curve has no usable extent.
    #[error("Degenerate {kind} curve: {reason}")]
    Degenerate { kind: &'static str, reason: String },

    /// The offset crosses the arc's center.
    #[error("Offset of {offset:.3} mm collapses an arc of radius {radius:.3} mm")]
    OffsetTooLarge { offset: f64, radius: f64 },

    /// The offset polyline folds back on itself.
    #[error("Offset polyline folds over itself near vertex {vertex}")]
    FoldedOffset { vertex: usize },

    /// The curve type has no constant-offset construction.
    #[error("A {0} curve cannot be offset")]
    NotOffsettable(&'static str),
}

/// A wall location curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Curve {
    /// Straight segment.
    Line {
        start: Point2<f64>,
        end: Point2<f64>,
    },
    /// Circular arc; `sweep` is signed, positive is counter-clockwise.
    Arc {
        center: Point2<f64>,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
    /// Connected straight segments.
    Polyline { points: Vec<Point2<f64>> },
    /// Free-form spline, described by its control points.
    Spline { control_points: Vec<Point2<f64>> },
}

impl Curve {
    /// Straight line between two points.
    #[must_use]
    pub fn line(start: (f64, f64), end: (f64, f64)) -> Self {
        Self::Line {
            start: Point2::new(start.0, start.1),
            end: Point2::new(end.0, end.1),
        }
    }

    /// Arc around `center`; angles in radians.
    #[must_use]
    pub fn arc(center: (f64, f64), radius: f64, start_angle: f64, sweep: f64) -> Self {
        Self::Arc {
            center: Point2::new(center.0, center.1),
            radius,
            start_angle,
            sweep,
        }
    }

    /// Polyline through the given vertices.
    #[must_use]
    pub fn polyline(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self::Polyline {
            points: points.into_iter().map(|(x, y)| Point2::new(x, y)).collect(),
        }
    }

    /// Name of the curve type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line { .. } => "line",
            Self::Arc { .. } => "arc",
            Self::Polyline { .. } => "polyline",
            Self::Spline { .. } => "spline",
        }
    }

    /// Check that the curve has a measurable extent.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let kind = self.kind();
        let degenerate = |reason: &str| GeometryError::Degenerate {
            kind,
            reason: reason.to_string(),
        };
        if !self.is_finite() {
            return Err(degenerate("coordinates and angles must be finite"));
        }
        match self {
            Self::Line { start, end } => {
                if (end - start).norm() <= GEOMETRY_EPSILON {
                    return Err(degenerate("start and end coincide"));
                }
            }
            Self::Arc { radius, sweep, .. } => {
                if *radius <= GEOMETRY_EPSILON {
                    return Err(degenerate("radius must be positive"));
                }
                if sweep.abs() <= GEOMETRY_EPSILON || sweep.abs() > TAU {
                    return Err(degenerate("sweep must be within (0, 2π]"));
                }
            }
            Self::Polyline { points } | Self::Spline { control_points: points } => {
                if points.len() < 2 {
                    return Err(degenerate("at least two points are required"));
                }
                if let Some(index) = points
                    .windows(2)
                    .position(|pair| (pair[1] - pair[0]).norm() <= GEOMETRY_EPSILON)
                {
                    return Err(degenerate(&format!("segment {index} has zero length")));
                }
            }
        }
        Ok(())
    }

    /// Whether every coordinate, radius and angle is a finite number.
    fn is_finite(&self) -> bool {
        let finite = |p: &Point2<f64>| p.x.is_finite() && p.y.is_finite();
        match self {
            Self::Line { start, end } => finite(start) && finite(end),
            Self::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => {
                finite(center) && radius.is_finite() && start_angle.is_finite() && sweep.is_finite()
            }
            Self::Polyline { points } | Self::Spline { control_points: points } => {
                points.iter().all(finite)
            }
        }
    }

    /// Length of the curve. Splines are measured along their control polygon.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Line { start, end } => (end - start).norm(),
            Self::Arc { radius, sweep, .. } => radius * sweep.abs(),
            Self::Polyline { points } | Self::Spline { control_points: points } => points
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).norm())
                .sum(),
        }
    }

    /// First point of the curve.
    #[must_use]
    pub fn start_point(&self) -> Point2<f64> {
        self.point_at(0.0)
    }

    /// Last point of the curve.
    #[must_use]
    pub fn end_point(&self) -> Point2<f64> {
        self.point_at(self.length())
    }

    /// Point at a distance along the curve, clamped to its extent.
    #[must_use]
    pub fn point_at(&self, station: f64) -> Point2<f64> {
        // Must not panic when the length is NaN.
        let station = station.min(self.length()).max(0.0);
        match self {
            Self::Line { start, end } => {
                let run = end - start;
                let length = run.norm();
                if length <= GEOMETRY_EPSILON {
                    return *start;
                }
                start + run * (station / length)
            }
            Self::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => {
                let angle = start_angle + sweep.signum() * station / radius;
                center + Vector2::new(radius * angle.cos(), radius * angle.sin())
            }
            Self::Polyline { points } | Self::Spline { control_points: points } => {
                let mut remaining = station;
                for pair in points.windows(2) {
                    let run = pair[1] - pair[0];
                    let length = run.norm();
                    if remaining <= length && length > GEOMETRY_EPSILON {
                        return pair[0] + run * (remaining / length);
                    }
                    remaining -= length;
                }
                points.last().copied().unwrap_or_else(Point2::origin)
            }
        }
    }

    /// Station of the point on the curve closest to `point`.
    #[must_use]
    pub fn project(&self, point: &Point2<f64>) -> f64 {
        match self {
            Self::Line { start, end } => project_on_segment(start, end, point).0,
            Self::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => {
                let to_point = point - center;
                if to_point.norm() <= GEOMETRY_EPSILON {
                    return 0.0;
                }
                let angle = to_point.y.atan2(to_point.x);
                let span = sweep.abs();
                let relative = ((angle - start_angle) * sweep.signum()).rem_euclid(TAU);
                let along = if relative <= span {
                    relative
                } else if relative - span < TAU - relative {
                    span
                } else {
                    0.0
                };
                along * radius
            }
            Self::Polyline { points } | Self::Spline { control_points: points } => {
                let mut best_station = 0.0;
                let mut best_distance = f64::INFINITY;
                let mut walked = 0.0;
                for pair in points.windows(2) {
                    let (along, distance) = project_on_segment(&pair[0], &pair[1], point);
                    if distance < best_distance {
                        best_distance = distance;
                        best_station = walked + along;
                    }
                    walked += (pair[1] - pair[0]).norm();
                }
                best_station
            }
        }
    }

    /// Curve parallel to this one at a constant perpendicular distance.
    ///
    /// Positive distances move to the left of the run direction. The offset
    /// is constant along the whole curve, so arcs stay concentric and
    /// polyline corners are re-mitered.
    pub fn offset(&self, distance: f64) -> Result<Curve, GeometryError> {
        self.validate()?;
        match self {
            Self::Line { start, end } => {
                let shift = left_normal(&(end - start).normalize()) * distance;
                Ok(Self::Line {
                    start: start + shift,
                    end: end + shift,
                })
            }
            Self::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => {
                // Left of a counter-clockwise arc points at the center.
                let new_radius = radius - sweep.signum() * distance;
                if new_radius <= GEOMETRY_EPSILON {
                    return Err(GeometryError::OffsetTooLarge {
                        offset: distance,
                        radius: *radius,
                    });
                }
                Ok(Self::Arc {
                    center: *center,
                    radius: new_radius,
                    start_angle: *start_angle,
                    sweep: *sweep,
                })
            }
            Self::Polyline { points } => offset_polyline(points, distance),
            Self::Spline { .. } => Err(GeometryError::NotOffsettable(self.kind())),
        }
    }
}

/// Left-hand normal of a unit direction.
fn left_normal(direction: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-direction.y, direction.x)
}

/// Returns (station along segment, distance from segment) of the closest point.
fn project_on_segment(start: &Point2<f64>, end: &Point2<f64>, point: &Point2<f64>) -> (f64, f64) {
    let run = end - start;
    let length = run.norm();
    if length <= GEOMETRY_EPSILON {
        return (0.0, (point - start).norm());
    }
    let direction = run / length;
    let along = (point - start).dot(&direction).clamp(0.0, length);
    let closest = start + direction * along;
    (along, (point - closest).norm())
}

fn offset_polyline(points: &[Point2<f64>], distance: f64) -> Result<Curve, GeometryError> {
    let directions: Vec<Vector2<f64>> = points
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).normalize())
        .collect();

    let mut offset_points = Vec::with_capacity(points.len());
    offset_points.push(points[0] + left_normal(&directions[0]) * distance);

    for vertex in 1..points.len() - 1 {
        let incoming = directions[vertex - 1];
        let outgoing = directions[vertex];
        let incoming_anchor = points[vertex - 1] + left_normal(&incoming) * distance;
        let outgoing_anchor = points[vertex] + left_normal(&outgoing) * distance;

        let cross = incoming.perp(&outgoing);
        if cross.abs() <= GEOMETRY_EPSILON {
            if incoming.dot(&outgoing) < 0.0 {
                return Err(GeometryError::FoldedOffset { vertex });
            }
            offset_points.push(outgoing_anchor);
            continue;
        }

        // Intersect the two offset lines.
        let t = (outgoing_anchor - incoming_anchor).perp(&outgoing) / cross;
        offset_points.push(incoming_anchor + incoming * t);
    }

    let last = points.len() - 1;
    offset_points.push(points[last] + left_normal(&directions[last - 1]) * distance);

    for (index, pair) in offset_points.windows(2).enumerate() {
        if (pair[1] - pair[0]).dot(&directions[index]) <= GEOMETRY_EPSILON {
            return Err(GeometryError::FoldedOffset { vertex: index + 1 });
        }
    }

    Ok(Curve::Polyline {
        points: offset_points,
    })
}
