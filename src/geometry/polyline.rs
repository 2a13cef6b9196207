use crate::error::{GeometryError, Result};
use crate::math::{Aabb, PlaneFrame, Point3, DISTANCE_EPS};

/// An ordered sequence of 3D positions with straight segments between them.
///
/// Edge `i` connects vertex `i` to vertex `i + 1` (wrapping back to vertex 0
/// for closed polylines).
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Point3>,
    closed: bool,
}

impl Polyline {
    /// Creates a polyline from a point sequence.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewVertices`] for fewer than 2 points
    /// (3 if closed), or [`GeometryError::NonFiniteCoordinate`] for NaN or
    /// infinite coordinates.
    pub fn new(points: Vec<Point3>, closed: bool) -> Result<Self> {
        let required = if closed { 3 } else { 2 };
        if points.len() < required {
            return Err(GeometryError::TooFewVertices {
                required,
                actual: points.len(),
            }
            .into());
        }
        for (index, p) in points.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(GeometryError::NonFiniteCoordinate { index }.into());
            }
        }
        Ok(Self { points, closed })
    }

    /// Returns the vertex positions.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Returns whether the last vertex connects back to the first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    /// Returns the endpoints of edge `i`, or `None` when out of range.
    #[must_use]
    pub fn edge(&self, i: usize) -> Option<(Point3, Point3)> {
        if i >= self.segment_count() {
            return None;
        }
        let a = self.points[i];
        let b = self.points[(i + 1) % self.points.len()];
        Some((a, b))
    }

    /// Total length of all segments.
    #[must_use]
    pub fn length(&self) -> f64 {
        (0..self.segment_count())
            .filter_map(|i| self.edge(i))
            .map(|(a, b)| (b - a).norm())
            .sum()
    }

    /// Returns a new polyline with the vertex order reversed.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            points,
            closed: self.closed,
        }
    }

    /// Fits a plane through the vertices and verifies coplanarity within
    /// [`DISTANCE_EPS`].
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotCoplanar`](crate::error::TopologyError::NotCoplanar)
    /// with the first offending vertex index, or a degeneracy error for
    /// collinear input.
    pub fn fitted_plane(&self) -> Result<PlaneFrame> {
        let frame = PlaneFrame::fit(&self.points)?;
        frame.check_coplanar(&self.points, DISTANCE_EPS)?;
        Ok(frame)
    }

    /// Returns the bounding box of the vertices.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        // Constructor guarantees at least two points.
        Aabb::from_points(&self.points).unwrap_or(Aabb::new(Point3::origin(), Point3::origin()))
    }
}
