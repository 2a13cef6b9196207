use crate::error::{GeometryError, Result};
use crate::math::{Aabb, Point3, Vector3, Vector4, GEOMETRIC_EPS, NUMERIC_EPS};

use super::basis::{basis_derivatives, find_span};
use super::knots::{
    elevate_degree_hom, from_homogeneous, insert_knot_hom, multiplicity, split_hom, to_homogeneous,
};

/// Position and first two derivatives of a curve at a parameter value.
#[derive(Debug, Clone, Copy)]
pub struct CurvePoint {
    /// The evaluated position.
    pub point: Point3,
    /// First derivative with respect to the curve parameter.
    pub derivative: Vector3,
    /// Second derivative with respect to the curve parameter.
    pub second_derivative: Vector3,
}

/// A non-uniform rational B-spline curve.
///
/// Invariant: `knots.len() == control_points.len() + degree + 1`, knots
/// non-decreasing, degree at least 1, weights (when present) positive and
/// matching the control-point count. Values of this type always satisfy
/// these invariants; violations are rejected at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve {
    control_points: Vec<Point3>,
    weights: Option<Vec<f64>>,
    knots: Vec<f64>,
    degree: usize,
}

impl NurbsCurve {
    /// Creates a curve, validating all structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] describing the first violated invariant:
    /// degree, control-point count, knot-vector length or monotonicity,
    /// weight count or sign, or non-finite coordinates.
    pub fn new(
        control_points: Vec<Point3>,
        knots: Vec<f64>,
        degree: usize,
        weights: Option<Vec<f64>>,
    ) -> Result<Self> {
        if degree < 1 {
            return Err(GeometryError::InvalidDegree { degree }.into());
        }
        if control_points.len() < degree + 1 {
            return Err(GeometryError::TooFewControlPoints {
                required: degree + 1,
                degree,
                actual: control_points.len(),
            }
            .into());
        }
        let expected = control_points.len() + degree + 1;
        if knots.len() != expected {
            return Err(GeometryError::KnotVectorLength {
                expected,
                actual: knots.len(),
            }
            .into());
        }
        for (index, p) in control_points.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(GeometryError::NonFiniteCoordinate { index }.into());
            }
        }
        for (index, pair) in knots.windows(2).enumerate() {
            if !pair[1].is_finite() {
                return Err(GeometryError::NonFiniteCoordinate { index: index + 1 }.into());
            }
            if pair[1] < pair[0] {
                return Err(GeometryError::KnotVectorDecreasing { index: index + 1 }.into());
            }
        }
        if let Some(ws) = &weights {
            if ws.len() != control_points.len() {
                return Err(GeometryError::WeightCount {
                    expected: control_points.len(),
                    actual: ws.len(),
                }
                .into());
            }
            for (index, &w) in ws.iter().enumerate() {
                if !w.is_finite() || w <= 0.0 {
                    return Err(GeometryError::NonPositiveWeight { index }.into());
                }
            }
        }
        let n = control_points.len();
        if knots[n] - knots[degree] < NUMERIC_EPS {
            return Err(GeometryError::Degenerate("empty knot domain".to_owned()).into());
        }
        Ok(Self {
            control_points,
            weights,
            knots,
            degree,
        })
    }

    /// Creates a clamped curve with a uniform interior knot vector.
    ///
    /// # Errors
    ///
    /// Returns an error when fewer than `degree + 1` control points are
    /// supplied or the degree is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn clamped(control_points: Vec<Point3>, degree: usize) -> Result<Self> {
        if degree < 1 {
            return Err(GeometryError::InvalidDegree { degree }.into());
        }
        let n = control_points.len();
        if n < degree + 1 {
            return Err(GeometryError::TooFewControlPoints {
                required: degree + 1,
                degree,
                actual: n,
            }
            .into());
        }
        let interior = n - degree - 1;
        let mut knots = Vec::with_capacity(n + degree + 1);
        knots.extend(std::iter::repeat(0.0).take(degree + 1));
        for i in 1..=interior {
            knots.push(i as f64 / (interior + 1) as f64);
        }
        knots.extend(std::iter::repeat(1.0).take(degree + 1));
        Self::new(control_points, knots, degree, None)
    }

    /// Creates a degree-1 segment from `a` to `b`.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite endpoints.
    pub fn line(a: Point3, b: Point3) -> Result<Self> {
        Self::new(vec![a, b], vec![0.0, 0.0, 1.0, 1.0], 1, None)
    }

    /// Creates a full circle in the XY plane as a rational quadratic with
    /// nine control points (four quarter arcs).
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for a non-positive radius.
    pub fn circle(center: Point3, radius: f64) -> Result<Self> {
        if radius <= GEOMETRIC_EPS {
            return Err(
                GeometryError::Degenerate(format!("circle radius {radius} is not positive")).into(),
            );
        }
        let (cx, cy, cz) = (center.x, center.y, center.z);
        let r = radius;
        let control_points = vec![
            Point3::new(cx + r, cy, cz),
            Point3::new(cx + r, cy + r, cz),
            Point3::new(cx, cy + r, cz),
            Point3::new(cx - r, cy + r, cz),
            Point3::new(cx - r, cy, cz),
            Point3::new(cx - r, cy - r, cz),
            Point3::new(cx, cy - r, cz),
            Point3::new(cx + r, cy - r, cz),
            Point3::new(cx + r, cy, cz),
        ];
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let weights = vec![1.0, s, 1.0, s, 1.0, s, 1.0, s, 1.0];
        let knots = vec![
            0.0, 0.0, 0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0,
        ];
        Self::new(control_points, knots, 2, Some(weights))
    }

    /// Returns the control points.
    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    /// Returns the weights, or `None` for a non-rational curve.
    #[must_use]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Returns the knot vector.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Returns the degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns whether the curve carries non-trivial weights.
    #[must_use]
    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    /// Returns the parameter domain `(start, end)`.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (
            self.knots[self.degree],
            self.knots[self.control_points.len()],
        )
    }

    /// Returns whether both end knots have multiplicity `degree + 1`, i.e.
    /// the curve interpolates its end control points.
    #[must_use]
    pub fn is_clamped(&self) -> bool {
        let (start, end) = self.domain();
        multiplicity(&self.knots, start) >= self.degree + 1
            && multiplicity(&self.knots, end) >= self.degree + 1
    }

    /// Returns whether the curve endpoints coincide.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let (u0, u1) = self.domain();
        (self.point_at(u1) - self.point_at(u0)).norm() < GEOMETRIC_EPS
    }

    /// Evaluates position and first two derivatives at `u`.
    ///
    /// Out-of-domain parameters are clamped to the knot domain. Rational
    /// projection guards near-zero weight sums, returning a degenerate but
    /// finite result rather than NaN.
    #[must_use]
    pub fn evaluate(&self, u: f64) -> CurvePoint {
        let (u0, u1) = self.domain();
        let u = u.clamp(u0, u1);
        let n = self.control_points.len() - 1;
        let span = find_span(n, self.degree, u, &self.knots);
        let ders = basis_derivatives(span, u, self.degree, &self.knots, 2);

        let mut cw = [Vector4::zeros(); 3];
        for (k, der) in ders.iter().enumerate().take(3) {
            for (j, &basis) in der.iter().enumerate() {
                let idx = span - self.degree + j;
                let w = self.weights.as_ref().map_or(1.0, |ws| ws[idx]);
                let p = &self.control_points[idx];
                cw[k] += Vector4::new(p.x * w, p.y * w, p.z * w, w) * basis;
            }
        }

        let w0 = cw[0].w;
        let inv_w = if w0.abs() < NUMERIC_EPS { 1.0 } else { 1.0 / w0 };

        let a0 = Vector3::new(cw[0].x, cw[0].y, cw[0].z);
        let point = Point3::from(a0 * inv_w);

        let a1 = Vector3::new(cw[1].x, cw[1].y, cw[1].z);
        let derivative = (a1 - point.coords * cw[1].w) * inv_w;

        let a2 = Vector3::new(cw[2].x, cw[2].y, cw[2].z);
        let second_derivative =
            (a2 - derivative * (2.0 * cw[1].w) - point.coords * cw[2].w) * inv_w;

        CurvePoint {
            point,
            derivative,
            second_derivative,
        }
    }

    /// Evaluates the position only.
    #[must_use]
    pub fn point_at(&self, u: f64) -> Point3 {
        self.evaluate(u).point
    }

    /// Inserts knot `u`, adding one control point without changing shape.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParameterOutOfRange`] when `u` lies outside
    /// the open knot domain, or [`GeometryError::Degenerate`] when the knot
    /// already has full multiplicity.
    pub fn insert_knot(&self, u: f64) -> Result<Self> {
        let (u0, u1) = self.domain();
        if u <= u0 + GEOMETRIC_EPS || u >= u1 - GEOMETRIC_EPS {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "u",
                value: u,
                min: u0,
                max: u1,
            }
            .into());
        }
        if multiplicity(&self.knots, u) >= self.degree {
            return Err(GeometryError::Degenerate(format!(
                "knot {u} already has multiplicity {}",
                self.degree
            ))
            .into());
        }

        let hpoints = to_homogeneous(&self.control_points, self.weights.as_deref());
        let (new_hpoints, new_knots) = insert_knot_hom(&hpoints, &self.knots, self.degree, u);
        let (control_points, weights) = from_homogeneous(&new_hpoints);
        Self::new(control_points, new_knots, self.degree, weights)
    }

    /// Raises the degree by one while preserving the evaluated shape.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for unclamped curves.
    pub fn elevate_degree(&self) -> Result<Self> {
        if !self.is_clamped() {
            return Err(GeometryError::Degenerate(
                "degree elevation requires a clamped curve".to_owned(),
            )
            .into());
        }
        let hpoints = to_homogeneous(&self.control_points, self.weights.as_deref());
        let (new_hpoints, new_knots) = elevate_degree_hom(&hpoints, &self.knots, self.degree);
        let (control_points, weights) = from_homogeneous(&new_hpoints);
        Self::new(control_points, new_knots, self.degree + 1, weights)
    }

    /// Splits at `u` into two independently valid curves.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParameterOutOfRange`] when `u` is not
    /// strictly inside the knot domain.
    pub fn split(&self, u: f64) -> Result<(Self, Self)> {
        let (u0, u1) = self.domain();
        if u <= u0 + GEOMETRIC_EPS || u >= u1 - GEOMETRIC_EPS {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "u",
                value: u,
                min: u0,
                max: u1,
            }
            .into());
        }

        let hpoints = to_homogeneous(&self.control_points, self.weights.as_deref());
        let ((lp, lk), (rp, rk)) = split_hom(&hpoints, &self.knots, self.degree, u);
        let (left_points, left_weights) = from_homogeneous(&lp);
        let (right_points, right_weights) = from_homogeneous(&rp);
        Ok((
            Self::new(left_points, lk, self.degree, left_weights)?,
            Self::new(right_points, rk, self.degree, right_weights)?,
        ))
    }

    /// Bounding box of the control polygon, which contains the curve by
    /// the convex-hull property.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.control_points)
            .unwrap_or(Aabb::new(Point3::origin(), Point3::origin()))
    }
}
