use crate::error::{GeometryError, Result};
use crate::math::{
    normalize_or_zero, Aabb, Point3, Vector3, Vector4, GEOMETRIC_EPS, NUMERIC_EPS,
};

use super::basis::{basis_derivatives, find_span};
use super::curve::NurbsCurve;
use super::knots::{from_homogeneous, insert_knot_hom, split_hom, to_homogeneous};

/// Position and first partial derivatives of a surface at `(u, v)`.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    /// The evaluated position.
    pub point: Point3,
    /// Partial derivative with respect to `u`.
    pub du: Vector3,
    /// Partial derivative with respect to `v`.
    pub dv: Vector3,
}

/// A non-uniform rational B-spline surface.
///
/// Control points form a rectangular grid indexed `[u][v]`; the knot
/// vector invariant of [`NurbsCurve`] holds independently per parametric
/// direction.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSurface {
    control_points: Vec<Vec<Point3>>,
    weights: Option<Vec<Vec<f64>>>,
    knots_u: Vec<f64>,
    knots_v: Vec<f64>,
    degree_u: usize,
    degree_v: usize,
}

impl NurbsSurface {
    /// Creates a surface, validating the grid and both knot vectors.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] for a ragged or undersized grid, a
    /// knot-vector violation in either direction, or bad weights.
    pub fn new(
        control_points: Vec<Vec<Point3>>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        degree_u: usize,
        degree_v: usize,
        weights: Option<Vec<Vec<f64>>>,
    ) -> Result<Self> {
        if degree_u < 1 {
            return Err(GeometryError::InvalidDegree { degree: degree_u }.into());
        }
        if degree_v < 1 {
            return Err(GeometryError::InvalidDegree { degree: degree_v }.into());
        }

        let nu = control_points.len();
        if nu < degree_u + 1 {
            return Err(GeometryError::TooFewControlPoints {
                required: degree_u + 1,
                degree: degree_u,
                actual: nu,
            }
            .into());
        }
        let nv = control_points.first().map_or(0, Vec::len);
        if nv < degree_v + 1 {
            return Err(GeometryError::TooFewControlPoints {
                required: degree_v + 1,
                degree: degree_v,
                actual: nv,
            }
            .into());
        }
        for row in &control_points {
            if row.len() != nv {
                return Err(GeometryError::Degenerate(
                    "control point grid is not rectangular".to_owned(),
                )
                .into());
            }
        }

        validate_knots(&knots_u, nu, degree_u)?;
        validate_knots(&knots_v, nv, degree_v)?;

        if let Some(ws) = &weights {
            if ws.len() != nu || ws.iter().any(|row| row.len() != nv) {
                return Err(GeometryError::WeightCount {
                    expected: nu * nv,
                    actual: ws.iter().map(Vec::len).sum(),
                }
                .into());
            }
            for (i, row) in ws.iter().enumerate() {
                for (j, &w) in row.iter().enumerate() {
                    if !w.is_finite() || w <= 0.0 {
                        return Err(GeometryError::NonPositiveWeight { index: i * nv + j }.into());
                    }
                }
            }
        }

        Ok(Self {
            control_points,
            weights,
            knots_u,
            knots_v,
            degree_u,
            degree_v,
        })
    }

    /// Creates a bilinear patch through four corner points.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite corners.
    pub fn bilinear(p00: Point3, p10: Point3, p01: Point3, p11: Point3) -> Result<Self> {
        Self::new(
            vec![vec![p00, p01], vec![p10, p11]],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            1,
            1,
            None,
        )
    }

    /// Creates the surface swept by translating `profile` along
    /// `direction`: U follows the profile, V is linear along the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] for a zero sweep direction.
    pub fn extruded(profile: &NurbsCurve, direction: Vector3) -> Result<Self> {
        if direction.norm() < GEOMETRIC_EPS {
            return Err(GeometryError::ZeroVector.into());
        }
        let control_points = profile
            .control_points()
            .iter()
            .map(|p| vec![*p, p + direction])
            .collect();
        let weights = profile
            .weights()
            .map(|ws| ws.iter().map(|&w| vec![w, w]).collect());
        Self::new(
            control_points,
            profile.knots().to_vec(),
            vec![0.0, 0.0, 1.0, 1.0],
            profile.degree(),
            1,
            weights,
        )
    }

    /// Returns the control-point grid, indexed `[u][v]`.
    #[must_use]
    pub fn control_points(&self) -> &[Vec<Point3>] {
        &self.control_points
    }

    /// Returns the weight grid, or `None` for a non-rational surface.
    #[must_use]
    pub fn weights(&self) -> Option<&[Vec<f64>]> {
        self.weights.as_deref()
    }

    /// Returns the U knot vector.
    #[must_use]
    pub fn knots_u(&self) -> &[f64] {
        &self.knots_u
    }

    /// Returns the V knot vector.
    #[must_use]
    pub fn knots_v(&self) -> &[f64] {
        &self.knots_v
    }

    /// Returns the U degree.
    #[must_use]
    pub fn degree_u(&self) -> usize {
        self.degree_u
    }

    /// Returns the V degree.
    #[must_use]
    pub fn degree_v(&self) -> usize {
        self.degree_v
    }

    /// Returns the parameter domain `((u0, u1), (v0, v1))`.
    #[must_use]
    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (
            (
                self.knots_u[self.degree_u],
                self.knots_u[self.control_points.len()],
            ),
            (
                self.knots_v[self.degree_v],
                self.knots_v[self.control_points[0].len()],
            ),
        )
    }

    /// Evaluates position and first partial derivatives at `(u, v)`.
    ///
    /// Out-of-domain parameters clamp to the knot domain; rational
    /// projection is guarded against vanishing weight sums.
    #[must_use]
    pub fn evaluate(&self, u: f64, v: f64) -> SurfacePoint {
        let ((u0, u1), (v0, v1)) = self.domain();
        let u = u.clamp(u0, u1);
        let v = v.clamp(v0, v1);

        let nu = self.control_points.len();
        let nv = self.control_points[0].len();

        let span_u = find_span(nu - 1, self.degree_u, u, &self.knots_u);
        let span_v = find_span(nv - 1, self.degree_v, v, &self.knots_v);
        let ders_u = basis_derivatives(span_u, u, self.degree_u, &self.knots_u, 1);
        let ders_v = basis_derivatives(span_v, v, self.degree_v, &self.knots_v, 1);

        // Homogeneous sums: value, d/du, d/dv.
        let mut sw = [Vector4::zeros(); 3];
        for (a, nu_der) in ders_u.iter().enumerate().take(2) {
            for (b, nv_der) in ders_v.iter().enumerate().take(2) {
                let target = match (a, b) {
                    (0, 0) => 0,
                    (1, 0) => 1,
                    (0, 1) => 2,
                    _ => continue,
                };
                let mut acc = Vector4::zeros();
                for (i, &bu) in nu_der.iter().enumerate() {
                    let ui = span_u - self.degree_u + i;
                    for (j, &bv) in nv_der.iter().enumerate() {
                        let vj = span_v - self.degree_v + j;
                        let w = self.weights.as_ref().map_or(1.0, |ws| ws[ui][vj]);
                        let p = &self.control_points[ui][vj];
                        acc += Vector4::new(p.x * w, p.y * w, p.z * w, w) * (bu * bv);
                    }
                }
                sw[target] = acc;
            }
        }

        let w00 = sw[0].w;
        let inv_w = if w00.abs() < NUMERIC_EPS { 1.0 } else { 1.0 / w00 };

        let point = Point3::from(Vector3::new(sw[0].x, sw[0].y, sw[0].z) * inv_w);
        let du = (Vector3::new(sw[1].x, sw[1].y, sw[1].z) - point.coords * sw[1].w) * inv_w;
        let dv = (Vector3::new(sw[2].x, sw[2].y, sw[2].z) - point.coords * sw[2].w) * inv_w;

        SurfacePoint { point, du, dv }
    }

    /// Evaluates the position only.
    #[must_use]
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.evaluate(u, v).point
    }

    /// Unit surface normal at `(u, v)`, or the zero vector where the
    /// partial derivatives are degenerate.
    #[must_use]
    pub fn normal(&self, u: f64, v: f64) -> Vector3 {
        let sp = self.evaluate(u, v);
        normalize_or_zero(sp.du.cross(&sp.dv))
    }

    /// Returns the surface with parametric directions exchanged.
    #[must_use]
    pub fn transposed(&self) -> Self {
        let nu = self.control_points.len();
        let nv = self.control_points[0].len();
        let control_points = (0..nv)
            .map(|j| (0..nu).map(|i| self.control_points[i][j]).collect())
            .collect();
        let weights = self.weights.as_ref().map(|ws| {
            (0..nv)
                .map(|j| (0..nu).map(|i| ws[i][j]).collect())
                .collect()
        });
        Self {
            control_points,
            weights,
            knots_u: self.knots_v.clone(),
            knots_v: self.knots_u.clone(),
            degree_u: self.degree_v,
            degree_v: self.degree_u,
        }
    }

    /// Inserts a knot in the V direction without changing shape.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParameterOutOfRange`] for a parameter
    /// outside the open V domain.
    pub fn insert_knot_v(&self, v: f64) -> Result<Self> {
        let (_, (v0, v1)) = self.domain();
        if v <= v0 + GEOMETRIC_EPS || v >= v1 - GEOMETRIC_EPS {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "v",
                value: v,
                min: v0,
                max: v1,
            }
            .into());
        }

        let mut new_grid = Vec::with_capacity(self.control_points.len());
        let mut new_wgrid: Option<Vec<Vec<f64>>> =
            self.weights.is_some().then(|| Vec::with_capacity(self.control_points.len()));
        let mut new_knots = self.knots_v.clone();

        for (i, row) in self.control_points.iter().enumerate() {
            let wrow = self.weights.as_ref().map(|ws| ws[i].as_slice());
            let hrow = to_homogeneous(row, wrow);
            let (hnew, knew) = insert_knot_hom(&hrow, &self.knots_v, self.degree_v, v);
            let (points, weights) = from_homogeneous(&hnew);
            new_grid.push(points);
            if let Some(wgrid) = &mut new_wgrid {
                wgrid.push(weights.unwrap_or_else(|| vec![1.0; hnew.len()]));
            }
            new_knots = knew;
        }

        Self::new(
            new_grid,
            self.knots_u.clone(),
            new_knots,
            self.degree_u,
            self.degree_v,
            new_wgrid,
        )
    }

    /// Inserts a knot in the U direction without changing shape.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParameterOutOfRange`] for a parameter
    /// outside the open U domain.
    pub fn insert_knot_u(&self, u: f64) -> Result<Self> {
        Ok(self.transposed().insert_knot_v(u)?.transposed())
    }

    /// Splits along a constant-V line into two independently valid
    /// surfaces covering `[v0, v]` and `[v, v1]`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParameterOutOfRange`] for a parameter not
    /// strictly inside the V domain.
    pub fn split_v(&self, v: f64) -> Result<(Self, Self)> {
        let (_, (v0, v1)) = self.domain();
        if v <= v0 + GEOMETRIC_EPS || v >= v1 - GEOMETRIC_EPS {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "v",
                value: v,
                min: v0,
                max: v1,
            }
            .into());
        }

        let mut left_grid = Vec::with_capacity(self.control_points.len());
        let mut right_grid = Vec::with_capacity(self.control_points.len());
        let mut left_wgrid: Option<Vec<Vec<f64>>> = self.weights.is_some().then(Vec::new);
        let mut right_wgrid: Option<Vec<Vec<f64>>> = self.weights.is_some().then(Vec::new);
        let mut left_knots = Vec::new();
        let mut right_knots = Vec::new();

        for (i, row) in self.control_points.iter().enumerate() {
            let wrow = self.weights.as_ref().map(|ws| ws[i].as_slice());
            let hrow = to_homogeneous(row, wrow);
            let ((lp, lk), (rp, rk)) = split_hom(&hrow, &self.knots_v, self.degree_v, v);
            let (lpts, lws) = from_homogeneous(&lp);
            let (rpts, rws) = from_homogeneous(&rp);
            if let Some(wgrid) = &mut left_wgrid {
                wgrid.push(lws.unwrap_or_else(|| vec![1.0; lpts.len()]));
            }
            if let Some(wgrid) = &mut right_wgrid {
                wgrid.push(rws.unwrap_or_else(|| vec![1.0; rpts.len()]));
            }
            left_grid.push(lpts);
            right_grid.push(rpts);
            left_knots = lk;
            right_knots = rk;
        }

        Ok((
            Self::new(
                left_grid,
                self.knots_u.clone(),
                left_knots,
                self.degree_u,
                self.degree_v,
                left_wgrid,
            )?,
            Self::new(
                right_grid,
                self.knots_u.clone(),
                right_knots,
                self.degree_u,
                self.degree_v,
                right_wgrid,
            )?,
        ))
    }

    /// Splits along a constant-U line into two independently valid
    /// surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParameterOutOfRange`] for a parameter not
    /// strictly inside the U domain.
    pub fn split_u(&self, u: f64) -> Result<(Self, Self)> {
        let (left, right) = self.transposed().split_v(u)?;
        Ok((left.transposed(), right.transposed()))
    }

    /// Bounding box of the control grid, which contains the surface by
    /// the convex-hull property.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        let flat: Vec<Point3> = self.control_points.iter().flatten().copied().collect();
        Aabb::from_points(&flat).unwrap_or(Aabb::new(Point3::origin(), Point3::origin()))
    }
}

fn validate_knots(knots: &[f64], point_count: usize, degree: usize) -> Result<()> {
    let expected = point_count + degree + 1;
    if knots.len() != expected {
        return Err(GeometryError::KnotVectorLength {
            expected,
            actual: knots.len(),
        }
        .into());
    }
    for (index, pair) in knots.windows(2).enumerate() {
        if !pair[1].is_finite() {
            return Err(GeometryError::NonFiniteCoordinate { index: index + 1 }.into());
        }
        if pair[1] < pair[0] {
            return Err(GeometryError::KnotVectorDecreasing { index: index + 1 }.into());
        }
    }
    if knots[point_count] - knots[degree] < NUMERIC_EPS {
        return Err(GeometryError::Degenerate("empty knot domain".to_owned()).into());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn patch() -> NurbsSurface {
        NurbsSurface::bilinear(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(2.0, 2.0, 2.0),
        )
        .unwrap()
    }

    fn cylinder() -> NurbsSurface {
        let circle = NurbsCurve::circle(Point3::origin(), 1.5).unwrap();
        NurbsSurface::extruded(&circle, Vector3::new(0.0, 0.0, 4.0)).unwrap()
    }

    // ── Construction ───────────────────────────────────────────

    #[test]
    fn ragged_grid_rejected() {
        let result = NurbsSurface::new(
            vec![
                vec![Point3::origin(), Point3::new(0.0, 1.0, 0.0)],
                vec![Point3::new(1.0, 0.0, 0.0)],
            ],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            1,
            1,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn knot_invariant_checked_per_direction() {
        let result = NurbsSurface::new(
            vec![
                vec![Point3::origin(), Point3::new(0.0, 1.0, 0.0)],
                vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            ],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0],
            1,
            1,
            None,
        );
        assert!(result.is_err());
    }

    // ── Evaluation ─────────────────────────────────────────────

    #[test]
    fn bilinear_corners_interpolate() {
        let s = patch();
        assert_relative_eq!(s.point_at(0.0, 0.0), Point3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(s.point_at(1.0, 0.0), Point3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(s.point_at(0.0, 1.0), Point3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(s.point_at(1.0, 1.0), Point3::new(2.0, 2.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn bilinear_center_averages() {
        let s = patch();
        assert_relative_eq!(s.point_at(0.5, 0.5), Point3::new(1.0, 1.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn out_of_domain_clamps() {
        let s = patch();
        assert_relative_eq!(s.point_at(-1.0, 2.0), s.point_at(0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn flat_patch_normal_is_z() {
        let s = NurbsSurface::bilinear(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(s.normal(0.5, 0.5), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn partial_derivatives_of_bilinear() {
        let s = patch();
        let sp = s.evaluate(0.5, 0.5);
        // du at center: P(1,v) - P(0,v) averaged = (2, 0, 1).
        assert_relative_eq!(sp.du, Vector3::new(2.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(sp.dv, Vector3::new(0.0, 2.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn cylinder_points_at_radius() {
        let cyl = cylinder();
        for i in 0..=16 {
            let u = f64::from(i) / 16.0;
            for j in 0..=4 {
                let v = f64::from(j) / 4.0;
                let p = cyl.point_at(u, v);
                let r = (p.x * p.x + p.y * p.y).sqrt();
                assert_relative_eq!(r, 1.5, epsilon = 1e-9);
                assert!(p.z >= -1e-12 && p.z <= 4.0 + 1e-12);
            }
        }
    }

    // ── Structural operations ──────────────────────────────────

    #[test]
    fn insert_knot_u_preserves_shape() {
        let cyl = cylinder();
        let inserted = cyl.insert_knot_u(0.3).unwrap();
        for i in 0..=10 {
            let u = f64::from(i) / 10.0;
            for j in 0..=5 {
                let v = f64::from(j) / 5.0;
                assert_relative_eq!(cyl.point_at(u, v), inserted.point_at(u, v), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn split_v_halves_match_original() {
        let cyl = cylinder();
        let (bottom, top) = cyl.split_v(0.5).unwrap();

        let ((_, _), (v0, v1)) = bottom.domain();
        assert_relative_eq!(v0, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v1, 0.5, epsilon = 1e-12);

        for i in 0..=8 {
            let u = f64::from(i) / 8.0;
            assert_relative_eq!(
                bottom.point_at(u, 0.25),
                cyl.point_at(u, 0.25),
                epsilon = 1e-9
            );
            assert_relative_eq!(top.point_at(u, 0.75), cyl.point_at(u, 0.75), epsilon = 1e-9);
        }
    }

    #[test]
    fn split_u_produces_valid_invariants() {
        let cyl = cylinder();
        let (a, b) = cyl.split_u(0.4).unwrap();
        assert_eq!(
            a.knots_u().len(),
            a.control_points().len() + a.degree_u() + 1
        );
        assert_eq!(
            b.knots_u().len(),
            b.control_points().len() + b.degree_u() + 1
        );
    }

    #[test]
    fn split_outside_domain_rejected() {
        assert!(patch().split_v(0.0).is_err());
        assert!(patch().split_u(1.2).is_err());
    }

    #[test]
    fn transposed_swaps_evaluation() {
        let s = patch();
        let t = s.transposed();
        assert_relative_eq!(s.point_at(0.3, 0.7), t.point_at(0.7, 0.3), epsilon = 1e-12);
    }
}
