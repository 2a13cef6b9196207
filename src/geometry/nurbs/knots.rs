//! Structural knot-vector operations shared by curves and surfaces.
//!
//! All operations run in homogeneous coordinates so rational and
//! non-rational geometry take the same code path. The coefficients depend
//! only on the knot vector and degree, which is what lets surfaces apply
//! the curve algorithms row- and column-wise.

use crate::math::{Point3, Vector4, GEOMETRIC_EPS, NUMERIC_EPS};

use super::basis::find_span;

/// Lifts Euclidean control points (with optional weights) into
/// homogeneous space: `(x*w, y*w, z*w, w)`.
#[must_use]
pub(crate) fn to_homogeneous(points: &[Point3], weights: Option<&[f64]>) -> Vec<Vector4> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let w = weights.map_or(1.0, |ws| ws[i]);
            Vector4::new(p.x * w, p.y * w, p.z * w, w)
        })
        .collect()
}

/// Projects homogeneous control points back to Euclidean space, returning
/// the weight vector only when it is non-trivial.
#[must_use]
pub(crate) fn from_homogeneous(hpoints: &[Vector4]) -> (Vec<Point3>, Option<Vec<f64>>) {
    let points = hpoints
        .iter()
        .map(|h| {
            if h.w.abs() < NUMERIC_EPS {
                Point3::new(h.x, h.y, h.z)
            } else {
                Point3::new(h.x / h.w, h.y / h.w, h.z / h.w)
            }
        })
        .collect();
    let rational = hpoints.iter().any(|h| (h.w - 1.0).abs() > NUMERIC_EPS);
    let weights = rational.then(|| hpoints.iter().map(|h| h.w).collect());
    (points, weights)
}

/// Returns the multiplicity of knot value `u` in `knots`.
#[must_use]
pub(crate) fn multiplicity(knots: &[f64], u: f64) -> usize {
    knots.iter().filter(|&&k| (k - u).abs() < GEOMETRIC_EPS).count()
}

/// Boehm single knot insertion.
///
/// Inserts `u` once, producing one additional control point while leaving
/// every evaluated position unchanged. Callers must ensure `u` lies in the
/// open knot domain.
#[must_use]
pub(crate) fn insert_knot_hom(
    hpoints: &[Vector4],
    knots: &[f64],
    degree: usize,
    u: f64,
) -> (Vec<Vector4>, Vec<f64>) {
    let n = hpoints.len() - 1;
    let span = find_span(n, degree, u, knots);

    let mut new_points = Vec::with_capacity(hpoints.len() + 1);
    for i in 0..=hpoints.len() {
        if i <= span - degree {
            new_points.push(hpoints[i]);
        } else if i <= span {
            let denom = knots[i + degree] - knots[i];
            let alpha = if denom.abs() < NUMERIC_EPS {
                0.0
            } else {
                (u - knots[i]) / denom
            };
            new_points.push(hpoints[i - 1] * (1.0 - alpha) + hpoints[i] * alpha);
        } else {
            new_points.push(hpoints[i - 1]);
        }
    }

    let mut new_knots = Vec::with_capacity(knots.len() + 1);
    new_knots.extend_from_slice(&knots[..=span]);
    new_knots.push(u);
    new_knots.extend_from_slice(&knots[span + 1..]);

    (new_points, new_knots)
}

/// Splits at `u` into two independently valid halves.
///
/// Inserts `u` until its multiplicity reaches the degree, then divides
/// the control polygon and knot vector at the junction point. Both halves
/// satisfy `knots.len() == points.len() + degree + 1` and are clamped
/// at the split parameter.
#[must_use]
pub(crate) fn split_hom(
    hpoints: &[Vector4],
    knots: &[f64],
    degree: usize,
    u: f64,
) -> ((Vec<Vector4>, Vec<f64>), (Vec<Vector4>, Vec<f64>)) {
    let mut points = hpoints.to_vec();
    let mut kv = knots.to_vec();

    let mult = multiplicity(&kv, u);
    for _ in mult..degree {
        let (p, k) = insert_knot_hom(&points, &kv, degree, u);
        points = p;
        kv = k;
    }

    // First knot index carrying the split value; the junction control
    // point sits just before it.
    let first = kv
        .iter()
        .position(|&k| (k - u).abs() < GEOMETRIC_EPS)
        .unwrap_or(degree);

    let mut left_knots = kv[..first + degree].to_vec();
    left_knots.push(u);
    let left_points = points[..first].to_vec();

    let mut right_knots = vec![u];
    right_knots.extend_from_slice(&kv[first..]);
    let right_points = points[first - 1..].to_vec();

    ((left_points, left_knots), (right_points, right_knots))
}

/// Raises the degree by one without changing the evaluated shape.
///
/// Decomposes into Bezier segments by knot insertion, elevates each
/// segment, and reassembles. The resulting knot vector carries every
/// breakpoint at full multiplicity; no knot removal is attempted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn elevate_degree_hom(
    hpoints: &[Vector4],
    knots: &[f64],
    degree: usize,
) -> (Vec<Vector4>, Vec<f64>) {
    let p = degree;
    let mut points = hpoints.to_vec();
    let mut kv = knots.to_vec();

    // Interior breakpoints, in order.
    let domain_start = kv[p];
    let domain_end = kv[points.len()];
    let mut interior: Vec<f64> = Vec::new();
    for &k in &kv[p + 1..points.len()] {
        if (k - domain_start).abs() < GEOMETRIC_EPS || (k - domain_end).abs() < GEOMETRIC_EPS {
            continue;
        }
        if interior
            .last()
            .map_or(true, |&last| (k - last).abs() > GEOMETRIC_EPS)
        {
            interior.push(k);
        }
    }

    // Decompose: every interior breakpoint at multiplicity p.
    for &v in &interior {
        for _ in multiplicity(&kv, v)..p {
            let (np, nk) = insert_knot_hom(&points, &kv, p, v);
            points = np;
            kv = nk;
        }
    }

    // Elevate each Bezier segment of p+1 control points to p+2.
    let segment_count = interior.len() + 1;
    let mut elevated: Vec<Vector4> = Vec::with_capacity(segment_count * (p + 1) + 1);
    for s in 0..segment_count {
        let seg = &points[s * p..s * p + p + 1];
        let start = if s == 0 { 0 } else { 1 };
        for i in start..=p + 1 {
            let q = if i == 0 {
                seg[0]
            } else if i == p + 1 {
                seg[p]
            } else {
                let alpha = i as f64 / (p + 1) as f64;
                seg[i - 1] * alpha + seg[i] * (1.0 - alpha)
            };
            elevated.push(q);
        }
    }

    // Reassembled knot vector: ends at multiplicity p+2, interior
    // breakpoints at p+1.
    let mut new_knots = Vec::with_capacity(elevated.len() + p + 2);
    new_knots.extend(std::iter::repeat(domain_start).take(p + 2));
    for &v in &interior {
        new_knots.extend(std::iter::repeat(v).take(p + 1));
    }
    new_knots.extend(std::iter::repeat(domain_end).take(p + 2));

    (elevated, new_knots)
}
