use crate::geometry::{NurbsCurve, Polyline};

use super::{CurveTessellation, TessellationParams};

/// Tessellates a curve into a polyline under the screen-space error budget.
///
/// The initial sample density comes from a second-derivative curvature
/// estimate (the chord deviation of a parameter step `h` is roughly
/// `h² |C''| / 8`), then spans are bisected adaptively wherever the chord
/// midpoint still deviates from the curve by more than the budget.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn tessellate_curve(curve: &NurbsCurve, params: &TessellationParams) -> CurveTessellation {
    let (u0, u1) = curve.domain();
    let tolerance = params.world_tolerance();

    // Curvature-informed seed density.
    let mut max_second = 0.0_f64;
    for i in 0..=8 {
        let u = u0 + (u1 - u0) * f64::from(i) / 8.0;
        max_second = max_second.max(curve.evaluate(u).second_derivative.norm());
    }
    let span = u1 - u0;
    let estimate = if tolerance > 0.0 {
        (span * (max_second / (8.0 * tolerance)).sqrt()).ceil() as usize
    } else {
        params.max_segments
    };
    let segments = estimate.clamp(params.min_segments, params.max_segments);

    let mut points = Vec::with_capacity(segments + 1);
    let mut parameters = Vec::with_capacity(segments + 1);

    let first = curve.evaluate(u0);
    points.push(first.point);
    parameters.push(u0);

    for i in 0..segments {
        let a = u0 + span * i as f64 / segments as f64;
        let b = u0 + span * (i + 1) as f64 / segments as f64;
        refine_span(curve, a, b, tolerance, 0, &mut points, &mut parameters);
    }

    CurveTessellation { points, parameters }
}

/// Bisects `[a, b]` while the chord deviates beyond `tolerance`, then
/// appends the endpoint of the span.
///
/// Deviation is probed at the quarter points as well as the midpoint;
/// a lone midpoint test goes blind on S-shaped spans whose center
/// happens to fall back on the chord.
fn refine_span(
    curve: &NurbsCurve,
    a: f64,
    b: f64,
    tolerance: f64,
    depth: usize,
    points: &mut Vec<crate::math::Point3>,
    parameters: &mut Vec<f64>,
) {
    const MAX_REFINE_DEPTH: usize = 10;

    let pa = curve.point_at(a);
    let pb = curve.point_at(b);
    let mut deviation = 0.0_f64;
    for frac in [0.25, 0.5, 0.75] {
        let on_curve = curve.point_at(a + (b - a) * frac);
        let on_chord = pa + (pb - pa) * frac;
        deviation = deviation.max((on_curve - on_chord).norm());
    }

    if deviation > tolerance && depth < MAX_REFINE_DEPTH {
        let mid = f64::midpoint(a, b);
        refine_span(curve, a, mid, tolerance, depth + 1, points, parameters);
        refine_span(curve, mid, b, tolerance, depth + 1, points, parameters);
    } else {
        points.push(pb);
        parameters.push(b);
    }
}

/// Tessellates the parameter range `[ta, tb]` of a curve, for loop and
/// edge boundaries that cover only part of the underlying curve.
///
/// Purely deviation-driven: straight spans stay single segments, so
/// planar trim loops keep their corner count.
#[must_use]
pub(crate) fn sample_segment(
    curve: &NurbsCurve,
    ta: f64,
    tb: f64,
    params: &TessellationParams,
) -> CurveTessellation {
    let tolerance = params.world_tolerance();

    let mut points = vec![curve.point_at(ta)];
    let mut parameters = vec![ta];
    refine_span(curve, ta, tb, tolerance, 0, &mut points, &mut parameters);

    CurveTessellation { points, parameters }
}

/// Converts a polyline record into the common tessellation output; the
/// segments are already linear, so points pass through unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tessellate_polyline(polyline: &Polyline) -> CurveTessellation {
    let mut points: Vec<_> = polyline.points().to_vec();
    if polyline.is_closed() {
        points.push(polyline.points()[0]);
    }
    let parameters = (0..points.len()).map(|i| i as f64).collect();
    CurveTessellation { points, parameters }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn arc_like() -> NurbsCurve {
        NurbsCurve::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            2,
            None,
        )
        .unwrap()
    }

    fn measured_deviation(curve: &NurbsCurve, tess: &CurveTessellation) -> f64 {
        let mut worst = 0.0_f64;
        for pair in tess.parameters.windows(2) {
            let mid = f64::midpoint(pair[0], pair[1]);
            let on_curve = curve.point_at(mid);
            let chord_mid = nalgebra::center(
                &curve.point_at(pair[0]),
                &curve.point_at(pair[1]),
            );
            worst = worst.max((on_curve - chord_mid).norm());
        }
        worst
    }

    #[test]
    fn endpoints_are_exact() {
        let curve = arc_like();
        let tess = tessellate_curve(&curve, &TessellationParams::default());
        assert_eq!(tess.points[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(*tess.points.last().unwrap(), Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn deviation_stays_within_budget() {
        let curve = arc_like();
        let params = TessellationParams::default();
        let tess = tessellate_curve(&curve, &params);
        assert!(measured_deviation(&curve, &tess) <= params.world_tolerance() * 1.001);
    }

    #[test]
    fn looser_budget_never_decreases_deviation() {
        let curve = arc_like();
        let mut previous = 0.0_f64;
        for world_per_pixel in [0.0005, 0.005, 0.05] {
            let params = TessellationParams {
                world_per_pixel,
                min_segments: 2,
                ..TessellationParams::default()
            };
            let deviation = measured_deviation(&curve, &tessellate_curve(&curve, &params));
            assert!(
                deviation >= previous - 1e-12,
                "deviation {deviation} dropped below {previous}"
            );
            previous = deviation;
        }
    }

    #[test]
    fn tighter_budget_uses_more_points() {
        let curve = arc_like();
        let coarse = tessellate_curve(
            &curve,
            &TessellationParams {
                world_per_pixel: 0.05,
                min_segments: 2,
                ..TessellationParams::default()
            },
        );
        let fine = tessellate_curve(
            &curve,
            &TessellationParams {
                world_per_pixel: 0.0005,
                min_segments: 2,
                ..TessellationParams::default()
            },
        );
        assert!(fine.points.len() > coarse.points.len());
    }

    #[test]
    fn parameters_are_monotone() {
        let curve = arc_like();
        let tess = tessellate_curve(&curve, &TessellationParams::default());
        for pair in tess.parameters.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn straight_line_stays_coarse() {
        let line = NurbsCurve::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0)).unwrap();
        let params = TessellationParams::default();
        let tess = tessellate_curve(&line, &params);
        // No curvature: the seed density (min_segments) is enough.
        assert_eq!(tess.points.len(), params.min_segments + 1);
    }

    #[test]
    fn closed_polyline_repeats_first_point() {
        let square = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            true,
        )
        .unwrap();
        let tess = tessellate_polyline(&square);
        assert_eq!(tess.points.len(), 4);
        assert_eq!(tess.points[0], tess.points[3]);
    }
}
