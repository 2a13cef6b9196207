use crate::error::{OperationError, Result};
use crate::math::intersect_2d::line_line_intersect;
use crate::math::polygon_2d::{left_normal, segment_direction};
use crate::math::{Point2, Vector2, ANGULAR_EPS, GEOMETRIC_EPS};

use super::{JointStyle, OffsetOptions};

/// An offset segment with its unit direction and source vertex index.
struct OffsetSeg {
    start: Point2,
    end: Point2,
    dir: Vector2,
    /// Index of the original vertex this segment starts at.
    src: usize,
}

/// Builds the raw (untrimmed) offset chain by offsetting each segment to
/// its left by `distance` and resolving every corner.
///
/// Corners where the offset segments cross are trimmed to the crossing
/// point; corners that open a gap are mitered below the angle threshold
/// and joined per [`JointStyle`] above it.
///
/// # Errors
///
/// Returns [`OperationError::Failed`] when no non-degenerate segments
/// remain.
pub(super) fn build(
    points: &[Point2],
    closed: bool,
    distance: f64,
    options: &OffsetOptions,
) -> Result<Vec<Point2>> {
    let n = points.len();
    let seg_count = if closed { n } else { n - 1 };

    let mut segs: Vec<OffsetSeg> = Vec::with_capacity(seg_count);
    for i in 0..seg_count {
        let a = points[i];
        let b = points[(i + 1) % n];
        let Some(dir) = segment_direction(&a, &b) else {
            // Zero-length segment contributes nothing.
            continue;
        };
        let normal = left_normal(&dir);
        segs.push(OffsetSeg {
            start: a + normal * distance,
            end: b + normal * distance,
            dir,
            src: i,
        });
    }

    if segs.is_empty() {
        return Err(OperationError::Failed("no segments to offset".to_owned()).into());
    }

    let mut verts: Vec<Point2> = Vec::with_capacity(segs.len() * 2);

    if closed {
        for i in 0..segs.len() {
            let prev = if i == 0 { segs.len() - 1 } else { i - 1 };
            push_corner(
                &mut verts,
                &segs[prev],
                &segs[i],
                &points[segs[i].src],
                distance,
                options,
            );
        }
    } else {
        verts.push(segs[0].start);
        for i in 1..segs.len() {
            push_corner(
                &mut verts,
                &segs[i - 1],
                &segs[i],
                &points[segs[i].src],
                distance,
                options,
            );
        }
        verts.push(segs[segs.len() - 1].end);
    }

    verts.dedup_by(|a, b| (*a - *b).norm() < GEOMETRIC_EPS);
    if closed && verts.len() > 1 {
        let last = verts[verts.len() - 1];
        if (last - verts[0]).norm() < GEOMETRIC_EPS {
            verts.pop();
        }
    }

    Ok(verts)
}

/// Resolves the corner between two consecutive offset segments and pushes
/// the corner vertices.
fn push_corner(
    verts: &mut Vec<Point2>,
    seg_prev: &OffsetSeg,
    seg_next: &OffsetSeg,
    orig_corner: &Point2,
    distance: f64,
    options: &OffsetOptions,
) {
    let cross = seg_prev.dir.x * seg_next.dir.y - seg_prev.dir.y * seg_next.dir.x;
    let dot = seg_prev.dir.dot(&seg_next.dir);

    if cross.abs() < ANGULAR_EPS {
        if dot > 0.0 {
            // Collinear continuation.
            verts.push(seg_next.start);
        } else {
            // Reversal: flat cap.
            verts.push(seg_prev.end);
            verts.push(seg_next.start);
        }
        return;
    }

    let intersection = line_line_intersect(&seg_prev.end, &seg_prev.dir, &seg_next.start, &seg_next.dir)
        .map(|(t, _)| seg_prev.end + seg_prev.dir * t);

    let gap_opens = cross * distance < 0.0;
    if !gap_opens {
        // The offset segments cross; the intersection is the trimmed corner.
        match intersection {
            Some(p) => verts.push(p),
            None => {
                verts.push(seg_prev.end);
                verts.push(seg_next.start);
            }
        }
        return;
    }

    let turn = dot.clamp(-1.0, 1.0).acos();
    if turn < options.miter_angle_threshold {
        push_miter(verts, seg_prev, seg_next, intersection, orig_corner, distance, options);
        return;
    }

    match options.joint_style {
        JointStyle::Miter => {
            push_miter(verts, seg_prev, seg_next, intersection, orig_corner, distance, options);
        }
        JointStyle::Bevel => {
            verts.push(seg_prev.end);
            verts.push(seg_next.start);
        }
        JointStyle::Round => push_round(verts, seg_prev, seg_next, orig_corner, distance, options),
    }
}

/// Miter with length cap: beyond `miter_limit * |distance|` the corner
/// falls back to a bevel.
fn push_miter(
    verts: &mut Vec<Point2>,
    seg_prev: &OffsetSeg,
    seg_next: &OffsetSeg,
    intersection: Option<Point2>,
    orig_corner: &Point2,
    distance: f64,
    options: &OffsetOptions,
) {
    if let Some(corner) = intersection {
        let limit = options.miter_limit * distance.abs();
        if (corner - orig_corner).norm_squared() <= limit * limit {
            verts.push(corner);
            return;
        }
    }
    verts.push(seg_prev.end);
    verts.push(seg_next.start);
}

/// Circular joint around the original corner, flattened to segments
/// within the arc tolerance.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn push_round(
    verts: &mut Vec<Point2>,
    seg_prev: &OffsetSeg,
    seg_next: &OffsetSeg,
    orig_corner: &Point2,
    distance: f64,
    options: &OffsetOptions,
) {
    let radius = distance.abs();
    let v0 = seg_prev.end - orig_corner;
    let v1 = seg_next.start - orig_corner;
    let a0 = v0.y.atan2(v0.x);
    let a1 = v1.y.atan2(v1.x);

    // Sweep direction follows the turn direction of the source corner.
    let cross = seg_prev.dir.x * seg_next.dir.y - seg_prev.dir.y * seg_next.dir.x;
    let mut sweep = a1 - a0;
    if cross < 0.0 && sweep > 0.0 {
        sweep -= std::f64::consts::TAU;
    } else if cross > 0.0 && sweep < 0.0 {
        sweep += std::f64::consts::TAU;
    }

    // Sagitta bound: max segment angle for the configured tolerance.
    let max_angle = if options.arc_tolerance >= radius {
        std::f64::consts::PI
    } else {
        2.0 * (1.0 - options.arc_tolerance / radius).acos()
    };
    let steps = ((sweep.abs() / max_angle).ceil() as usize).clamp(1, 64);

    verts.push(seg_prev.end);
    for step in 1..steps {
        #[allow(clippy::cast_precision_loss)]
        let angle = a0 + sweep * step as f64 / steps as f64;
        verts.push(orig_corner + Vector2::new(angle.cos(), angle.sin()) * radius);
    }
    verts.push(seg_next.start);
}
