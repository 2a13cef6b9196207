use crate::math::{Point2, GEOMETRIC_EPS};

use super::self_intersect::Intersection;

/// Cuts the raw offset chain into slices at every intersection point.
///
/// Each intersection point ends one slice and starts the next, so every
/// slice is a maximal run of the chain free of interior crossings. For
/// closed chains the trailing run is merged with the leading one, since
/// the chain start is not itself a cut.
pub(super) fn build(
    points: &[Point2],
    closed: bool,
    intersections: &[Intersection],
) -> Vec<Vec<Point2>> {
    let n = points.len();
    let seg_count = if closed { n } else { n.saturating_sub(1) };

    // Cut events per segment, ordered along the segment.
    let mut events: Vec<Vec<(f64, Point2)>> = vec![Vec::new(); seg_count];
    for intersection in intersections {
        events[intersection.seg_a].push((intersection.t_a, intersection.point));
        events[intersection.seg_b].push((intersection.t_b, intersection.point));
    }
    for segment_events in &mut events {
        segment_events.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let mut slices: Vec<Vec<Point2>> = Vec::new();
    let mut current: Vec<Point2> = vec![points[0]];

    for (s, segment_events) in events.iter().enumerate() {
        for &(_, cut) in segment_events {
            if (cut - current[current.len() - 1]).norm() > GEOMETRIC_EPS {
                current.push(cut);
            }
            slices.push(std::mem::replace(&mut current, vec![cut]));
        }
        let end = points[(s + 1) % n];
        if (end - current[current.len() - 1]).norm() > GEOMETRIC_EPS {
            current.push(end);
        }
    }

    if closed && !slices.is_empty() {
        // Merge the trailing run into the leading slice: the chain start
        // is not a cut point.
        let mut merged = current;
        merged.extend_from_slice(&slices[0][1..]);
        slices[0] = merged;
    } else {
        slices.push(current);
    }

    slices.retain(|slice| slice.len() >= 2);
    slices
}
