use super::{Point3, Vector3, NUMERIC_EPS};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box from two corners, swapping coordinates where needed
    /// so that `min <= max` holds per axis.
    #[must_use]
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Computes the bounding box of a point set, or `None` for an empty set.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        let mut aabb = Self::new(*first, *first);
        for p in &points[1..] {
            aabb.extend(p);
        }
        Some(aabb)
    }

    /// Grows the box to contain `point`.
    pub fn extend(&mut self, point: &Point3) {
        self.min = Point3::new(
            self.min.x.min(point.x),
            self.min.y.min(point.y),
            self.min.z.min(point.z),
        );
        self.max = Point3::new(
            self.max.x.max(point.x),
            self.max.y.max(point.y),
            self.max.z.max(point.z),
        );
    }

    /// Returns the smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = *self;
        result.extend(&other.min);
        result.extend(&other.max);
        result
    }

    /// Returns the box grown by `margin` on every side.
    #[must_use]
    pub fn inflated(&self, margin: f64) -> Self {
        let m = Vector3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Returns the center point of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Returns the per-axis extent (`max - min`).
    #[must_use]
    pub fn extents(&self) -> Vector3 {
        self.max - self.min
    }

    /// Returns whether `point` lies inside or on the boundary of the box.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Slab test for a ray `origin + t * dir`, `t >= 0`.
    ///
    /// Returns the entry parameter `t` when the ray hits the box (0 when
    /// the origin is inside), or `None` for a miss.
    #[must_use]
    pub fn ray_intersect(&self, origin: &Point3, dir: &Vector3) -> Option<f64> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let lo = self.min[axis];
            let hi = self.max[axis];

            if d.abs() < NUMERIC_EPS {
                if o < lo || o > hi {
                    return None;
                }
            } else {
                let mut t0 = (lo - o) / d;
                let mut t1 = (hi - o) / d;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_near = t_near.max(t0);
                t_far = t_far.min(t1);
                if t_near > t_far || t_far < 0.0 {
                    return None;
                }
            }
        }

        Some(t_near.max(0.0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_swaps_corners() {
        let aabb = Aabb::new(Point3::new(1.0, 0.0, 5.0), Point3::new(0.0, 2.0, 3.0));
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn from_points_covers_all() {
        let aabb = Aabb::from_points(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(-1.0, 2.0, 0.5),
            Point3::new(3.0, 1.0, -2.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Point3::new(-1.0, 0.0, -2.0));
        assert_eq!(aabb.max, Point3::new(3.0, 2.0, 0.5));
    }

    #[test]
    fn contains_boundary_point() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(aabb.contains(&Point3::new(1.0, 0.5, 0.0)));
        assert!(!aabb.contains(&Point3::new(1.1, 0.5, 0.0)));
    }

    #[test]
    fn ray_hits_front_face() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let t = aabb
            .ray_intersect(&Point3::new(0.5, 0.5, -1.0), &Vector3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert!((t - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ray_from_inside_returns_zero() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let t = aabb
            .ray_intersect(&Point3::new(0.5, 0.5, 0.5), &Vector3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert!(t.abs() < 1e-12);
    }

    #[test]
    fn ray_misses_behind() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let hit = aabb.ray_intersect(&Point3::new(0.5, 0.5, 2.0), &Vector3::new(0.0, 0.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn axis_parallel_ray_outside_slab_misses() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let hit = aabb.ray_intersect(&Point3::new(2.0, 0.5, -1.0), &Vector3::new(0.0, 0.0, 1.0));
        assert!(hit.is_none());
    }
}
