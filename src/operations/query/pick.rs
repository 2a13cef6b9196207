use crate::math::{ANGULAR_EPS, DISTANCE_EPS};

use super::hit_test::{Hit, Ray};

/// Depth-cycling pick stack.
///
/// Holds the distance-sorted hits of the most recent query with an
/// explicit cursor. Repeating the query with an unchanged ray advances
/// the cursor one entry deeper, wrapping back to the nearest hit after
/// the farthest; any ray movement resets the stack to the fresh hits.
/// The cursor is the only state; no live iterator hides between calls.
#[derive(Debug, Default)]
pub struct PickStack {
    hits: Vec<Hit>,
    cursor: usize,
    last_ray: Option<Ray>,
}

impl PickStack {
    /// Creates an empty pick stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a query result into the stack and returns the current pick.
    ///
    /// With an unchanged ray this cycles to the next-deeper hit; a moved
    /// ray (or first call) adopts `hits` and returns the nearest.
    pub fn pick(&mut self, ray: &Ray, hits: Vec<Hit>) -> Option<&Hit> {
        let moved = self.last_ray.map_or(true, |last| ray_moved(&last, ray));
        if moved {
            self.hits = hits;
            self.cursor = 0;
            self.last_ray = Some(*ray);
        } else if !self.hits.is_empty() {
            self.cursor = (self.cursor + 1) % self.hits.len();
        }
        self.current()
    }

    /// Returns the current pick without advancing.
    #[must_use]
    pub fn current(&self) -> Option<&Hit> {
        self.hits.get(self.cursor)
    }

    /// Returns how many hits the stack holds.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.hits.len()
    }

    /// Clears the stack and forgets the last ray.
    pub fn reset(&mut self) {
        self.hits.clear();
        self.cursor = 0;
        self.last_ray = None;
    }
}

/// A ray counts as moved when its origin or direction changed beyond
/// the respective epsilon class.
fn ray_moved(a: &Ray, b: &Ray) -> bool {
    (a.origin - b.origin).norm() > DISTANCE_EPS
        || a.direction.cross(&b.direction).norm() > ANGULAR_EPS
        || a.direction.dot(&b.direction) < 0.0
}
