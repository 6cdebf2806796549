//! Line segments and the intersection tests built on them.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use super::{Angle, Point};

/// Slack on the segment parameters so that hits exactly on an endpoint count.
const PARAMETER_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Segment {
    p1: Point,
    p2: Point,
}

impl Segment {
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }

    pub fn direction(&self) -> Angle {
        (self.p2 - self.p1).direction()
    }

    /// Intersection point of two segments.
    ///
    /// Parallel segments never intersect, collinear overlaps included, and neither does a
    /// segment whose endpoints coincide.
    pub fn intersection(&self, other: &Segment) -> Option<Point> {
        let r = self.p2 - self.p1;
        let s = other.p2 - other.p1;

        // p1 + t * r = q1 + u * s
        let m = Matrix2::new(r.x(), -s.x(), r.y(), -s.y());
        let det = m.determinant();
        if det.abs() <= f64::EPSILON * r.magnitude() * s.magnitude() {
            return None;
        }

        let rhs: Vector2<f64> = (other.p1 - self.p1).into();
        let solution = m.try_inverse()? * rhs;
        let (t, u) = (solution[0], solution[1]);

        let on_segment = |v: f64| (-PARAMETER_EPSILON..=1.0 + PARAMETER_EPSILON).contains(&v);
        if on_segment(t) && on_segment(u) {
            Some(self.p1 + r.scale(t.clamp(0.0, 1.0)))
        } else {
            None
        }
    }

    /// Distance along a ray from `origin` heading towards `angle` to the point where it hits
    /// the segment, looking no further than `range`.
    pub fn intersect_with_ray(&self, origin: Point, angle: Angle, range: f64) -> Option<f64> {
        if range <= 0.0 || !range.is_finite() {
            return None;
        }
        let ray = Segment::new(origin, origin + Point::from_angle(angle).scale(range));
        ray.intersection(self)
            .map(|hit| origin.distance(hit).clamp(0.0, range))
    }

    /// Point of the segment nearest to `point`.
    pub fn closest_point(&self, point: Point) -> Point {
        let d = self.p2 - self.p1;
        let squared_length = d.dot(d);
        if squared_length == 0.0 {
            return self.p1;
        }
        let t = ((point - self.p1).dot(d) / squared_length).clamp(0.0, 1.0);
        self.p1 + d.scale(t)
    }

    pub fn distance_to_point(&self, point: Point) -> f64 {
        point.distance(self.closest_point(point))
    }

    /// Distance along a ray from `origin` heading towards the unit vector `direction` to the
    /// first point whose distance to the segment drops to `clearance`.
    ///
    /// Only entries count: a ray that starts within `clearance` of the segment, or that starts
    /// on its border and heads away, never hits.
    pub fn clearance_entry(&self, origin: Point, direction: Point, clearance: f64) -> Option<f64> {
        let caps = [self.p1, self.p2].into_iter().filter_map(|center| {
            let offset = origin - center;
            let b = direction.dot(offset);
            let c = offset.dot(offset) - clearance * clearance;
            let discriminant = b * b - c;
            if b >= 0.0 || discriminant < 0.0 {
                return None;
            }
            let s = -b - discriminant.sqrt();
            (s >= -PARAMETER_EPSILON).then_some(s.max(0.0))
        });

        let along = self.p2 - self.p1;
        let length = along.magnitude();
        let side = (length > 0.0)
            .then(|| {
                let tangent = along.scale(1.0 / length);
                // signed distance to the segment's line and its rate of change along the ray
                let offset = tangent.cross(origin - self.p1);
                let approach = tangent.cross(direction);
                if offset * approach >= 0.0 {
                    return None;
                }
                let gap = offset.abs() - clearance;
                if gap < -PARAMETER_EPSILON {
                    return None;
                }
                let s = gap.max(0.0) / approach.abs();
                let t = tangent.dot(origin + direction.scale(s) - self.p1);
                (-PARAMETER_EPSILON..=length + PARAMETER_EPSILON)
                    .contains(&t)
                    .then_some(s)
            })
            .flatten();

        caps.chain(side).min_by(f64::total_cmp)
    }

    /// Shortest distance between any two points of the segments.
    pub fn distance(&self, other: &Segment) -> f64 {
        if self.intersection(other).is_some() {
            return 0.0;
        }
        [
            self.distance_to_point(other.p1),
            self.distance_to_point(other.p2),
            other.distance_to_point(self.p1),
            other.distance_to_point(self.p2),
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min)
    }
}
