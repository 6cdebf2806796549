//! Collision handling for moves across the arena walls.
//!
//! A candidate move is the segment from the current position to the requested one. The two
//! policies differ in what happens when that segment runs into a wall: [`CollisionPolicy::Reject`]
//! throws the whole move away, [`CollisionPolicy::Block`] stops the robot just short of the wall.
//! Neither lets a move end outside the arena, and both let a robot standing on a wall step off
//! it.

use super::{Arena, Point, Segment};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionPolicy {
    /// Keep the robot where it is if the move crosses a wall, or if it ends closer than
    /// `clearance` to a wall it is approaching.
    Reject { clearance: f64 },
    /// Stop where the robot would first come closer than `distance` to any wall.
    Block { distance: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Movement {
    Free(Point),
    Rejected,
    Blocked(Point),
}

impl Movement {
    /// Position after the move, given the position before it.
    pub fn position(&self, from: Point) -> Point {
        match self {
            Movement::Free(p) | Movement::Blocked(p) => *p,
            Movement::Rejected => from,
        }
    }

    pub fn is_collision(&self) -> bool {
        !matches!(self, Movement::Free(_))
    }
}

impl CollisionPolicy {
    pub fn resolve(&self, arena: &Arena, from: Point, to: Point) -> Movement {
        match *self {
            CollisionPolicy::Reject { clearance } => reject(arena, from, to, clearance),
            CollisionPolicy::Block { distance } => block(arena, from, to, distance),
        }
    }
}

/// Slack on "the path starts at the wall" checks.
const START_EPSILON: f64 = 1e-12;

/// Smallest gap a blocked robot keeps, so it never ends up standing on a wall.
const MIN_BLOCK_DISTANCE: f64 = 1e-9;

fn reject(arena: &Arena, from: Point, to: Point, clearance: f64) -> Movement {
    if !arena.contains(to) {
        return Movement::Rejected;
    }
    let path = Segment::new(from, to);
    let collides = arena.segments().iter().any(|wall| {
        let start_gap = wall.distance_to_point(from);
        let end_gap = wall.distance_to_point(to);
        if let Some(hit) = path.intersection(wall) {
            // a robot standing on a wall may always step off it
            let leaving = hit.distance(from) <= START_EPSILON && end_gap > start_gap;
            if !leaving {
                return true;
            }
        }
        end_gap < clearance && end_gap < start_gap
    });
    if collides {
        Movement::Rejected
    } else {
        Movement::Free(to)
    }
}

fn block(arena: &Arena, from: Point, to: Point, distance: f64) -> Movement {
    let travel = to - from;
    let length = travel.magnitude();
    if length == 0.0 {
        return Movement::Free(to);
    }
    let direction = travel.scale(1.0 / length);
    let distance = distance.max(MIN_BLOCK_DISTANCE);

    let advance = arena
        .segments()
        .iter()
        .filter_map(|wall| allowed_advance(wall, from, direction, distance))
        .fold(length, f64::min);

    if advance < length {
        Movement::Blocked(from + direction.scale(advance))
    } else if arena.contains(to) {
        Movement::Free(to)
    } else {
        Movement::Blocked(from)
    }
}

/// How far the robot may travel before coming closer than `distance` to `wall`, `None` when the
/// wall puts no limit on the move.
fn allowed_advance(wall: &Segment, from: Point, direction: Point, distance: f64) -> Option<f64> {
    if wall.distance_to_point(from) < distance {
        // already too close: moves that do not approach the wall are free
        let away = from - wall.closest_point(from);
        return (direction.dot(away) < 0.0).then_some(0.0);
    }
    wall.clearance_entry(from, direction, distance)
}
