//! Arena made of wall segments.

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Angle, Point, Segment};

/// Immutable set of wall segments, boundary walls included.
///
/// The extents are the bounding box of all segment endpoints, whose lower corner is the origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct Arena {
    x_extent: f64,
    y_extent: f64,
    segments: Vec<Segment>,
}

impl Arena {
    /// Box of the given size, with the four boundary walls followed by `obstacles`.
    pub fn new(x_extent: f64, y_extent: f64, obstacles: Vec<Segment>) -> Result<Self, ArenaError> {
        if !x_extent.is_finite() || !y_extent.is_finite() || x_extent <= 0.0 || y_extent <= 0.0 {
            return Err(ArenaError::InvalidExtent { x_extent, y_extent });
        }
        let outside = |p: Point| p.x() > x_extent || p.y() > y_extent;
        if let Some(segment) = obstacles.iter().find(|s| outside(s.p1()) || outside(s.p2())) {
            return Err(ArenaError::OutOfBounds(*segment));
        }
        Self::from_segments(boundaries(x_extent, y_extent).into_iter().chain(obstacles).collect())
    }

    /// Arena made of exactly `segments`, which have to include the boundary walls.
    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, ArenaError> {
        if segments.is_empty() {
            return Err(ArenaError::Empty);
        }
        for segment in &segments {
            let points = [segment.p1(), segment.p2()];
            if points.iter().any(|p| !p.x().is_finite() || !p.y().is_finite()) {
                return Err(ArenaError::NonFinite(*segment));
            }
            if points.iter().any(|p| p.x() < 0.0 || p.y() < 0.0) {
                return Err(ArenaError::OutOfBounds(*segment));
            }
        }
        let x_extent = segments
            .iter()
            .map(|s| s.p1().x().max(s.p2().x()))
            .fold(0.0, f64::max);
        let y_extent = segments
            .iter()
            .map(|s| s.p1().y().max(s.p2().y()))
            .fold(0.0, f64::max);
        if x_extent <= 0.0 || y_extent <= 0.0 {
            return Err(ArenaError::InvalidExtent { x_extent, y_extent });
        }
        Ok(Self {
            x_extent,
            y_extent,
            segments,
        })
    }

    /// Unit box with the given obstacles. Only used for the hard-coded prepared layouts, which
    /// are checked by the tests.
    fn unit_box(obstacles: &[Segment]) -> Self {
        Self {
            x_extent: 1.0,
            y_extent: 1.0,
            segments: boundaries(1.0, 1.0)
                .into_iter()
                .chain(obstacles.iter().copied())
                .collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn x_extent(&self) -> f64 {
        self.x_extent
    }

    pub fn y_extent(&self) -> f64 {
        self.y_extent
    }

    pub fn diagonal(&self) -> f64 {
        self.x_extent.hypot(self.y_extent)
    }

    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.x_extent).contains(&point.x()) && (0.0..=self.y_extent).contains(&point.y())
    }

    /// Distance from `origin` to the closest wall along `angle`, saturating at `range`.
    pub fn ray_cast(&self, origin: Point, angle: Angle, range: f64) -> f64 {
        self.segments
            .iter()
            .filter_map(|s| s.intersect_with_ray(origin, angle, range))
            .fold(range.max(0.0), f64::min)
    }
}

impl TryFrom<Vec<Segment>> for Arena {
    type Error = ArenaError;

    fn try_from(value: Vec<Segment>) -> Result<Self, Self::Error> {
        Self::from_segments(value)
    }
}

impl From<Arena> for Vec<Segment> {
    fn from(value: Arena) -> Self {
        value.segments
    }
}

fn boundaries(x_extent: f64, y_extent: f64) -> [Segment; 4] {
    [
        Segment::new(Point::new(0.0, 0.0), Point::new(x_extent, 0.0)),
        Segment::new(Point::new(x_extent, 0.0), Point::new(x_extent, y_extent)),
        Segment::new(Point::new(x_extent, y_extent), Point::new(0.0, y_extent)),
        Segment::new(Point::new(0.0, y_extent), Point::new(0.0, 0.0)),
    ]
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArenaError {
    #[error("arena has no segments")]
    Empty,
    #[error("segment {0:?} has non-finite coordinates")]
    NonFinite(Segment),
    #[error("segment {0:?} lies outside the arena")]
    OutOfBounds(Segment),
    #[error("arena extents must be positive, got {x_extent} x {y_extent}")]
    InvalidExtent { x_extent: f64, y_extent: f64 },
    #[error("unknown prepared arena {0:?}")]
    UnknownPrepared(String),
}

const fn wall(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
    Segment::new(Point::new(x1, y1), Point::new(x2, y2))
}

static EMPTY: Lazy<Arena> = Lazy::new(|| Arena::unit_box(&[]));
static A_BARRIER: Lazy<Arena> = Lazy::new(|| Arena::unit_box(&[wall(0.4, 0.5, 0.6, 0.5)]));
static B_BARRIER: Lazy<Arena> = Lazy::new(|| Arena::unit_box(&[wall(0.3, 0.5, 0.7, 0.5)]));
static C_BARRIER: Lazy<Arena> = Lazy::new(|| Arena::unit_box(&[wall(0.2, 0.5, 0.8, 0.5)]));
static U_BARRIER: Lazy<Arena> = Lazy::new(|| {
    Arena::unit_box(&[
        wall(0.3, 0.5, 0.7, 0.5),
        wall(0.3, 0.5, 0.3, 0.7),
        wall(0.7, 0.5, 0.7, 0.7),
    ])
});
static UPSIDE_DOWN_U_BARRIER: Lazy<Arena> = Lazy::new(|| {
    Arena::unit_box(&[
        wall(0.3, 0.5, 0.7, 0.5),
        wall(0.3, 0.5, 0.3, 0.3),
        wall(0.7, 0.5, 0.7, 0.3),
    ])
});
static E_MAZE: Lazy<Arena> = Lazy::new(|| {
    Arena::unit_box(&[wall(0.0, 0.33, 0.66, 0.33), wall(1.0, 0.66, 0.33, 0.66)])
});
static FLAT_MAZE: Lazy<Arena> = Lazy::new(|| {
    Arena::unit_box(&[
        wall(0.0, 0.5, 0.75, 0.5),
        wall(0.25, 0.25, 1.0, 0.25),
        wall(0.25, 0.75, 1.0, 0.75),
    ])
});
static DECEPTIVE_MAZE: Lazy<Arena> = Lazy::new(|| {
    Arena::unit_box(&[
        wall(0.2, 0.6, 0.8, 0.6),
        wall(0.2, 0.6, 0.2, 0.9),
        wall(0.8, 0.6, 0.8, 0.9),
        wall(0.0, 0.3, 0.6, 0.3),
    ])
});

static DECIMAL_MAZE: Lazy<Arena> = Lazy::new(|| {
    Arena::unit_box(&[
        wall(0.0, 0.7, 0.7, 0.7),
        wall(0.3, 0.5, 1.0, 0.5),
        wall(0.5, 0.5, 0.5, 0.6),
        wall(0.0, 0.3, 0.7, 0.3),
    ])
});

/// Named arena layouts, built once per process on first use.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prepared {
    #[default]
    Empty,
    ABarrier,
    BBarrier,
    CBarrier,
    UBarrier,
    UpsideDownUBarrier,
    EMaze,
    FlatMaze,
    DeceptiveMaze,
    DecimalMaze,
}

impl Prepared {
    pub const ALL: [Prepared; 10] = [
        Prepared::Empty,
        Prepared::ABarrier,
        Prepared::BBarrier,
        Prepared::CBarrier,
        Prepared::UBarrier,
        Prepared::UpsideDownUBarrier,
        Prepared::EMaze,
        Prepared::FlatMaze,
        Prepared::DeceptiveMaze,
        Prepared::DecimalMaze,
    ];

    pub fn arena(self) -> &'static Arena {
        match self {
            Prepared::Empty => &EMPTY,
            Prepared::ABarrier => &A_BARRIER,
            Prepared::BBarrier => &B_BARRIER,
            Prepared::CBarrier => &C_BARRIER,
            Prepared::UBarrier => &U_BARRIER,
            Prepared::UpsideDownUBarrier => &UPSIDE_DOWN_U_BARRIER,
            Prepared::EMaze => &E_MAZE,
            Prepared::FlatMaze => &FLAT_MAZE,
            Prepared::DeceptiveMaze => &DECEPTIVE_MAZE,
            Prepared::DecimalMaze => &DECIMAL_MAZE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Prepared::Empty => "empty",
            Prepared::ABarrier => "a_barrier",
            Prepared::BBarrier => "b_barrier",
            Prepared::CBarrier => "c_barrier",
            Prepared::UBarrier => "u_barrier",
            Prepared::UpsideDownUBarrier => "upside_down_u_barrier",
            Prepared::EMaze => "e_maze",
            Prepared::FlatMaze => "flat_maze",
            Prepared::DeceptiveMaze => "deceptive_maze",
            Prepared::DecimalMaze => "decimal_maze",
        }
    }
}

impl fmt::Display for Prepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Prepared {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prepared::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ArenaError::UnknownPrepared(s.to_string()))
    }
}
