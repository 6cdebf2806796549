//! Basic building blocks.

use std::{
    f64::consts::{PI, TAU},
    ops::{Add, Neg, Sub},
};

use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle`.
    pub fn from_angle(angle: Angle) -> Self {
        Self::new(angle.0.cos(), angle.0.sin())
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, point: Self) -> f64 {
        (*self - point).magnitude()
    }

    /// Angle of the vector with respect to the positive x-axis.
    pub fn direction(&self) -> Angle {
        Angle(self.y.atan2(self.x))
    }

    pub fn scale(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    pub fn rotate_vector(&self, angle: Angle) -> Point {
        Point::new(
            self.x * angle.0.cos() - self.y * angle.0.sin(),
            self.x * angle.0.sin() + self.y * angle.0.cos(),
        )
    }

    pub fn dot(&self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the cross product of the two vectors.
    pub fn cross(&self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }
}

impl From<Point> for (f64, f64) {
    fn from(value: Point) -> Self {
        (value.x, value.y)
    }
}

impl From<Point> for Vector2<f64> {
    fn from(value: Point) -> Self {
        Vector2::new(value.x, value.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Angle in radians. Zero points along the positive x-axis, positive values turn
/// counterclockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Equivalent angle in `(-PI, PI]`.
    pub fn normalized(self) -> Self {
        let a = self.0.rem_euclid(TAU);
        Self(if a > PI { a - TAU } else { a })
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Angle(-self.0)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("invalid range: min {min} is greater than max {max}")]
    Inverted { min: f64, max: f64 },
    #[error("invalid range: bounds must be finite, got [{min}, {max}]")]
    NonFinite { min: f64, max: f64 },
}

/// Closed interval `[min, max]` of reals.
///
/// Serialized as a two-element array, validated on deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct DoubleRange {
    min: f64,
    max: f64,
}

impl DoubleRange {
    pub const UNIT: DoubleRange = DoubleRange { min: 0.0, max: 1.0 };
    pub const SYMMETRIC_UNIT: DoubleRange = DoubleRange {
        min: -1.0,
        max: 1.0,
    };
    pub const ANGLE: DoubleRange = DoubleRange { min: -PI, max: PI };

    pub fn new(min: f64, max: f64) -> Result<Self, RangeError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(RangeError::NonFinite { min, max });
        }
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// Range from literal bounds already known to satisfy `min <= max`.
    pub(crate) const fn from_bounds(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Degenerate range holding a single value.
    pub const fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// `[0, max]`, with negative or NaN maxima collapsing to `[0, 0]`.
    pub fn up_to(max: f64) -> Self {
        Self {
            min: 0.0,
            max: max.max(0.0),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn extent(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        self.min + self.extent() / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Maps `value` linearly onto `[0, 1]`, clipping it to the range first.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.extent() == 0.0 {
            return 0.5;
        }
        (self.clip(value) - self.min) / self.extent()
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        self.min + value * self.extent()
    }

    /// Maps `value` linearly onto `[-1, 1]`, clipping it to the range first.
    pub fn rescale_to_symmetric_unit(&self, value: f64) -> f64 {
        self.normalize(value) * 2.0 - 1.0
    }

    /// Inverse of [`DoubleRange::rescale_to_symmetric_unit`].
    pub fn from_symmetric_unit(&self, value: f64) -> f64 {
        self.denormalize((value + 1.0) / 2.0)
    }

    /// `n` evenly spaced values covering the range, both ends included.
    pub fn points(&self, n: usize) -> Vec<f64> {
        match n {
            0 => vec![],
            1 => vec![self.center()],
            _ => {
                let step = self.extent() / (n - 1) as f64;
                (0..n).map(|i| self.min + step * i as f64).collect()
            }
        }
    }

    /// Uniform sample. Degenerate ranges always yield `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.denormalize(rng.random::<f64>())
    }
}

impl TryFrom<[f64; 2]> for DoubleRange {
    type Error = RangeError;

    fn try_from([min, max]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<DoubleRange> for [f64; 2] {
    fn from(value: DoubleRange) -> Self {
        [value.min, value.max]
    }
}
