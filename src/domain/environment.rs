//! Capability shared by the navigation environments, seen from the driver stepping them.

use thiserror::Error;

use super::{ArenaError, DoubleRange, RangeError};

/// A discrete-time system driven by actions and producing observations.
///
/// In dynamical-system terms the action is the input and the observation the output, hence
/// [`Environment::n_of_inputs`] is the action length and [`Environment::n_of_outputs`] the
/// observation length.
pub trait Environment {
    type State;

    fn n_of_inputs(&self) -> usize;

    fn n_of_outputs(&self) -> usize;

    /// Samples a new initial state from the configured ranges.
    fn reset(&mut self);

    fn state(&self) -> &Self::State;

    /// Observation of the current state. Pure: it never touches the random source.
    fn observe(&self) -> Vec<f64>;

    /// Applies `action` at time `t` and returns the observation of the resulting state.
    fn step(&mut self, t: f64, action: &[f64]) -> Result<Vec<f64>, EnvironmentError>;

    /// Natural range of each observation channel, the one rescaling maps onto `[-1, 1]`.
    fn observation_ranges(&self) -> Vec<DoubleRange>;

    /// Whether [`Environment::observe`] hands out rescaled values.
    fn rescales_input(&self) -> bool;

    fn distance_to_target(&self) -> f64;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvironmentError {
    #[error("expected an action with {expected} values, got {actual}")]
    ActionArity { expected: usize, actual: usize },
    #[error("action value {value} at index {index} is not finite")]
    NonFiniteAction { index: usize, value: f64 },
    #[error("sensor index {index} out of bounds for {count} sensors")]
    SensorIndexOutOfBounds { index: usize, count: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{name}: {source}")]
    Range {
        name: &'static str,
        source: RangeError,
    },
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("sensor range must be positive when sensors are present, got {0}")]
    SensorRange(f64),
    #[error("sensor angle {0} is not finite")]
    SensorAngle(f64),
    #[error("no sensors and no target sensing: observations would be empty")]
    NoObservations,
    #[error("{name} [{}, {}] reaches outside the arena span [0, {extent}]", .range.min(), .range.max())]
    OutOfArena {
        name: &'static str,
        range: DoubleRange,
        extent: f64,
    },
}

pub(crate) fn check_range(name: &'static str, range: DoubleRange) -> Result<(), ConfigurationError> {
    DoubleRange::new(range.min(), range.max())
        .map(|_| ())
        .map_err(|source| ConfigurationError::Range { name, source })
}

pub(crate) fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::Negative { name, value })
    }
}

/// Checks that positions drawn from `range` lie within `[0, extent]`.
pub(crate) fn check_within(
    name: &'static str,
    range: DoubleRange,
    extent: f64,
) -> Result<(), ConfigurationError> {
    if range.min() >= 0.0 && range.max() <= extent {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfArena {
            name,
            range,
            extent,
        })
    }
}

pub(crate) fn check_action(action: &[f64], expected: usize) -> Result<(), EnvironmentError> {
    if action.len() != expected {
        return Err(EnvironmentError::ActionArity {
            expected,
            actual: action.len(),
        });
    }
    match action.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(EnvironmentError::NonFiniteAction {
            index,
            value: action[index],
        }),
        None => Ok(()),
    }
}
