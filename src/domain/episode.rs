//! Records of an episode as seen by the driver stepping an environment.

use std::cmp::Ordering;

use thiserror::Error;

use super::{navigation, point_navigation, Point};

/// What happened at one discrete time: the observation the controller saw, the action it took
/// and the state the environment ended up in.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<I, O, S> {
    observation: I,
    action: O,
    state: S,
}

impl<I, O, S> Step<I, O, S> {
    pub fn new(observation: I, action: O, state: S) -> Self {
        Self {
            observation,
            action,
            state,
        }
    }

    pub fn observation(&self) -> &I {
        &self.observation
    }

    pub fn action(&self) -> &O {
        &self.action
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EpisodeError {
    #[error("time {t} does not follow the last recorded time {last}")]
    NonIncreasingTime { t: f64, last: f64 },
}

/// Append-only, time-ordered record of the steps of one episode.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome<I, O, S> {
    snapshots: Vec<(f64, Step<I, O, S>)>,
}

impl<I, O, S> Default for Outcome<I, O, S> {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
        }
    }
}

impl<I, O, S> Outcome<I, O, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the step taken at `t`, which must be later than every recorded time.
    pub fn push(&mut self, t: f64, step: Step<I, O, S>) -> Result<(), EpisodeError> {
        if let Some(last) = self.last_time() {
            if t.partial_cmp(&last) != Some(Ordering::Greater) {
                return Err(EpisodeError::NonIncreasingTime { t, last });
            }
        }
        self.snapshots.push((t, step));
        Ok(())
    }

    pub fn snapshots(&self) -> impl Iterator<Item = (f64, &Step<I, O, S>)> {
        self.snapshots.iter().map(|(t, step)| (*t, step))
    }

    pub fn first(&self) -> Option<(f64, &Step<I, O, S>)> {
        self.snapshots.first().map(|(t, step)| (*t, step))
    }

    pub fn last(&self) -> Option<(f64, &Step<I, O, S>)> {
        self.snapshots.last().map(|(t, step)| (*t, step))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn last_time(&self) -> Option<f64> {
        self.snapshots.last().map(|(t, _)| *t)
    }
}

impl<I, O, S: HasRobotPosition> Outcome<I, O, S> {
    /// Robot positions in time order.
    pub fn trajectory(&self) -> Vec<Point> {
        self.snapshots
            .iter()
            .map(|(_, step)| step.state().robot_position())
            .collect()
    }
}

pub trait HasRobotPosition {
    fn robot_position(&self) -> Point;
}

impl HasRobotPosition for navigation::State {
    fn robot_position(&self) -> Point {
        navigation::State::robot_position(self)
    }
}

impl HasRobotPosition for point_navigation::State {
    fn robot_position(&self) -> Point {
        point_navigation::State::robot_position(self)
    }
}
