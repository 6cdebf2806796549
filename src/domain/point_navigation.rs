//! Point-mass robot without heading or sensors.
//!
//! The action is a displacement `[dx, dy]`, shortened to at most `robot_max_v`. A move that runs
//! into a wall stops where the robot would come closer than `collision_block` to any wall. The observation is
//! `[robot x, robot y, target x, target y]`.

use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    environment::{check_action, check_non_negative, check_range, check_within},
    Arena, CollisionPolicy, ConfigurationError, DoubleRange, Environment, EnvironmentError, Point,
    Prepared,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub initial_robot_x_range: DoubleRange,
    pub initial_robot_y_range: DoubleRange,
    pub target_x_range: DoubleRange,
    pub target_y_range: DoubleRange,
    /// Largest displacement per step.
    pub robot_max_v: f64,
    /// Distance kept from every wall the robot runs towards.
    pub collision_block: f64,
    pub arena: Arena,
    pub rescale_input: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            initial_robot_x_range: DoubleRange::from_bounds(0.45, 0.55),
            initial_robot_y_range: DoubleRange::from_bounds(0.8, 0.85),
            target_x_range: DoubleRange::point(0.5),
            target_y_range: DoubleRange::point(0.15),
            robot_max_v: 0.01,
            collision_block: 0.005,
            arena: Prepared::Empty.arena().clone(),
            rescale_input: true,
        }
    }
}

impl Configuration {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_range("initial robot x range", self.initial_robot_x_range)?;
        check_range("initial robot y range", self.initial_robot_y_range)?;
        check_range("target x range", self.target_x_range)?;
        check_range("target y range", self.target_y_range)?;
        let (x_extent, y_extent) = (self.arena.x_extent(), self.arena.y_extent());
        check_within("initial robot x range", self.initial_robot_x_range, x_extent)?;
        check_within("initial robot y range", self.initial_robot_y_range, y_extent)?;
        check_within("target x range", self.target_x_range, x_extent)?;
        check_within("target y range", self.target_y_range, y_extent)?;
        check_non_negative("robot max v", self.robot_max_v)?;
        check_non_negative("collision block", self.collision_block)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    configuration: Arc<Configuration>,
    robot_position: Point,
    target_position: Point,
    n_of_collisions: usize,
}

impl State {
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn robot_position(&self) -> Point {
        self.robot_position
    }

    pub fn target_position(&self) -> Point {
        self.target_position
    }

    /// Number of steps stopped short by a wall.
    pub fn n_of_collisions(&self) -> usize {
        self.n_of_collisions
    }
}

pub struct PointNavigationEnvironment<R: Rng = ChaCha8Rng> {
    configuration: Arc<Configuration>,
    rng: R,
    state: State,
}

impl<R: Rng> PointNavigationEnvironment<R> {
    pub fn new(configuration: Configuration, rng: R) -> Result<Self, ConfigurationError> {
        Self::with_shared_configuration(Arc::new(configuration), rng)
    }

    pub fn with_shared_configuration(
        configuration: Arc<Configuration>,
        mut rng: R,
    ) -> Result<Self, ConfigurationError> {
        configuration.validate()?;
        let state = initial_state(&configuration, &mut rng);
        debug!(
            collision_block = configuration.collision_block,
            rescale_input = configuration.rescale_input,
            "point navigation environment created"
        );
        Ok(Self {
            configuration,
            rng,
            state,
        })
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }
}

fn initial_state<R: Rng>(configuration: &Arc<Configuration>, rng: &mut R) -> State {
    let robot_position = Point::new(
        configuration.initial_robot_x_range.sample(rng),
        configuration.initial_robot_y_range.sample(rng),
    );
    let target_position = Point::new(
        configuration.target_x_range.sample(rng),
        configuration.target_y_range.sample(rng),
    );
    debug!(robot = ?robot_position, target = ?target_position, "initial state sampled");
    State {
        configuration: Arc::clone(configuration),
        robot_position,
        target_position,
        n_of_collisions: 0,
    }
}

/// Shortens `displacement` to at most `max_v`, keeping its direction.
fn limit(displacement: Point, max_v: f64) -> Point {
    let magnitude = displacement.magnitude();
    if magnitude > max_v {
        displacement.scale(max_v / magnitude)
    } else {
        displacement
    }
}

impl<R: Rng> Environment for PointNavigationEnvironment<R> {
    type State = State;

    fn n_of_inputs(&self) -> usize {
        2
    }

    fn n_of_outputs(&self) -> usize {
        4
    }

    fn reset(&mut self) {
        self.state = initial_state(&self.configuration, &mut self.rng);
    }

    fn state(&self) -> &State {
        &self.state
    }

    fn observe(&self) -> Vec<f64> {
        let robot = self.state.robot_position;
        let target = self.state.target_position;
        let observation = vec![robot.x(), robot.y(), target.x(), target.y()];
        if !self.configuration.rescale_input {
            return observation;
        }
        observation
            .into_iter()
            .zip(self.observation_ranges())
            .map(|(value, range)| range.rescale_to_symmetric_unit(value))
            .collect()
    }

    fn step(&mut self, t: f64, action: &[f64]) -> Result<Vec<f64>, EnvironmentError> {
        check_action(action, 2)?;
        let from = self.state.robot_position;
        let displacement = limit(Point::new(action[0], action[1]), self.configuration.robot_max_v);
        let candidate = from + displacement;
        let movement = CollisionPolicy::Block {
            distance: self.configuration.collision_block,
        }
        .resolve(&self.configuration.arena, from, candidate);
        if movement.is_collision() {
            debug!(t, from = ?from, to = ?candidate, "move blocked");
        }

        self.state = State {
            configuration: Arc::clone(&self.configuration),
            robot_position: movement.position(from),
            target_position: self.state.target_position,
            n_of_collisions: self.state.n_of_collisions + usize::from(movement.is_collision()),
        };
        trace!(t, position = ?self.state.robot_position, "point navigation step");
        Ok(self.observe())
    }

    fn observation_ranges(&self) -> Vec<DoubleRange> {
        let x = DoubleRange::up_to(self.configuration.arena.x_extent());
        let y = DoubleRange::up_to(self.configuration.arena.y_extent());
        vec![x, y, x, y]
    }

    fn rescales_input(&self) -> bool {
        self.configuration.rescale_input
    }

    fn distance_to_target(&self) -> f64 {
        self.state.robot_position.distance(self.state.target_position)
    }
}
