//! Disk-shaped robot with a heading, ray-cast distance sensors and optional target sensing.
//!
//! The action is `[velocity, turn]`: the robot first turns by `turn` radians, then moves forward
//! by `velocity` along its new heading. Moves that would take it through a wall, or closer than
//! its radius to a wall it is approaching, are rejected as a whole while the turn still applies.
//!
//! The observation starts with `[bearing, distance]` to the target when target sensing is on,
//! followed by one distance reading per sensor. With input rescaling every channel is mapped
//! from its natural range, see [`Environment::observation_ranges`], onto `[-1, 1]`.

use std::{f64::consts::PI, sync::Arc};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    environment::{check_action, check_non_negative, check_range, check_within},
    Angle, Arena, CollisionPolicy, ConfigurationError, DoubleRange, Environment,
    EnvironmentError, Point, Prepared,
};

/// All angles are in radians, all distances and positions in arena units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub initial_robot_x_range: DoubleRange,
    pub initial_robot_y_range: DoubleRange,
    pub initial_robot_direction_range: DoubleRange,
    pub target_x_range: DoubleRange,
    pub target_y_range: DoubleRange,
    pub robot_radius: f64,
    pub robot_max_v: f64,
    /// Largest heading change per step.
    pub robot_max_turn: f64,
    /// Sensor directions, as offsets from the robot heading.
    pub sensor_angles: Vec<f64>,
    pub sensor_range: f64,
    pub sense_target: bool,
    pub arena: Arena,
    pub rescale_input: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            initial_robot_x_range: DoubleRange::from_bounds(0.45, 0.55),
            initial_robot_y_range: DoubleRange::from_bounds(0.8, 0.85),
            initial_robot_direction_range: DoubleRange::point(0.0),
            target_x_range: DoubleRange::point(0.5),
            target_y_range: DoubleRange::point(0.15),
            robot_radius: 0.05,
            robot_max_v: 0.01,
            robot_max_turn: PI / 8.0,
            sensor_angles: Self::evenly_spaced_sensors(DoubleRange::from_bounds(-1.57, 1.57), 5),
            sensor_range: 1.0,
            sense_target: true,
            arena: Prepared::Empty.arena().clone(),
            rescale_input: true,
        }
    }
}

impl Configuration {
    /// `n` sensor angles spread evenly over `range`, both ends included.
    pub fn evenly_spaced_sensors(range: DoubleRange, n: usize) -> Vec<f64> {
        range.points(n)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_range("initial robot x range", self.initial_robot_x_range)?;
        check_range("initial robot y range", self.initial_robot_y_range)?;
        check_range(
            "initial robot direction range",
            self.initial_robot_direction_range,
        )?;
        check_range("target x range", self.target_x_range)?;
        check_range("target y range", self.target_y_range)?;
        let (x_extent, y_extent) = (self.arena.x_extent(), self.arena.y_extent());
        check_within("initial robot x range", self.initial_robot_x_range, x_extent)?;
        check_within("initial robot y range", self.initial_robot_y_range, y_extent)?;
        check_within("target x range", self.target_x_range, x_extent)?;
        check_within("target y range", self.target_y_range, y_extent)?;
        check_non_negative("robot radius", self.robot_radius)?;
        check_non_negative("robot max v", self.robot_max_v)?;
        check_non_negative("robot max turn", self.robot_max_turn)?;
        if let Some(angle) = self.sensor_angles.iter().find(|a| !a.is_finite()) {
            return Err(ConfigurationError::SensorAngle(*angle));
        }
        let positive_range = self.sensor_range.is_finite() && self.sensor_range > 0.0;
        if !self.sensor_angles.is_empty() && !positive_range {
            return Err(ConfigurationError::SensorRange(self.sensor_range));
        }
        if self.sensor_angles.is_empty() && !self.sense_target {
            return Err(ConfigurationError::NoObservations);
        }
        Ok(())
    }

    fn n_of_observations(&self) -> usize {
        self.sensor_angles.len() + if self.sense_target { 2 } else { 0 }
    }
}

/// Snapshot of the environment after a step. The configuration is shared, never copied.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    configuration: Arc<Configuration>,
    robot_position: Point,
    target_position: Point,
    robot_direction: Angle,
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

    pub fn robot_direction(&self) -> Angle {
        self.robot_direction
    }

    /// Number of steps whose move was rejected.
    pub fn n_of_collisions(&self) -> usize {
        self.n_of_collisions
    }
}

pub struct NavigationEnvironment<R: Rng = ChaCha8Rng> {
    configuration: Arc<Configuration>,
    rng: R,
    state: State,
}

impl<R: Rng> NavigationEnvironment<R> {
    pub fn new(configuration: Configuration, rng: R) -> Result<Self, ConfigurationError> {
        Self::with_shared_configuration(Arc::new(configuration), rng)
    }

    /// Builds an environment on a configuration shared with other environments. The random
    /// source is private to this environment.
    pub fn with_shared_configuration(
        configuration: Arc<Configuration>,
        mut rng: R,
    ) -> Result<Self, ConfigurationError> {
        configuration.validate()?;
        let state = initial_state(&configuration, &mut rng);
        debug!(
            sensors = configuration.sensor_angles.len(),
            sense_target = configuration.sense_target,
            rescale_input = configuration.rescale_input,
            "navigation environment created"
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

    /// Raw distance reading of a single sensor, in arena units.
    pub fn sensor_reading(&self, index: usize) -> Result<f64, EnvironmentError> {
        let angle = self.configuration.sensor_angles.get(index).ok_or(
            EnvironmentError::SensorIndexOutOfBounds {
                index,
                count: self.configuration.sensor_angles.len(),
            },
        )?;
        Ok(self.ray_cast(*angle))
    }

    fn ray_cast(&self, sensor_angle: f64) -> f64 {
        self.configuration.arena.ray_cast(
            self.state.robot_position,
            self.state.robot_direction + Angle::new(sensor_angle),
            self.configuration.sensor_range,
        )
    }

    fn raw_observation(&self) -> Vec<f64> {
        let mut observation = Vec::with_capacity(self.configuration.n_of_observations());
        if self.configuration.sense_target {
            let offset = self.state.target_position - self.state.robot_position;
            let bearing = (offset.direction() - self.state.robot_direction).normalized();
            observation.push(bearing.radians());
            observation.push(offset.magnitude());
        }
        observation.extend(
            self.configuration
                .sensor_angles
                .iter()
                .map(|a| self.ray_cast(*a)),
        );
        observation
    }
}

fn initial_state<R: Rng>(configuration: &Arc<Configuration>, rng: &mut R) -> State {
    let robot_position = Point::new(
        configuration.initial_robot_x_range.sample(rng),
        configuration.initial_robot_y_range.sample(rng),
    );
    let robot_direction = Angle::new(configuration.initial_robot_direction_range.sample(rng));
    let target_position = Point::new(
        configuration.target_x_range.sample(rng),
        configuration.target_y_range.sample(rng),
    );
    debug!(
        robot = ?robot_position,
        direction = robot_direction.radians(),
        target = ?target_position,
        "initial state sampled"
    );
    State {
        configuration: Arc::clone(configuration),
        robot_position,
        target_position,
        robot_direction,
        n_of_collisions: 0,
    }
}

impl<R: Rng> Environment for NavigationEnvironment<R> {
    type State = State;

    fn n_of_inputs(&self) -> usize {
        2
    }

    fn n_of_outputs(&self) -> usize {
        self.configuration.n_of_observations()
    }

    fn reset(&mut self) {
        self.state = initial_state(&self.configuration, &mut self.rng);
    }

    fn state(&self) -> &State {
        &self.state
    }

    fn observe(&self) -> Vec<f64> {
        let observation = self.raw_observation();
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
        let velocity = action[0].clamp(0.0, self.configuration.robot_max_v);
        let max_turn = self.configuration.robot_max_turn;
        let turn = action[1].clamp(-max_turn, max_turn);

        let from = self.state.robot_position;
        let robot_direction = self.state.robot_direction + Angle::new(turn);
        let candidate = from + Point::from_angle(robot_direction).scale(velocity);
        let movement = CollisionPolicy::Reject {
            clearance: self.configuration.robot_radius,
        }
        .resolve(&self.configuration.arena, from, candidate);
        if movement.is_collision() {
            debug!(t, from = ?from, to = ?candidate, "move rejected");
        }

        self.state = State {
            configuration: Arc::clone(&self.configuration),
            robot_position: movement.position(from),
            target_position: self.state.target_position,
            robot_direction,
            n_of_collisions: self.state.n_of_collisions + usize::from(movement.is_collision()),
        };
        trace!(
            t,
            position = ?self.state.robot_position,
            direction = robot_direction.radians(),
            "navigation step"
        );
        Ok(self.observe())
    }

    fn observation_ranges(&self) -> Vec<DoubleRange> {
        let mut ranges = Vec::with_capacity(self.configuration.n_of_observations());
        if self.configuration.sense_target {
            ranges.push(DoubleRange::ANGLE);
            ranges.push(DoubleRange::up_to(self.configuration.arena.diagonal()));
        }
        ranges.resize(
            ranges.len() + self.configuration.sensor_angles.len(),
            DoubleRange::up_to(self.configuration.sensor_range),
        );
        ranges
    }

    fn rescales_input(&self) -> bool {
        self.configuration.rescale_input
    }

    fn distance_to_target(&self) -> f64 {
        self.state.robot_position.distance(self.state.target_position)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::RangeError;
    use crate::tests::{navigation_configuration, rng};

    fn environment(configuration: Configuration) -> NavigationEnvironment {
        NavigationEnvironment::new(configuration, rng(0)).unwrap()
    }

    #[test]
    fn test_default_configuration() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        let expected = [-1.57, -0.785, 0.0, 0.785, 1.57];
        assert_eq!(configuration.sensor_angles.len(), expected.len());
        for (actual, expected) in configuration.sensor_angles.iter().zip(expected) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-12);
        }

        let environment = environment(configuration);
        assert_eq!(environment.n_of_inputs(), 2);
        assert_eq!(environment.n_of_outputs(), 7);
        assert!(environment.rescales_input());
    }

    #[test]
    fn test_initial_state_within_ranges() {
        let configuration = Configuration::default();
        let mut environment = NavigationEnvironment::new(configuration.clone(), rng(3)).unwrap();
        for _ in 0..100 {
            let state = environment.state();
            assert!(configuration
                .initial_robot_x_range
                .contains(state.robot_position().x()));
            assert!(configuration
                .initial_robot_y_range
                .contains(state.robot_position().y()));
            assert_point_eq!(state.target_position(), Point::new(0.5, 0.15));
            assert_abs_diff_eq!(state.robot_direction().radians(), 0.0);
            environment.reset();
        }
    }

    #[rstest]
    #[case::inverted_range(
        Configuration {
            target_y_range: DoubleRange::from_bounds(0.9, 0.1),
            ..Default::default()
        },
        ConfigurationError::Range {
            name: "target y range",
            source: RangeError::Inverted { min: 0.9, max: 0.1 },
        }
    )]
    #[case::negative_radius(
        Configuration { robot_radius: -0.1, ..Default::default() },
        ConfigurationError::Negative { name: "robot radius", value: -0.1 }
    )]
    #[case::zero_sensor_range(
        Configuration { sensor_range: 0.0, ..Default::default() },
        ConfigurationError::SensorRange(0.0)
    )]
    #[case::no_observations(
        Configuration { sensor_angles: vec![], sense_target: false, ..Default::default() },
        ConfigurationError::NoObservations
    )]
    #[case::target_outside_arena(
        Configuration { target_y_range: DoubleRange::from_bounds(0.5, 1.5), ..Default::default() },
        ConfigurationError::OutOfArena {
            name: "target y range",
            range: DoubleRange::from_bounds(0.5, 1.5),
            extent: 1.0,
        }
    )]
    #[case::robot_below_arena(
        Configuration {
            initial_robot_x_range: DoubleRange::from_bounds(-0.2, 0.2),
            ..Default::default()
        },
        ConfigurationError::OutOfArena {
            name: "initial robot x range",
            range: DoubleRange::from_bounds(-0.2, 0.2),
            extent: 1.0,
        }
    )]
    fn test_configuration_errors(
        #[case] configuration: Configuration,
        #[case] error: ConfigurationError,
    ) {
        assert_eq!(configuration.validate(), Err(error.clone()));
        assert_eq!(
            NavigationEnvironment::new(configuration, rng(0)).err(),
            Some(error)
        );
    }

    #[test]
    fn test_configuration_without_sensors() {
        let configuration = Configuration {
            sensor_angles: vec![],
            sensor_range: 0.0,
            ..Default::default()
        };
        let environment = environment(configuration);
        assert_eq!(environment.n_of_outputs(), 2);
        assert_eq!(environment.observe().len(), 2);
    }

    #[test]
    fn test_configuration_from_json() {
        let configuration: Configuration = serde_json::from_str(
            r#"{"robot_max_v": 0.02, "sensor_angles": [0.0], "arena": [
                [{"x": 0.0, "y": 0.0}, {"x": 2.0, "y": 0.0}],
                [{"x": 2.0, "y": 0.0}, {"x": 2.0, "y": 1.0}],
                [{"x": 2.0, "y": 1.0}, {"x": 0.0, "y": 1.0}],
                [{"x": 0.0, "y": 1.0}, {"x": 0.0, "y": 0.0}]
            ]}"#,
        )
        .unwrap();
        assert_abs_diff_eq!(configuration.robot_max_v, 0.02);
        assert_abs_diff_eq!(configuration.robot_radius, 0.05);
        assert_abs_diff_eq!(configuration.arena.x_extent(), 2.0);
        assert!(
            serde_json::from_str::<Configuration>(r#"{"target_x_range": [1.0, 0.0]}"#).is_err()
        );
    }

    #[test]
    fn test_determinism() {
        let configuration = Configuration {
            initial_robot_direction_range: DoubleRange::from_bounds(-PI, PI),
            target_x_range: DoubleRange::from_bounds(0.1, 0.9),
            ..Default::default()
        };
        let mut a = NavigationEnvironment::new(configuration.clone(), rng(42)).unwrap();
        let mut b = NavigationEnvironment::new(configuration, rng(42)).unwrap();
        assert_eq!(a.state(), b.state());
        for i in 0..50 {
            let action = [0.01, (i as f64 * 0.3).sin() * 0.2];
            assert_eq!(
                a.step(i as f64, &action).unwrap(),
                b.step(i as f64, &action).unwrap()
            );
            assert_eq!(a.state(), b.state());
        }
    }

    #[test]
    fn test_stepping_does_not_consume_randomness() {
        let configuration = Configuration {
            target_x_range: DoubleRange::from_bounds(0.1, 0.9),
            ..Default::default()
        };
        let mut stepped = NavigationEnvironment::new(configuration.clone(), rng(5)).unwrap();
        let mut idle = NavigationEnvironment::new(configuration, rng(5)).unwrap();
        for i in 0..10 {
            stepped.step(i as f64, &[0.01, 0.1]).unwrap();
        }
        stepped.reset();
        idle.reset();
        assert_eq!(stepped.state(), idle.state());
    }

    #[test]
    fn test_moves_towards_target() {
        let mut environment = environment(navigation_configuration(
            Point::new(0.5, 0.2),
            FRAC_PI_2,
            Point::new(0.5, 0.8),
            Prepared::Empty,
        ));
        let mut previous = environment.state().robot_position();
        for i in 0..60 {
            environment.step(i as f64, &[0.01, 0.0]).unwrap();
            let position = environment.state().robot_position();
            assert!(position.y() > previous.y());
            assert!((0.0..=1.0).contains(&position.x()));
            assert!((0.0..=1.0).contains(&position.y()));
            previous = position;
        }
        assert_point_eq!(environment.state().robot_position(), Point::new(0.5, 0.8));
        assert_abs_diff_eq!(environment.distance_to_target(), 0.0, epsilon = 1e-9);
        assert_eq!(environment.state().n_of_collisions(), 0);
    }

    #[test]
    fn test_stays_inside_arena() {
        let mut environment = environment(navigation_configuration(
            Point::new(0.5, 0.2),
            0.0,
            Point::new(0.5, 0.8),
            Prepared::Empty,
        ));
        for i in 0..60 {
            environment.step(i as f64, &[0.01, 0.0]).unwrap();
            let position = environment.state().robot_position();
            assert!(position.x() <= 1.0 - 0.05 + 1e-9);
            assert!(environment
                .state()
                .configuration()
                .arena
                .contains(position));
        }
        assert!(environment.state().n_of_collisions() > 0);
    }

    #[test]
    fn test_starts_on_boundary() {
        let mut environment = environment(navigation_configuration(
            Point::new(0.5, 0.0),
            FRAC_PI_2,
            Point::new(0.5, 0.9),
            Prepared::Empty,
        ));
        for i in 0..10 {
            environment.step(i as f64, &[0.01, 0.0]).unwrap();
        }
        assert_point_eq!(environment.state().robot_position(), Point::new(0.5, 0.1));
        assert_eq!(environment.state().n_of_collisions(), 0);
    }

    #[test]
    fn test_rejected_move_keeps_position() {
        let mut configuration = navigation_configuration(
            Point::new(0.5, 0.56),
            -FRAC_PI_2,
            Point::new(0.5, 0.15),
            Prepared::ABarrier,
        );
        configuration.robot_radius = 0.0;
        configuration.robot_max_v = 0.1;
        let mut environment = environment(configuration);

        environment.step(0.0, &[0.1, 0.1]).unwrap();

        let state = environment.state();
        assert_point_eq!(state.robot_position(), Point::new(0.5, 0.56));
        assert_abs_diff_eq!(state.robot_direction().radians(), -FRAC_PI_2 + 0.1, epsilon = 1e-12);
        assert_eq!(state.n_of_collisions(), 1);
    }

    #[test]
    fn test_action_is_clamped() {
        let mut environment = environment(navigation_configuration(
            Point::new(0.5, 0.5),
            0.0,
            Point::new(0.5, 0.15),
            Prepared::Empty,
        ));
        environment.step(0.0, &[1.0, 10.0]).unwrap();
        let state = environment.state();
        assert_abs_diff_eq!(state.robot_direction().radians(), PI / 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            state.robot_position().distance(Point::new(0.5, 0.5)),
            0.01,
            epsilon = 1e-12
        );

        let before = state.robot_position();
        environment.step(1.0, &[-1.0, 0.0]).unwrap();
        assert_point_eq!(environment.state().robot_position(), before);
    }

    #[rstest]
    #[case::too_short(vec![0.01])]
    #[case::too_long(vec![0.01, 0.0, 0.0])]
    #[case::not_a_number(vec![f64::NAN, 0.0])]
    fn test_invalid_action(#[case] action: Vec<f64>) {
        let mut environment = environment(Configuration::default());
        let before = environment.state().clone();
        assert!(environment.step(0.0, &action).is_err());
        assert_eq!(environment.state(), &before);
    }

    #[test]
    fn test_raw_observation() {
        let environment = environment(navigation_configuration(
            Point::new(0.5, 0.5),
            0.0,
            Point::new(0.5, 0.15),
            Prepared::Empty,
        ));
        let observation = environment.observe();
        let expected = [-FRAC_PI_2, 0.35, 0.5, 0.5, 0.5];
        assert_eq!(observation.len(), expected.len());
        for (actual, expected) in observation.iter().zip(expected) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rescaled_observation() {
        let mut configuration = navigation_configuration(
            Point::new(0.5, 0.5),
            0.0,
            Point::new(0.5, 0.15),
            Prepared::Empty,
        );
        configuration.rescale_input = true;
        let environment = environment(configuration);
        let observation = environment.observe();
        let expected = [-0.5, 0.35 / 2f64.sqrt() * 2.0 - 1.0, 0.0, 0.0, 0.0];
        for (actual, expected) in observation.iter().zip(expected) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-12);
        }
        assert!(observation
            .iter()
            .all(|v| DoubleRange::SYMMETRIC_UNIT.contains(*v)));
    }

    #[test]
    fn test_sensors_saturate() {
        let mut configuration = navigation_configuration(
            Point::new(0.5, 0.5),
            0.0,
            Point::new(0.5, 0.15),
            Prepared::Empty,
        );
        configuration.sensor_range = 0.3;
        configuration.sense_target = false;
        let environment = environment(configuration);
        assert_eq!(environment.observe(), vec![0.3, 0.3, 0.3]);
        assert_abs_diff_eq!(environment.sensor_reading(1).unwrap(), 0.3);
    }

    #[test]
    fn test_sensor_sees_barrier() {
        let environment = environment(navigation_configuration(
            Point::new(0.5, 0.8),
            -FRAC_PI_2,
            Point::new(0.5, 0.15),
            Prepared::ABarrier,
        ));
        assert_abs_diff_eq!(environment.sensor_reading(1).unwrap(), 0.3, epsilon = 1e-12);
        assert_eq!(
            environment.sensor_reading(3),
            Err(EnvironmentError::SensorIndexOutOfBounds { index: 3, count: 3 })
        );
    }

    #[test]
    fn test_observation_ranges() {
        let environment = environment(Configuration::default());
        let ranges = environment.observation_ranges();
        assert_eq!(ranges.len(), environment.n_of_outputs());
        assert_eq!(ranges[0], DoubleRange::ANGLE);
        assert_abs_diff_eq!(ranges[1].max(), 2f64.sqrt(), epsilon = 1e-12);
        assert_eq!(ranges[2], DoubleRange::up_to(1.0));
    }

    #[test]
    fn test_states_share_configuration() {
        let configuration = Arc::new(Configuration::default());
        let mut a =
            NavigationEnvironment::with_shared_configuration(Arc::clone(&configuration), rng(1))
                .unwrap();
        let b = NavigationEnvironment::with_shared_configuration(Arc::clone(&configuration), rng(2))
            .unwrap();
        a.step(0.0, &[0.01, 0.0]).unwrap();
        assert!(std::ptr::eq(a.state().configuration(), b.state().configuration()));
        assert!(Arc::ptr_eq(a.configuration(), &configuration));
    }
}
